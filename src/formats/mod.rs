//! Format transformers: agent definitions to and from JSON, YAML, and
//! Markdown-with-frontmatter files.

pub mod filesystem;
pub mod json;
pub mod markdown;
pub mod yaml;

use std::path::Path;
use std::str::FromStr;

use crate::error::SyncError;
use crate::types::AgentDefinition;

pub use filesystem::read_agent_files;
pub use json::JsonTransformer;
pub use markdown::MarkdownTransformer;
pub use yaml::YamlTransformer;

/// Supported definition file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
}

impl FileFormat {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => ".json",
            FileFormat::Yaml => ".yaml",
            FileFormat::Markdown => ".md",
        }
    }

    /// Extensions accepted when scanning a directory for this format.
    pub fn matches_extension(&self, extension: &str) -> bool {
        match self {
            FileFormat::Json => extension.eq_ignore_ascii_case("json"),
            FileFormat::Yaml => {
                extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml")
            }
            FileFormat::Markdown => extension.eq_ignore_ascii_case("md"),
        }
    }
}

impl FromStr for FileFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(FileFormat::Json),
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "md" | "markdown" => Ok(FileFormat::Markdown),
            other => Err(SyncError::ConfigError(format!(
                "Unknown format '{}' (expected json, yaml, or md)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
            FileFormat::Markdown => "md",
        };
        write!(f, "{}", name)
    }
}

/// One definition-file codec.
pub trait AgentTransformer {
    fn format(&self) -> FileFormat;
    fn load(&self, path: &Path) -> Result<AgentDefinition, SyncError>;
    fn save(&self, definition: &AgentDefinition, path: &Path) -> Result<(), SyncError>;
}

/// Transformer instance for a format.
pub fn transformer_for(format: FileFormat) -> &'static dyn AgentTransformer {
    match format {
        FileFormat::Json => &JsonTransformer,
        FileFormat::Yaml => &YamlTransformer,
        FileFormat::Markdown => &MarkdownTransformer,
    }
}

/// Load a single definition file.
pub fn load_agent_file(path: &Path, format: FileFormat) -> Result<AgentDefinition, SyncError> {
    transformer_for(format).load(path)
}

/// Save a single definition file.
pub fn save_agent_file(
    definition: &AgentDefinition,
    path: &Path,
    format: FileFormat,
) -> Result<(), SyncError> {
    transformer_for(format).save(definition, path)
}

pub(crate) fn read_file(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path)
        .map_err(|e| SyncError::StorageError(format!("Failed to read {}: {}", path.display(), e)))
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<(), SyncError> {
    std::fs::write(path, content)
        .map_err(|e| SyncError::StorageError(format!("Failed to write {}: {}", path.display(), e)))
}
