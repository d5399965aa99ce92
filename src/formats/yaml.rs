//! YAML definition files.

use std::path::Path;

use crate::error::SyncError;
use crate::formats::{read_file, write_file, AgentTransformer, FileFormat};
use crate::types::AgentDefinition;

pub struct YamlTransformer;

impl AgentTransformer for YamlTransformer {
    fn format(&self) -> FileFormat {
        FileFormat::Yaml
    }

    fn load(&self, path: &Path) -> Result<AgentDefinition, SyncError> {
        let content = read_file(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            SyncError::SerializationError(format!("Invalid YAML in {}: {}", path.display(), e))
        })
    }

    fn save(&self, definition: &AgentDefinition, path: &Path) -> Result<(), SyncError> {
        let content = serde_yaml::to_string(definition)?;
        write_file(path, &content)
    }
}
