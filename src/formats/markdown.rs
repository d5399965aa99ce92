//! Markdown definition files: YAML frontmatter plus the instructions body.
//!
//! ```text
//! ---
//! name: planner
//! model: m-1
//! ---
//!
//! You are the planner agent...
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::SyncError;
use crate::formats::{read_file, write_file, AgentTransformer, FileFormat};
use crate::types::AgentDefinition;

pub struct MarkdownTransformer;

impl AgentTransformer for MarkdownTransformer {
    fn format(&self) -> FileFormat {
        FileFormat::Markdown
    }

    fn load(&self, path: &Path) -> Result<AgentDefinition, SyncError> {
        let content = read_file(path)?;
        let (frontmatter, body) = split_frontmatter(&content);

        let mut fields: Map<String, Value> = match frontmatter {
            Some(raw) => serde_yaml::from_str(raw).map_err(|e| {
                SyncError::SerializationError(format!(
                    "Invalid frontmatter in {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => Map::new(),
        };
        fields.insert(
            "instructions".to_string(),
            Value::String(body.to_string()),
        );

        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            SyncError::SerializationError(format!(
                "Invalid agent definition in {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn save(&self, definition: &AgentDefinition, path: &Path) -> Result<(), SyncError> {
        let mut value = serde_json::to_value(definition)?;
        let instructions = value
            .as_object_mut()
            .and_then(|map| map.remove("instructions"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let frontmatter = serde_yaml::to_string(&value)?;
        // Single trailing newline on the body for roundtrip consistency
        let mut body = instructions;
        while body.ends_with('\n') {
            body.pop();
        }
        body.push('\n');

        let content = format!("---\n{}---\n\n{}", frontmatter, body);
        write_file(path, &content)
    }
}

/// Split `---`-fenced YAML frontmatter from the body. Content without a
/// frontmatter fence is treated as pure body.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (None, content);
    };
    match rest.find("\n---") {
        Some(pos) => {
            let frontmatter = &rest[..pos + 1];
            let after = &rest[pos + 4..];
            let body = after
                .strip_prefix('\n')
                .map(|b| b.strip_prefix('\n').unwrap_or(b))
                .unwrap_or(after);
            (Some(frontmatter), body)
        }
        None => (None, content),
    }
}
