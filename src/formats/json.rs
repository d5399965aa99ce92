//! JSON definition files.

use std::path::Path;

use crate::error::SyncError;
use crate::formats::{read_file, write_file, AgentTransformer, FileFormat};
use crate::types::AgentDefinition;

pub struct JsonTransformer;

impl AgentTransformer for JsonTransformer {
    fn format(&self) -> FileFormat {
        FileFormat::Json
    }

    fn load(&self, path: &Path) -> Result<AgentDefinition, SyncError> {
        let content = read_file(path)?;
        serde_json::from_str(&content).map_err(|e| {
            SyncError::SerializationError(format!("Invalid JSON in {}: {}", path.display(), e))
        })
    }

    fn save(&self, definition: &AgentDefinition, path: &Path) -> Result<(), SyncError> {
        let mut content = serde_json::to_string_pretty(definition)?;
        content.push('\n');
        write_file(path, &content)
    }
}
