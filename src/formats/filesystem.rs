//! Directory scanning for agent definition files.

use std::path::Path;

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::SyncError;
use crate::formats::{transformer_for, FileFormat};
use crate::types::AgentDefinition;

/// Load every definition file of `format` directly under `dir`.
///
/// Files are visited in name order so batch runs are reproducible. A file
/// that fails to parse is logged and skipped rather than aborting the scan;
/// a later definition with a duplicate name replaces the earlier one.
pub fn read_agent_files(dir: &Path, format: FileFormat) -> Result<Vec<AgentDefinition>, SyncError> {
    if !dir.is_dir() {
        return Err(SyncError::StorageError(format!(
            "Agents directory not found: {}",
            dir.display()
        )));
    }

    let transformer = transformer_for(format);
    let mut definitions: Vec<AgentDefinition> = Vec::new();

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format.matches_extension(ext))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        match transformer.load(path) {
            Ok(definition) => {
                info!("Successfully read agent file: {}", path.display());
                if let Some(existing) = definitions
                    .iter_mut()
                    .find(|d| d.name == definition.name)
                {
                    warn!(
                        "Duplicate agent name '{}' in {}; keeping the later file",
                        definition.name,
                        path.display()
                    );
                    *existing = definition;
                } else {
                    definitions.push(definition);
                }
            }
            Err(e) => {
                error!("{}", e);
            }
        }
    }

    Ok(definitions)
}
