//! CLI Tooling
//!
//! Command-line interface for all synchronization operations. The context
//! owns the merged configuration; each subcommand maps to one method and
//! returns its output as text.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use tracing::info;

use crate::client::{AgentServiceClient, HttpAgentClient};
use crate::config::{ConfigLoader, SyncConfig};
use crate::error::SyncError;
use crate::formats::FileFormat;
use crate::naming::effective_agent_name;
use crate::sync::{
    download_agent, download_agents, get_agent_by_name, upload_agent_from_dir,
    upload_agents_from_dir, DownloadOptions, UploadOptions,
};

/// Agent Sync CLI - dependency-aware agent definition synchronization
#[derive(Parser)]
#[command(name = "agent-sync")]
#[command(about = "Synchronize agent definitions between files and a remote agent service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Remote service endpoint (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Prefix applied to remote agent names
    #[arg(long)]
    pub prefix: Option<String>,

    /// Suffix applied to remote agent names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Default model for definitions that name none
    #[arg(long)]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload agent definitions in dependency order
    Upload {
        /// Upload a single agent (plus its dependencies) by name
        #[arg(long)]
        agent: Option<String>,

        /// Directory containing definition files
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Definition file format (json, yaml, md)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Download remote agents into portable definition files
    Download {
        /// Download a single agent by base name
        #[arg(long)]
        agent: Option<String>,

        /// Directory to write definition files into
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Definition file format (json, yaml, md)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// List remote agents
    List,
    /// Print the remote id for an agent base name
    GetId {
        /// Agent base name (prefix/suffix applied for the lookup)
        name: String,
    },
    /// Delete a remote agent by base name
    Delete {
        name: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Delete every remote agent matching the configured prefix/suffix
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// CLI execution context holding the merged configuration.
pub struct CliContext {
    config: SyncConfig,
}

impl CliContext {
    pub fn new(config_file: Option<PathBuf>) -> Result<Self, SyncError> {
        let config = match config_file {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fold CLI flags over the merged configuration.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.config.endpoint = Some(endpoint.clone());
        }
        if let Some(prefix) = &cli.prefix {
            self.config.prefix = prefix.clone();
        }
        if let Some(suffix) = &cli.suffix {
            self.config.suffix = suffix.clone();
        }
        if let Some(model) = &cli.model {
            self.config.model = Some(model.clone());
        }
        if let Some(level) = &cli.log_level {
            self.config.logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            self.config.logging.format = format.clone();
        }
    }

    /// Execute a command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Upload { agent, dir, format } => {
                self.upload(agent.as_deref(), dir, format)
            }
            Commands::Download { agent, dir, format } => {
                self.download(agent.as_deref(), dir, format)
            }
            Commands::List => self.list(),
            Commands::GetId { name } => self.get_id(name),
            Commands::Delete { name, force } => self.delete(name, *force),
            Commands::DeleteAll { force } => self.delete_all(*force),
        }
    }

    fn client(&self) -> Result<HttpAgentClient, SyncError> {
        let endpoint = self.config.require_endpoint()?;
        HttpAgentClient::new(endpoint, self.config.api_key.clone())
    }

    fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            prefix: self.config.prefix.clone(),
            suffix: self.config.suffix.clone(),
            default_model: self.config.model.clone(),
            retry: self.config.retry.policy(),
        }
    }

    fn download_options(&self, format: FileFormat) -> DownloadOptions {
        DownloadOptions {
            prefix: self.config.prefix.clone(),
            suffix: self.config.suffix.clone(),
            format,
        }
    }

    fn upload(
        &self,
        agent: Option<&str>,
        dir: &PathBuf,
        format: &str,
    ) -> Result<String, SyncError> {
        let format: FileFormat = format.parse()?;
        let client = self.client()?;
        let options = self.upload_options();
        let processed = match agent {
            Some(name) => upload_agent_from_dir(name, dir, format, &client, &options)?,
            None => upload_agents_from_dir(dir, format, &client, &options)?,
        };
        Ok(format!("Processed {} agents successfully", processed.len()))
    }

    fn download(
        &self,
        agent: Option<&str>,
        dir: &PathBuf,
        format: &str,
    ) -> Result<String, SyncError> {
        let format: FileFormat = format.parse()?;
        let client = self.client()?;
        let options = self.download_options(format);
        match agent {
            Some(name) => {
                let path = download_agent(name, &client, dir, &options)?;
                Ok(format!("Saved agent '{}' to {}", name, path.display()))
            }
            None => {
                let saved = download_agents(&client, dir, &options)?;
                Ok(format!("Saved {} agents to {}", saved, dir.display()))
            }
        }
    }

    fn list(&self) -> Result<String, SyncError> {
        let client = self.client()?;
        let mut agents = client.list_agents()?;
        agents.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = String::new();
        out.push_str(&format!("{}\n\n", "Remote Agents".bold().underline()));
        if agents.is_empty() {
            out.push_str("No agents found.\n");
            return Ok(out);
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Name", "ID"]);
        for agent in &agents {
            table.add_row(vec![agent.name.clone(), agent.id.clone()]);
        }
        out.push_str(&format!("{}\n", table));
        Ok(out)
    }

    fn get_id(&self, name: &str) -> Result<String, SyncError> {
        let client = self.client()?;
        let full_name = effective_agent_name(name, &self.config.prefix, &self.config.suffix);
        let agent = get_agent_by_name(&full_name, &client)?
            .ok_or_else(|| SyncError::NotFound(full_name))?;
        Ok(agent.id)
    }

    fn delete(&self, name: &str, force: bool) -> Result<String, SyncError> {
        let client = self.client()?;
        let full_name = effective_agent_name(name, &self.config.prefix, &self.config.suffix);
        let agent = get_agent_by_name(&full_name, &client)?
            .ok_or_else(|| SyncError::NotFound(full_name.clone()))?;

        if !force && !confirm_deletion(&[full_name.clone()])? {
            return Ok("Deletion cancelled".to_string());
        }
        client.delete_agent(&agent.id)?;
        info!("Deleted agent '{}' ({})", full_name, agent.id);
        Ok(format!("Deleted agent '{}'", full_name))
    }

    fn delete_all(&self, force: bool) -> Result<String, SyncError> {
        let client = self.client()?;
        let agents: Vec<_> = client
            .list_agents()?
            .into_iter()
            .filter(|agent| {
                agent.name.starts_with(&self.config.prefix)
                    && agent.name.ends_with(&self.config.suffix)
            })
            .collect();
        if agents.is_empty() {
            return Ok("No agents matched the prefix/suffix filter".to_string());
        }

        let names: Vec<String> = agents.iter().map(|a| a.name.clone()).collect();
        if !force && !confirm_deletion(&names)? {
            return Ok("Deletion cancelled".to_string());
        }

        for agent in &agents {
            client.delete_agent(&agent.id)?;
            info!("Deleted agent '{}' ({})", agent.name, agent.id);
        }
        Ok(format!("Deleted {} agents", agents.len()))
    }
}

fn confirm_deletion(names: &[String]) -> Result<bool, SyncError> {
    let prompt = if names.len() == 1 {
        format!("Delete agent '{}'?", names[0])
    } else {
        format!("Delete {} agents ({})?", names.len(), names.join(", "))
    };
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| SyncError::ConfigError(format!("Failed to read confirmation: {}", e)))
}
