//! Synchronization core: existing-agent cache, ordered upsert engine, and
//! the download/generalization path.

pub mod cache;
pub mod download;
pub mod upload;

pub use cache::ExistingAgentCache;
pub use download::{download_agent, download_agents, get_agent_by_name, get_agent_name, DownloadOptions};
pub use upload::{
    create_or_update_agent, create_or_update_agents, upload_agent_from_dir,
    upload_agents_from_dir, UploadOptions,
};
