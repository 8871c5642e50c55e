pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::creators::CreatorsConfig;
pub use crate::core::{runner::CreatorRunner, scheduler::Scheduler, ytdlp::YtDlp};
pub use utils::error::{Result, SyncError};
