pub mod compat;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub mod setup;
pub mod ytdlp;

pub use crate::domain::model::{Creator, CreatorOutcome, CreatorStatus, DownloadJob, RunSummary};
pub use crate::domain::ports::{ConfigProvider, Downloader};
pub use crate::utils::error::Result;
