use crate::domain::model::{DownloadJob, ProcessIdentity};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn config_dir(&self) -> &Path;
    fn download_dir(&self) -> &Path;
    fn creator_delay(&self) -> Duration;
    fn keep_logs(&self) -> usize;
    fn identity(&self) -> Option<ProcessIdentity>;

    fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.json")
    }

    fn cookies_file(&self) -> PathBuf {
        self.config_dir().join("cookies.txt")
    }

    fn archive_file(&self) -> PathBuf {
        self.config_dir().join("archive.txt")
    }

    fn logs_dir(&self) -> PathBuf {
        self.download_dir().join("logs")
    }

    fn detailed_log_file(&self) -> PathBuf {
        self.download_dir().join("detailed_download.log")
    }
}

/// Runs one download job to completion. An `Err` means the creator failed;
/// the caller decides whether to keep going.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, job: &DownloadJob) -> Result<()>;
}
