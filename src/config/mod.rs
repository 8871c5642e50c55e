pub mod creators;

#[cfg(feature = "cli")]
use crate::domain::model::ProcessIdentity;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "creator-sync")]
#[command(about = "Periodically downloads new posts from a list of creators with yt-dlp")]
pub struct CliConfig {
    /// Directory holding config.json, cookies.txt and archive.txt
    #[arg(long, env = "CONFIG_DIR", default_value = "/config")]
    pub config_dir: PathBuf,

    /// Root of the per-creator download directories and logs
    #[arg(long, env = "DOWNLOAD_DIR", default_value = "/downloads")]
    pub download_dir: PathBuf,

    #[arg(long, env = "CHECK_INTERVAL_HOURS", default_value = "6")]
    pub interval_hours: u64,

    /// Pause between two creators of the same run
    #[arg(long, env = "CREATOR_DELAY_SECS", default_value = "10")]
    pub creator_delay_secs: u64,

    #[arg(long, env = "YTDLP_BIN", default_value = "yt-dlp")]
    pub ytdlp_bin: String,

    /// Run yt-dlp as this uid and chown the data directories to it
    #[arg(long, env = "PUID")]
    pub puid: Option<u32>,

    /// Defaults to PUID when only PUID is given
    #[arg(long, env = "PGID")]
    pub pgid: Option<u32>,

    /// Number of per-run log files to keep
    #[arg(long, env = "KEEP_LOGS", default_value = "20")]
    pub keep_logs: usize,

    /// Run every creator once and exit
    #[arg(long)]
    pub once: bool,

    /// Wait for the first interval instead of running at startup
    #[arg(long)]
    pub skip_initial_run: bool,

    /// Show the yt-dlp invocations that would run without executing them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log memory and disk statistics after each run")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 60 * 60)
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn creator_delay(&self) -> Duration {
        Duration::from_secs(self.creator_delay_secs)
    }

    fn keep_logs(&self) -> usize {
        self.keep_logs
    }

    fn identity(&self) -> Option<ProcessIdentity> {
        self.puid.map(|uid| ProcessIdentity {
            uid,
            gid: self.pgid.unwrap_or(uid),
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config_dir", &self.config_dir)?;
        validation::validate_path("download_dir", &self.download_dir)?;
        validation::validate_range("interval_hours", self.interval_hours, 1, 168)?;
        validation::validate_range("creator_delay_secs", self.creator_delay_secs, 0, 3600)?;
        validation::validate_range("keep_logs", self.keep_logs, 1, 10_000)?;
        validation::validate_non_empty_string("ytdlp_bin", &self.ytdlp_bin)?;
        if self.pgid.is_some() {
            validation::validate_required_field("puid", &self.puid)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::utils::error::SyncError;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["creator-sync"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_derived_paths() {
        let config = parse(&["--config-dir", "/srv/config", "--download-dir", "/srv/media"]);
        assert_eq!(config.config_file(), PathBuf::from("/srv/config/config.json"));
        assert_eq!(config.cookies_file(), PathBuf::from("/srv/config/cookies.txt"));
        assert_eq!(config.archive_file(), PathBuf::from("/srv/config/archive.txt"));
        assert_eq!(config.logs_dir(), PathBuf::from("/srv/media/logs"));
        assert_eq!(
            config.detailed_log_file(),
            PathBuf::from("/srv/media/detailed_download.log")
        );
    }

    #[test]
    fn test_identity_defaults_gid_to_uid() {
        let config = parse(&["--puid", "1000"]);
        assert_eq!(
            config.identity(),
            Some(ProcessIdentity { uid: 1000, gid: 1000 })
        );

        let config = parse(&["--puid", "1000", "--pgid", "100"]);
        assert_eq!(config.identity(), Some(ProcessIdentity { uid: 1000, gid: 100 }));
    }

    #[test]
    fn test_validation() {
        assert!(parse(&[]).validate().is_ok());
        assert!(parse(&["--interval-hours", "0"]).validate().is_err());
        assert!(parse(&["--keep-logs", "0"]).validate().is_err());
        assert!(matches!(
            parse(&["--pgid", "100"]).validate(),
            Err(SyncError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_interval() {
        assert_eq!(
            parse(&["--interval-hours", "3"]).interval(),
            Duration::from_secs(3 * 3600)
        );
    }
}
