use crate::config::creators::CreatorsConfig;
use crate::core::{setup, ytdlp};
use crate::domain::model::{CreatorOutcome, CreatorStatus, RunSummary};
use crate::domain::ports::{ConfigProvider, Downloader};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::time::Instant;

/// 依序處理每一個創作者；單一創作者失敗只記錄，不中斷整個流程
pub struct CreatorRunner<D: Downloader, C: ConfigProvider> {
    downloader: D,
    config: C,
}

impl<D: Downloader, C: ConfigProvider> CreatorRunner<D, C> {
    pub fn new(downloader: D, config: C) -> Self {
        Self { downloader, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub async fn run(&self, creators: &CreatorsConfig) -> Result<RunSummary> {
        self.run_at(creators, chrono::Local::now().date_naive()).await
    }

    /// Visits every creator exactly once in listed order. Only a failure to
    /// create the archive file aborts the run.
    pub async fn run_at(&self, creators: &CreatorsConfig, today: NaiveDate) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("=== Starting content download process ===");

        let identity = self.config.identity();
        let archive = self.config.archive_file();
        if setup::ensure_archive_file(&archive)? {
            setup::assign_owner(&archive, identity);
        }
        tracing::info!("Found {} creators to process", creators.len());

        let delay = self.config.creator_delay();
        let mut outcomes = Vec::with_capacity(creators.len());

        for (i, creator) in creators.creators.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tracing::info!(
                    "Waiting {} seconds before processing next creator...",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }

            tracing::info!(
                "Processing creator: {} (looking back {} days)",
                creator.name,
                creator.days_back
            );
            if let Some(args) = &creator.ytdlp_args {
                tracing::info!("Using custom arguments for {}: {}", creator.name, args);
            }

            let creator_started = Instant::now();
            let job = ytdlp::build_job(creator, &creators.url_template, &self.config, today);

            // 下載程式以 PUID:PGID 執行，新建的目錄必須交給它
            let result = match std::fs::create_dir_all(&job.output_dir) {
                Ok(()) => {
                    setup::assign_owner(&job.output_dir, identity);
                    self.downloader.download(&job).await
                }
                Err(e) => Err(e.into()),
            };

            let status = match result {
                Ok(()) => {
                    tracing::info!("Successfully completed processing {}", creator.name);
                    CreatorStatus::Completed
                }
                Err(e) => {
                    tracing::error!("❌ Error processing creator {}: {}", creator.name, e);
                    tracing::debug!("💡 {}", e.recovery_suggestion());
                    CreatorStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            outcomes.push(CreatorOutcome {
                name: creator.name.clone(),
                status,
                elapsed: creator_started.elapsed(),
            });
        }

        let summary = RunSummary {
            outcomes,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "=== Download process completed: {} succeeded, {} failed in {:?} ===",
            summary.succeeded(),
            summary.failed(),
            summary.elapsed
        );
        if summary.failed() > 0 {
            tracing::warn!("Failed creators: {}", summary.failed_creators().join(", "));
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DownloadJob, ProcessIdentity};
    use crate::utils::error::SyncError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockDownloader {
        jobs: Arc<Mutex<Vec<DownloadJob>>>,
        failing: Vec<String>,
    }

    impl MockDownloader {
        fn failing_for(names: &[&str]) -> Self {
            Self {
                jobs: Arc::default(),
                failing: names.iter().map(|n| n.to_string()).collect(),
            }
        }

        async fn jobs(&self) -> Vec<DownloadJob> {
            self.jobs.lock().await.clone()
        }
    }

    #[async_trait]
    impl Downloader for MockDownloader {
        async fn download(&self, job: &DownloadJob) -> Result<()> {
            self.jobs.lock().await.push(job.clone());
            if self.failing.contains(&job.creator) {
                return Err(SyncError::DownloadFailed {
                    creator: job.creator.clone(),
                    reason: "yt-dlp exited with code 1".to_string(),
                    exit_code: Some(1),
                });
            }
            Ok(())
        }
    }

    struct TestConfig {
        config_dir: PathBuf,
        download_dir: PathBuf,
        delay: Duration,
        identity: Option<ProcessIdentity>,
    }

    impl ConfigProvider for TestConfig {
        fn config_dir(&self) -> &Path {
            &self.config_dir
        }
        fn download_dir(&self) -> &Path {
            &self.download_dir
        }
        fn creator_delay(&self) -> Duration {
            self.delay
        }
        fn keep_logs(&self) -> usize {
            20
        }
        fn identity(&self) -> Option<ProcessIdentity> {
            self.identity
        }
    }

    fn test_config(temp_dir: &TempDir) -> TestConfig {
        TestConfig {
            config_dir: temp_dir.path().join("config"),
            download_dir: temp_dir.path().join("downloads"),
            delay: Duration::ZERO,
            identity: None,
        }
    }

    fn creators(json: &str) -> CreatorsConfig {
        CreatorsConfig::from_json_str(json).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_visits_every_creator_once_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = MockDownloader::default();
        let runner = CreatorRunner::new(downloader.clone(), test_config(&temp_dir));

        let config = creators(r#"{"creators": [{"name": "c"}, {"name": "a"}, {"name": "b"}]}"#);
        let summary = runner.run_at(&config, today()).await.unwrap();

        let visited: Vec<String> = downloader.jobs().await.into_iter().map(|j| j.creator).collect();
        assert_eq!(visited, vec!["c", "a", "b"]);
        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_creators() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = MockDownloader::failing_for(&["broken"]);
        let runner = CreatorRunner::new(downloader.clone(), test_config(&temp_dir));

        let config = creators(
            r#"{"creators": [{"name": "first"}, {"name": "broken"}, {"name": "last"}]}"#,
        );
        let summary = runner.run_at(&config, today()).await.unwrap();

        assert_eq!(downloader.jobs().await.len(), 3);
        assert_eq!(summary.failed_creators(), vec!["broken"]);
        assert!(summary.outcomes[2].is_success());
        assert!(matches!(
            &summary.outcomes[1].status,
            CreatorStatus::Failed { reason } if reason.contains("code 1")
        ));
    }

    #[tokio::test]
    async fn test_lookback_and_pass_through_args() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = MockDownloader::default();
        let runner = CreatorRunner::new(downloader.clone(), test_config(&temp_dir));

        let config = creators(
            r#"{"creators": [
                {"name": "alice", "days_back": 7, "ytdlp_args": "--format bestvideo --no-mtime"},
                {"name": "bob"}
            ]}"#,
        );
        runner.run_at(&config, today()).await.unwrap();

        let jobs = downloader.jobs().await;
        let alice = &jobs[0].args;
        let date_at = alice.iter().position(|a| a == "--dateafter").unwrap();
        assert_eq!(alice[date_at + 1], "20240303");
        assert_eq!(
            &alice[alice.len() - 3..],
            &["--format", "bestvideo", "--no-mtime"]
        );

        let bob = &jobs[1].args;
        let date_at = bob.iter().position(|a| a == "--dateafter").unwrap();
        assert_eq!(bob[date_at + 1], "20240209");
        assert_eq!(bob.last().unwrap(), "https://www.patreon.com/bob/posts");
    }

    #[tokio::test]
    async fn test_creates_archive_and_creator_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let archive = config.archive_file();
        let download_dir = config.download_dir.clone();
        let runner = CreatorRunner::new(MockDownloader::default(), config);

        runner
            .run_at(&creators(r#"{"creators": [{"name": "alice"}]}"#), today())
            .await
            .unwrap();

        assert!(archive.is_file());
        assert!(download_dir.join("alice").is_dir());
    }

    #[tokio::test]
    async fn test_empty_creator_list() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = MockDownloader::default();
        let runner = CreatorRunner::new(downloader.clone(), test_config(&temp_dir));

        let summary = runner
            .run_at(&creators(r#"{"creators": []}"#), today())
            .await
            .unwrap();
        assert!(summary.outcomes.is_empty());
        assert!(downloader.jobs().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_creators() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.delay = Duration::from_secs(10);
        let runner = CreatorRunner::new(MockDownloader::default(), config);

        let started = tokio::time::Instant::now();
        runner
            .run_at(
                &creators(r#"{"creators": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}"#),
                today(),
            )
            .await
            .unwrap();

        // 三個創作者之間只有兩次等待
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(20));
        assert!(waited < Duration::from_secs(30));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_paths_belong_to_download_identity() {
        use std::os::unix::fs::MetadataExt;

        let temp_dir = TempDir::new().unwrap();
        // chown 到其他使用者需要 root
        if std::fs::metadata(temp_dir.path()).unwrap().uid() != 0 {
            return;
        }

        let mut config = test_config(&temp_dir);
        config.identity = Some(ProcessIdentity {
            uid: 65534,
            gid: 65534,
        });
        let archive = config.archive_file();
        let creator_dir = config.download_dir.join("alice");
        let runner = CreatorRunner::new(MockDownloader::default(), config);

        runner
            .run_at(&creators(r#"{"creators": [{"name": "alice"}]}"#), today())
            .await
            .unwrap();

        assert_eq!(std::fs::metadata(&archive).unwrap().uid(), 65534);
        assert_eq!(std::fs::metadata(&creator_dir).unwrap().uid(), 65534);
        assert_eq!(std::fs::metadata(&creator_dir).unwrap().gid(), 65534);
    }
}
