use crate::config::creators::CreatorsConfig;
use crate::core::runner::CreatorRunner;
use crate::core::setup;
use crate::domain::model::RunSummary;
use crate::domain::ports::{ConfigProvider, Downloader};
use crate::utils::error::Result;
use crate::utils::log_rotation::{rotate_logs, run_log_name};
use crate::utils::logger::FileSink;
use crate::utils::monitor::RunMonitor;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Runs the creator loop on a fixed interval. Runs never overlap; a run that
/// takes longer than the interval pushes the next one back.
pub struct Scheduler<D: Downloader, C: ConfigProvider> {
    runner: CreatorRunner<D, C>,
    run_log: FileSink,
    interval: Duration,
    monitor: RunMonitor,
}

impl<D: Downloader, C: ConfigProvider> Scheduler<D, C> {
    pub fn new(runner: CreatorRunner<D, C>, run_log: FileSink, interval: Duration) -> Self {
        Self {
            runner,
            run_log,
            interval,
            monitor: RunMonitor::default(),
        }
    }

    pub fn with_monitor(mut self, monitor: RunMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// 一次完整的排程執行：開啟本次日誌、重新讀取設定、下載、輪替日誌
    pub async fn run_cycle(&self) -> Result<RunSummary> {
        let config = self.runner.config();
        let logs_dir = config.logs_dir();
        std::fs::create_dir_all(&logs_dir)?;

        let log_path = logs_dir.join(run_log_name(chrono::Local::now()));
        match self.run_log.open(&log_path) {
            Ok(()) => setup::assign_owner(&log_path, config.identity()),
            Err(e) => tracing::warn!("Could not open run log {}: {}", log_path.display(), e),
        }
        tracing::info!("📝 Logging this run to {}", log_path.display());

        // 每次執行都重新讀取，修改設定不需要重啟
        let result = match CreatorsConfig::load(config.config_file()) {
            Ok(creators) => self.runner.run(&creators).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::error!("❌ Run aborted: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        }
        self.monitor.log_stats("Run finished");
        self.finish_run();

        result
    }

    /// 關閉本次日誌並輪替舊日誌；中斷的執行也會走這裡
    fn finish_run(&self) {
        if let Err(e) = self.run_log.close() {
            tracing::warn!("Could not close run log: {}", e);
        }

        let config = self.runner.config();
        match rotate_logs(&config.logs_dir(), config.keep_logs()) {
            Ok(removed) if !removed.is_empty() => {
                tracing::info!("Removed {} old log files", removed.len());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Log rotation failed: {}", e),
        }
    }

    /// A single run that stops early on ctrl-c or SIGTERM.
    pub async fn run_once(&self) -> Result<Option<RunSummary>> {
        self.run_once_until(shutdown_signal()).await
    }

    /// Returns `Ok(None)` when `shutdown` resolves before the run finishes.
    pub async fn run_once_until<F>(&self, shutdown: F) -> Result<Option<RunSummary>>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run_cycle() => result.map(Some),
            _ = shutdown => {
                tracing::warn!("Shutdown requested during a run, stopping downloads");
                self.finish_run();
                Ok(None)
            }
        }
    }

    /// Runs until ctrl-c or SIGTERM.
    pub async fn run_forever(&self, skip_initial_run: bool) -> Result<()> {
        self.run_until(skip_initial_run, shutdown_signal()).await
    }

    /// Runs until `shutdown` resolves. An in-flight run is dropped, which
    /// kills the running downloader.
    pub async fn run_until<F>(&self, skip_initial_run: bool, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if skip_initial_run {
            // 第一個 tick 會立即完成
            ticker.tick().await;
        }

        tracing::info!(
            "⏰ Scheduler started: checking creators every {:?}",
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    return Ok(());
                }
            }

            tokio::select! {
                result = self.run_cycle() => {
                    if let Ok(summary) = result {
                        tracing::debug!("Run finished with {} failures", summary.failed());
                    }
                }
                _ = &mut shutdown => {
                    tracing::warn!("Shutdown requested during a run, stopping downloads");
                    self.finish_run();
                    return Ok(());
                }
            }
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Could not install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
