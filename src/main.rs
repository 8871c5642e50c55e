use clap::Parser;
use creator_sync::core::{setup, ytdlp, ConfigProvider};
use creator_sync::utils::logger::{self, FileSink};
use creator_sync::utils::monitor::RunMonitor;
use creator_sync::utils::validation::Validate;
use creator_sync::{CliConfig, CreatorRunner, CreatorsConfig, Scheduler, SyncError, YtDlp};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    let run_log = FileSink::new();
    let detailed_log = logger::init_daemon_logger(config.verbose, &run_log);

    tracing::info!("🚀 Starting creator-sync");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(&e);
    }

    // 缺少必要檔案時在任何下載前結束
    if let Err(e) = setup::verify_required_files(&config) {
        fail(&e);
    }

    let creators = match CreatorsConfig::load(config.config_file()) {
        Ok(creators) => creators,
        Err(e) => fail(&e),
    };
    tracing::info!(
        "✅ Loaded {} creators from {}",
        creators.len(),
        config.config_file().display()
    );

    display_config_summary(&config, &creators);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No downloads will be started");
        perform_dry_run(&config, &creators);
        return Ok(());
    }

    if let Err(e) = setup::prepare_directories(&config) {
        fail(&e);
    }

    // guard 必須活到結束，詳細日誌才會寫完
    let detailed_guard = match detailed_log.attach(&config.detailed_log_file()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            tracing::warn!(
                "Could not open {}: {}",
                config.detailed_log_file().display(),
                e
            );
            None
        }
    };

    if let Some(identity) = config.identity() {
        tracing::info!("👤 Running downloads as {}:{}", identity.uid, identity.gid);
        setup::apply_ownership(
            &[config.config_dir(), config.download_dir()],
            identity,
        );
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    let monitor = RunMonitor::new(config.monitor, config.download_dir.clone());

    let downloader = YtDlp::new(config.ytdlp_bin.clone()).with_identity(config.identity());
    let once = config.once;
    let skip_initial_run = config.skip_initial_run;
    let interval = config.interval();
    let runner = CreatorRunner::new(downloader, config);
    let scheduler = Scheduler::new(runner, run_log, interval).with_monitor(monitor);

    if once {
        match scheduler.run_once().await {
            Ok(Some(summary)) => {
                println!(
                    "✅ Run completed: {} succeeded, {} failed",
                    summary.succeeded(),
                    summary.failed()
                );
            }
            Ok(None) => println!("⏹️ Run interrupted"),
            Err(e) => {
                drop(detailed_guard);
                fail(&e)
            }
        }
        return Ok(());
    }

    if let Err(e) = scheduler.run_forever(skip_initial_run).await {
        drop(detailed_guard);
        fail(&e);
    }

    tracing::info!("👋 creator-sync stopped");
    drop(detailed_guard);
    Ok(())
}

fn fail(e: &SyncError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 啟動階段的錯誤一律以非零結束
    std::process::exit(e.exit_code().max(1));
}

fn display_config_summary(config: &CliConfig, creators: &CreatorsConfig) {
    println!("📋 Configuration Summary:");
    println!("  Config: {}", config.config_file().display());
    println!("  Cookies: {}", config.cookies_file().display());
    println!("  Archive: {}", config.archive_file().display());
    println!("  Downloads: {}", config.download_dir().display());
    println!("  Logs: {} (keeping {})", config.logs_dir().display(), config.keep_logs);
    println!("  Interval: every {} hours", config.interval_hours);
    println!("  Creators: {}", creators.len());

    if let Some(identity) = config.identity() {
        println!("  Identity: {}:{}", identity.uid, identity.gid);
    }
    if config.once {
        println!("  🔂 Single run");
    }
    if config.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &CliConfig, creators: &CreatorsConfig) {
    let today = chrono::Local::now().date_naive();

    println!("🔍 Dry Run Analysis:");
    for creator in &creators.creators {
        let job = ytdlp::build_job(creator, &creators.url_template, config, today);
        println!();
        println!("👤 {} (last {} days)", job.creator, creator.days_back);
        println!("  URL: {}", job.url);
        println!("  Output: {}", job.output_dir.display());
        println!("  Command: {} {}", config.ytdlp_bin, job.args.join(" "));
    }

    println!();
    println!("✅ Dry run analysis complete.");
}
