use clap::Parser;
use creator_sync::core::compat;
use creator_sync::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "check_ytdlp")]
#[command(about = "Reports which yt-dlp options the installed version supports")]
struct Args {
    #[arg(long, env = "YTDLP_BIN", default_value = "yt-dlp")]
    ytdlp_bin: String,

    /// Where the JSON report is written
    #[arg(long, env = "DOWNLOAD_DIR", default_value = "/downloads")]
    download_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let report = compat::check_compatibility(&args.ytdlp_bin).await;

    let report_path = args.download_dir.join("ytdlp_compatibility.json");
    report.write_to(&report_path)?;
    tracing::info!("Compatibility report written to {}", report_path.display());

    tracing::info!("Recommended yt-dlp command-line options for this version:");
    tracing::info!("{}", report.recommended_command(&args.ytdlp_bin).join(" "));

    Ok(())
}
