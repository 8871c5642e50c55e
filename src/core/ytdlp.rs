use crate::core::progress::{LineLevel, ProgressFilter};
use crate::domain::model::{Creator, DownloadJob, ProcessIdentity};
use crate::domain::ports::{ConfigProvider, Downloader};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub const PROGRESS_TEMPLATE: &str = "[download] %(progress._percent_str)s of %(progress._total_bytes_str)s at %(progress._speed_str)s ETA %(progress._eta_str)s";
pub const OUTPUT_TEMPLATE: &str = "%(title)s [%(id)s].%(ext)s";

/// `today - days_back` as yt-dlp's `--dateafter` value (YYYYMMDD).
pub fn date_after(today: NaiveDate, days_back: u32) -> String {
    today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y%m%d")
        .to_string()
}

/// 組出一個創作者的 yt-dlp 參數；自訂參數一律放在最後
pub fn build_job<C: ConfigProvider + ?Sized>(
    creator: &Creator,
    url_template: &str,
    config: &C,
    today: NaiveDate,
) -> DownloadJob {
    let output_dir = config.download_dir().join(&creator.name);
    let url = creator.url(url_template);

    let mut args = vec![
        "--cookies".to_string(),
        config.cookies_file().to_string_lossy().into_owned(),
        "--download-archive".to_string(),
        config.archive_file().to_string_lossy().into_owned(),
        "--dateafter".to_string(),
        date_after(today, creator.days_back),
        "-o".to_string(),
        output_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
        "--write-info-json".to_string(),
        "--write-description".to_string(),
        "--write-thumbnail".to_string(),
        "--restrict-filenames".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        url.clone(),
    ];
    args.extend(creator.extra_args());

    DownloadJob {
        creator: creator.name.clone(),
        url,
        output_dir,
        args,
    }
}

/// Runs the real yt-dlp binary and streams its output into the log.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    identity: Option<ProcessIdentity>,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: Option<ProcessIdentity>) -> Self {
        self.identity = identity;
        self
    }

    fn command(&self, job: &DownloadJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&job.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        apply_identity(&mut cmd, self.identity);
        cmd
    }
}

#[cfg(unix)]
fn apply_identity(cmd: &mut Command, identity: Option<ProcessIdentity>) {
    if let Some(identity) = identity {
        cmd.uid(identity.uid).gid(identity.gid);
    }
}

#[cfg(not(unix))]
fn apply_identity(_cmd: &mut Command, identity: Option<ProcessIdentity>) {
    if identity.is_some() {
        tracing::warn!("PUID/PGID are only supported on unix; running yt-dlp as the current user");
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn download(&self, job: &DownloadJob) -> Result<()> {
        tracing::info!("Starting download for {}", job.creator);
        tracing::debug!("{} {}", self.program, job.args.join(" "));

        let mut child = self
            .command(job)
            .spawn()
            .map_err(|source| SyncError::SpawnError {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
        let stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
        let mut filter = ProgressFilter::new();

        // stdout 與 stderr 合併成同一個日誌串流
        if let (Some(mut out_lines), Some(mut err_lines)) = (stdout, stderr) {
            let mut out_done = false;
            let mut err_done = false;
            while !(out_done && err_done) {
                tokio::select! {
                    line = out_lines.next_line(), if !out_done => match line {
                        Ok(Some(line)) => log_line(&mut filter, &job.creator, &line),
                        Ok(None) => out_done = true,
                        Err(e) => {
                            tracing::warn!("{}: could not read yt-dlp stdout: {}", job.creator, e);
                            out_done = true;
                        }
                    },
                    line = err_lines.next_line(), if !err_done => match line {
                        Ok(Some(line)) => log_line(&mut filter, &job.creator, &line),
                        Ok(None) => err_done = true,
                        Err(e) => {
                            tracing::warn!("{}: could not read yt-dlp stderr: {}", job.creator, e);
                            err_done = true;
                        }
                    },
                }
            }
        }

        let status = child.wait().await?;
        check_status(&job.creator, status)
    }
}

fn log_line(filter: &mut ProgressFilter, creator: &str, line: &str) {
    match filter.classify(line) {
        Some(LineLevel::Warn) => tracing::warn!("{}: {}", creator, line.trim()),
        Some(LineLevel::Info) => tracing::info!("{}: {}", creator, line.trim()),
        Some(LineLevel::Debug) => tracing::debug!("{}: {}", creator, line.trim()),
        None => {}
    }
}

fn check_status(creator: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let reason = match status.code() {
        Some(code) => format!("yt-dlp exited with code {}", code),
        None => "yt-dlp was terminated by a signal".to_string(),
    };
    Err(SyncError::DownloadFailed {
        creator: creator.to_string(),
        reason,
        exit_code: status.code(),
    })
}
