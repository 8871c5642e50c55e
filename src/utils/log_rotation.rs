use crate::utils::error::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_KEEP_LOGS: usize = 20;

/// 每次執行的日誌檔名，例如 download_20240131_060000.log
pub fn run_log_name(started_at: DateTime<Local>) -> String {
    format!("download_{}.log", started_at.format("%Y%m%d_%H%M%S"))
}

/// Removes every `.log` file in `dir` except the `keep` most recent ones
/// (by modification time, ties broken by file name). Returns the removed paths.
pub fn rotate_logs(dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut logs: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().and_then(|ext| ext.to_str()) == Some("log");
        if !is_log || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        logs.push((modified, path));
    }

    // 最新的排在前面
    logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let mut removed = Vec::new();
    for (_, path) in logs.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed old log file {}", path.display());
                removed.push(path);
            }
            Err(e) => tracing::warn!("Could not remove old log file {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
