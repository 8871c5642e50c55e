use crate::domain::model::ProcessIdentity;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SyncError};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Fails when the creator list or the cookie file is missing. Nothing else is
/// touched, so a failed check leaves the filesystem as it was.
pub fn verify_required_files<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    let required = [
        ("creator config file", config.config_file()),
        ("cookie file", config.cookies_file()),
    ];

    for (kind, path) in required {
        if !path.is_file() {
            return Err(SyncError::MissingFileError {
                kind: kind.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    Ok(())
}

pub fn prepare_directories<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    fs::create_dir_all(config.download_dir())?;
    fs::create_dir_all(config.logs_dir())?;
    Ok(())
}

/// 建立空的 archive 檔；已存在則不動。回傳是否新建
pub fn ensure_archive_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::File::create(path)?;
    tracing::info!("Created new archive file at {}", path.display());
    Ok(true)
}

/// Hands a single path the daemon just created over to the download
/// identity. No-op without an identity; failures are logged.
pub fn assign_owner(path: &Path, identity: Option<ProcessIdentity>) {
    let Some(identity) = identity else {
        return;
    };
    if let Err(e) = chown(path, identity) {
        tracing::warn!("{}", e);
    }
}

/// Recursively changes ownership of every root. Entries that cannot be
/// changed are logged and skipped; the number of changed entries is returned.
pub fn apply_ownership(roots: &[&Path], identity: ProcessIdentity) -> usize {
    let mut changed = 0;
    let mut failures = 0;

    for root in roots {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path under {}: {}", root.display(), e);
                    failures += 1;
                    continue;
                }
            };
            match chown(entry.path(), identity) {
                Ok(()) => changed += 1,
                Err(e) => {
                    // 第一個錯誤記 warn，之後只記 debug 以免洗版
                    if failures == 0 {
                        tracing::warn!("{}", e);
                    } else {
                        tracing::debug!("{}", e);
                    }
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        tracing::warn!(
            "Ownership change to {}:{} failed for {} entries",
            identity.uid,
            identity.gid,
            failures
        );
    } else {
        tracing::info!(
            "Set ownership of {} entries to {}:{}",
            changed,
            identity.uid,
            identity.gid
        );
    }

    changed
}

#[cfg(unix)]
fn chown(path: &Path, identity: ProcessIdentity) -> Result<()> {
    std::os::unix::fs::lchown(path, Some(identity.uid), Some(identity.gid)).map_err(|e| {
        SyncError::PermissionError {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(not(unix))]
fn chown(path: &Path, _identity: ProcessIdentity) -> Result<()> {
    Err(SyncError::PermissionError {
        path: path.display().to_string(),
        message: "ownership changes are only supported on unix".to_string(),
    })
}
