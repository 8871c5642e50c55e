use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;

/// Options whose availability differs between yt-dlp releases.
pub const CHECKED_OPTIONS: [&str; 6] = [
    "--force-progress",
    "--no-extract-audio",
    "--extract-audio",
    "--no-progress-template",
    "--progress-template",
    "--add-header",
];

pub const REFERER_HEADER: &str = "Referer:https://www.patreon.com/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub version: String,
    pub supported_options: BTreeMap<String, bool>,
    pub unsupported_options: BTreeMap<String, bool>,
}

impl CompatibilityReport {
    /// 以 `--help` 的輸出判斷每個選項是否支援
    pub fn from_help(version: impl Into<String>, help_text: &str) -> Self {
        let mut supported_options = BTreeMap::new();
        let mut unsupported_options = BTreeMap::new();

        for option in CHECKED_OPTIONS {
            if help_text.contains(option) {
                tracing::info!("Option {} is supported", option);
                supported_options.insert(option.to_string(), true);
            } else {
                tracing::warn!("Option {} is NOT supported", option);
                unsupported_options.insert(option.to_string(), false);
            }
        }

        Self {
            version: version.into(),
            supported_options,
            unsupported_options,
        }
    }

    pub fn is_supported(&self, option: &str) -> bool {
        self.supported_options.contains_key(option)
    }

    /// Suggested base command line for this yt-dlp. The progress template
    /// flags are left out since they need a template argument.
    pub fn recommended_command(&self, program: &str) -> Vec<String> {
        let mut cmd: Vec<String> = [
            program,
            "--cookies",
            "COOKIES_FILE",
            "--download-archive",
            "ARCHIVE_FILE",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for option in CHECKED_OPTIONS.iter().filter(|o| self.is_supported(o)) {
            match *option {
                "--add-header" => {
                    cmd.push("--add-header".to_string());
                    cmd.push(REFERER_HEADER.to_string());
                }
                "--progress-template" | "--no-progress-template" => {}
                other => cmd.push(other.to_string()),
            }
        }

        cmd
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Installed version, or "unknown" when yt-dlp cannot be run.
pub async fn ytdlp_version(program: &str) -> String {
    match run_capture(program, "--version").await {
        Some(output) => {
            let version = output.trim().to_string();
            tracing::info!("Using yt-dlp version: {}", version);
            version
        }
        None => {
            tracing::warn!("Could not determine yt-dlp version");
            "unknown".to_string()
        }
    }
}

pub async fn ytdlp_help(program: &str) -> String {
    run_capture(program, "--help").await.unwrap_or_else(|| {
        tracing::error!("Error getting yt-dlp help");
        String::new()
    })
}

pub async fn check_compatibility(program: &str) -> CompatibilityReport {
    tracing::info!("Checking yt-dlp compatibility...");
    let version = ytdlp_version(program).await;
    let help = ytdlp_help(program).await;
    CompatibilityReport::from_help(version, &help)
}

async fn run_capture(program: &str, arg: &str) -> Option<String> {
    let output = match Command::new(program).arg(arg).output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("Failed to run {} {}: {}", program, arg, e);
            return None;
        }
    };

    if !output.status.success() {
        tracing::debug!(
            "{} {} failed: {}",
            program,
            arg,
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
