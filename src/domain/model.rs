use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DAYS_BACK: u32 = 30;
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.patreon.com/{name}/posts";

fn default_days_back() -> u32 {
    DEFAULT_DAYS_BACK
}

/// 一個需要定期檢查的創作者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,

    #[serde(default = "default_days_back")]
    pub days_back: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytdlp_args: Option<String>,

    /// Overrides the URL built from the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Creator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            days_back: DEFAULT_DAYS_BACK,
            ytdlp_args: None,
            url: None,
        }
    }

    pub fn with_days_back(mut self, days_back: u32) -> Self {
        self.days_back = days_back;
        self
    }

    pub fn with_ytdlp_args(mut self, args: impl Into<String>) -> Self {
        self.ytdlp_args = Some(args.into());
        self
    }

    pub fn url(&self, template: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => template.replace("{name}", &self.name),
        }
    }

    /// Pass-through arguments, split on whitespace.
    pub fn extra_args(&self) -> Vec<String> {
        self.ytdlp_args
            .as_deref()
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// uid/gid the downloader runs as and the data directories are owned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub uid: u32,
    pub gid: u32,
}

/// 一次 yt-dlp 呼叫所需的全部資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub creator: String,
    pub url: String,
    pub output_dir: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorStatus {
    Completed,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct CreatorOutcome {
    pub name: String,
    pub status: CreatorStatus,
    pub elapsed: Duration,
}

impl CreatorOutcome {
    pub fn is_success(&self) -> bool {
        self.status == CreatorStatus::Completed
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<CreatorOutcome>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failed_creators(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.name.as_str())
            .collect()
    }
}
