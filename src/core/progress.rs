use regex::Regex;
use std::sync::LazyLock;

static PROGRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\].*?(\d+\.\d)%").expect("progress pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Warn,
    Info,
    Debug,
}

/// Decides at which level a line of yt-dlp output is logged. Percent lines
/// only pass when the whole-number percentage moves forward, so a download
/// logs at most about a hundred progress lines.
#[derive(Debug)]
pub struct ProgressFilter {
    last_logged_percent: i64,
}

impl ProgressFilter {
    pub fn new() -> Self {
        Self {
            last_logged_percent: -1,
        }
    }

    /// `None` means the line is dropped.
    pub fn classify(&mut self, line: &str) -> Option<LineLevel> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.starts_with("ERROR:") || line.starts_with("WARNING:") {
            return Some(LineLevel::Warn);
        }

        if line.starts_with("[download] Destination:") {
            self.reset();
            return Some(LineLevel::Debug);
        }

        if line.starts_with("[download]") && line.contains('%') {
            let Some(caps) = PROGRESS_PATTERN.captures(line) else {
                // 完成訊息等沒有百分比數字的行
                return Some(LineLevel::Info);
            };
            let percent = caps[1].parse::<f64>().map(|p| p as i64).unwrap_or(0);
            if percent > self.last_logged_percent {
                self.last_logged_percent = percent;
                return Some(LineLevel::Info);
            }
            return None;
        }

        if line.contains("[info]") || line.contains("has already been downloaded") {
            Some(LineLevel::Info)
        } else {
            Some(LineLevel::Debug)
        }
    }

    /// 下一個檔案開始下載時重設
    pub fn reset(&mut self) {
        self.last_logged_percent = -1;
    }
}

impl Default for ProgressFilter {
    fn default() -> Self {
        Self::new()
    }
}
