use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Required {kind} not found at {path}")]
    MissingFileError { kind: String, path: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to launch {program}: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Download failed for {creator}: {reason}")]
    DownloadFailed {
        creator: String,
        reason: String,
        exit_code: Option<i32>,
    },

    #[error("Ownership change failed for {path}: {message}")]
    PermissionError { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    FileSystem,
    ExternalTool,
    Data,
    Permission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::IoError(_) => ErrorCategory::FileSystem,
            SyncError::SerializationError(_) => ErrorCategory::Data,
            SyncError::MissingFileError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SyncError::SpawnError { .. } | SyncError::DownloadFailed { .. } => {
                ErrorCategory::ExternalTool
            }
            SyncError::PermissionError { .. } => ErrorCategory::Permission,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一創作者失敗不影響其他創作者
            SyncError::DownloadFailed { .. } => ErrorSeverity::Medium,
            SyncError::PermissionError { .. } => ErrorSeverity::Low,
            SyncError::SpawnError { .. } | SyncError::SerializationError(_) => ErrorSeverity::High,
            SyncError::MissingFileError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            SyncError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SyncError::MissingFileError { kind, path } => {
                format!("Provide the {} at {} and restart the container", kind, path)
            }
            SyncError::MissingConfigError { field } => {
                format!("Add the '{}' field to the configuration", field)
            }
            SyncError::ConfigValidationError { field, .. }
            | SyncError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the configuration", field)
            }
            SyncError::SerializationError(_) => {
                "Check that config.json is valid JSON with a top-level \"creators\" array".to_string()
            }
            SyncError::SpawnError { program, .. } => {
                format!("Make sure '{}' is installed and on PATH", program)
            }
            SyncError::DownloadFailed { .. } => {
                "Check the run log for yt-dlp output; expired cookies are the usual cause".to_string()
            }
            SyncError::PermissionError { .. } => {
                "Run as root or drop PUID/PGID if ownership changes are not needed".to_string()
            }
            SyncError::IoError(_) => "Check disk space and directory permissions".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::FileSystem => format!("File system problem: {}", self),
            ErrorCategory::ExternalTool => format!("Downloader problem: {}", self),
            ErrorCategory::Data => format!("Invalid data: {}", self),
            ErrorCategory::Permission => format!("Permission problem: {}", self),
        }
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_fatal() {
        let err = SyncError::MissingFileError {
            kind: "cookie file".to_string(),
            path: "/config/cookies.txt".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_ne!(err.exit_code(), 0);
        assert!(err.recovery_suggestion().contains("/config/cookies.txt"));
    }

    #[test]
    fn test_download_failure_is_not_critical() {
        let err = SyncError::DownloadFailed {
            creator: "alice".to_string(),
            reason: "yt-dlp exited with code 1".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(err.category(), ErrorCategory::ExternalTool);
        assert!(err.severity() < ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Downloader problem"));
    }
}
