use crate::utils::error::{Result, SyncError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SyncError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.to_string_lossy();
    if display.is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if display.contains('\0') {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 名稱會直接成為下載目錄底下的子目錄，不能跳出該目錄
pub fn validate_path_segment(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let reason = if value == "." || value == ".." {
        Some("Name cannot be a relative directory reference")
    } else if value.contains(['/', '\\', '\0']) {
        Some("Name cannot contain path separators or null bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SyncError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("url_template", "https://example.com").is_ok());
        assert!(validate_url("url_template", "http://example.com").is_ok());
        assert!(validate_url("url_template", "").is_err());
        assert!(validate_url("url_template", "invalid-url").is_err());
        assert!(validate_url("url_template", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path_segment() {
        assert!(validate_path_segment("name", "some_creator").is_ok());
        assert!(validate_path_segment("name", "creator.with.dots").is_ok());
        assert!(validate_path_segment("name", "").is_err());
        assert!(validate_path_segment("name", "   ").is_err());
        assert!(validate_path_segment("name", "..").is_err());
        assert!(validate_path_segment("name", "a/b").is_err());
        assert!(validate_path_segment("name", "a\\b").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("interval_hours", 6, 1, 168).is_ok());
        assert!(validate_range("interval_hours", 0, 1, 168).is_err());
        assert!(validate_range("interval_hours", 169, 1, 168).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(1000u32);
        let missing: Option<u32> = None;
        assert_eq!(*validate_required_field("puid", &present).unwrap(), 1000);
        assert!(matches!(
            validate_required_field("puid", &missing),
            Err(SyncError::MissingConfigError { .. })
        ));
    }
}
