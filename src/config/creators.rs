use crate::domain::model::{Creator, DEFAULT_URL_TEMPLATE};
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_DAYS_BACK: u32 = 36_500;

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

/// config.json 的內容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorsConfig {
    pub creators: Vec<Creator>,

    #[serde(default = "default_url_template")]
    pub url_template: String,
}

impl CreatorsConfig {
    /// 從 JSON 檔案載入創作者清單
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Loads and validates in one step; what every run does.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate_config(&self) -> Result<()> {
        if !self.url_template.contains("{name}") {
            return Err(SyncError::ConfigValidationError {
                field: "url_template".to_string(),
                message: "Template must contain the {name} placeholder".to_string(),
            });
        }
        validation::validate_url(
            "url_template",
            &self.url_template.replace("{name}", "creator"),
        )?;

        for (i, creator) in self.creators.iter().enumerate() {
            validation::validate_path_segment(&format!("creators[{}].name", i), &creator.name)?;
            validation::validate_range(
                &format!("creators[{}].days_back", i),
                creator.days_back,
                0,
                MAX_DAYS_BACK,
            )?;
            if let Some(url) = &creator.url {
                validation::validate_url(&format!("creators[{}].url", i), url)?;
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl Validate for CreatorsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
