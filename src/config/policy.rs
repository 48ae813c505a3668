use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional review policy file. Every field has a default, so running
/// without a policy file behaves like the stock bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPolicy {
    #[serde(default)]
    pub review: ReviewSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// 跳過這些副檔名的檔案
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_github_base_url")]
    pub github_base_url: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_ratelimit_retries")]
    pub ratelimit_retries: u32,
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_skip_extensions() -> Vec<String> {
    vec!["xml".to_string(), "bin".to_string()]
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_ratelimit_retries() -> u32 {
    3
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            skip_extensions: default_skip_extensions(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            github_base_url: default_github_base_url(),
            gemini_base_url: default_gemini_base_url(),
            timeout_seconds: default_timeout_seconds(),
            ratelimit_retries: default_ratelimit_retries(),
        }
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            review: ReviewSettings::default(),
            api: ApiSettings::default(),
        }
    }
}

impl ReviewPolicy {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.github_base_url", &self.api.github_base_url)?;
        validate_url("api.gemini_base_url", &self.api.gemini_base_url)?;
        validate_positive_number(
            "api.timeout_seconds",
            self.api.timeout_seconds as usize,
            1,
        )?;

        if self.review.model.trim().is_empty() {
            return Err(BotError::InvalidConfigValueError {
                field: "review.model".to_string(),
                value: self.review.model.clone(),
                reason: "Model name cannot be empty".to_string(),
            });
        }

        for ext in &self.review.skip_extensions {
            if ext.starts_with('.') || ext.trim().is_empty() {
                return Err(BotError::InvalidConfigValueError {
                    field: "review.skip_extensions".to_string(),
                    value: ext.clone(),
                    reason: "Extensions are listed without a leading dot".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for ReviewPolicy {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
