use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JWT signing error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Base64 decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("GitHub API error (HTTP {status}): {message}")]
    GitHubError { status: u16, message: String },

    #[error("Analysis error: {message}")]
    AnalysisError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    Processing,
    System,
}

impl BotError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorSeverity::High,
            BotError::AuthError { .. } | BotError::JwtError(_) => ErrorSeverity::High,
            BotError::ApiError(_) | BotError::GitHubError { .. } => ErrorSeverity::Medium,
            BotError::AnalysisError { .. } => ErrorSeverity::Medium,
            BotError::ProcessingError { .. }
            | BotError::SerializationError(_)
            | BotError::DecodeError(_) => ErrorSeverity::High,
            BotError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BotError::AuthError { .. } | BotError::JwtError(_) => ErrorCategory::Authentication,
            BotError::ApiError(_) | BotError::GitHubError { .. } => ErrorCategory::Network,
            BotError::AnalysisError { .. }
            | BotError::ProcessingError { .. }
            | BotError::SerializationError(_)
            | BotError::DecodeError(_) => ErrorCategory::Processing,
            BotError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid value for {}: {}", field, reason)
            }
            BotError::ConfigValidationError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
            BotError::AuthError { message } => {
                format!("GitHub App authentication failed: {}", message)
            }
            BotError::JwtError(_) => "GitHub App authentication failed: could not sign the app JWT"
                .to_string(),
            BotError::GitHubError { status, .. } => {
                format!("GitHub rejected a request with HTTP {}", status)
            }
            BotError::AnalysisError { message } => {
                format!("Code analysis failed: {}", message)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check GITHUB_APP_ID, GITHUB_PRIVATE_KEY, GITHUB_INSTALLATION_ID, \
                 GEMINI_API_KEY, GITHUB_REPOSITORY and GITHUB_PR_NUMBER"
                    .to_string()
            }
            ErrorCategory::Authentication => {
                "Verify the app private key PEM and that the app is installed on the repository"
                    .to_string()
            }
            ErrorCategory::Network => {
                "Check network access and API rate limits, then retry the job".to_string()
            }
            ErrorCategory::Processing => {
                "Re-run the job; if it persists, inspect the PR diff and the model output"
                    .to_string()
            }
            ErrorCategory::System => "Check disk space and file permissions".to_string(),
        }
    }
}
