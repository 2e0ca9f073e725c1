use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinshotError {
    #[error("WebDriver request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Screenshot decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("WebDriver error '{error}': {message}")]
    WebDriverError { error: String, message: String },

    #[error("Timed out after {after:?} while {operation}")]
    TimeoutError { operation: String, after: Duration },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Matched lists are out of lockstep: {original} original URLs vs {staging} staging URLs")]
    LedgerMismatchError { original: usize, staging: usize },

    #[error("All cases have been excluded, no URLs left for processing")]
    AllCasesExcluded,

    #[error("Revert is unavailable, missing ledger files: {}", missing.join(", "))]
    RevertUnavailable { missing: Vec<String> },

    #[error("Capture error: {message}")]
    CaptureError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Browser,
    Storage,
    Configuration,
    Ledger,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TwinshotError {
    pub fn webdriver(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WebDriverError {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::TimeoutError {
            operation: operation.into(),
            after,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) => ErrorCategory::Network,
            Self::WebDriverError { .. } | Self::TimeoutError { .. } | Self::DecodeError(_) => {
                ErrorCategory::Browser
            }
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::LedgerMismatchError { .. }
            | Self::AllCasesExcluded
            | Self::RevertUnavailable { .. } => ErrorCategory::Ledger,
            Self::CaptureError { .. } => ErrorCategory::Capture,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RevertUnavailable { .. } => ErrorSeverity::Low,
            Self::HttpError(_)
            | Self::WebDriverError { .. }
            | Self::TimeoutError { .. }
            | Self::DecodeError(_)
            | Self::CaptureError { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::AllCasesExcluded => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) | Self::LedgerMismatchError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 是否值得重試（瞬時的瀏覽器或網路錯誤）
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Browser | ErrorCategory::Capture
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::HttpError(_) => {
                "Check that the WebDriver server (chromedriver, geckodriver, msedgedriver or safaridriver) is running and reachable".to_string()
            }
            Self::WebDriverError { error, .. } if error == "session not created" => {
                "Make sure the browser version matches the WebDriver server version".to_string()
            }
            Self::WebDriverError { .. } | Self::TimeoutError { .. } | Self::DecodeError(_) => {
                "Retry the affected cases with --retry once the sites respond normally".to_string()
            }
            Self::IoError(_) => "Check permissions and free space in the working directory".to_string(),
            Self::SerializationError(_) => {
                "Make sure the matching/excluded JSON files contain an array of URL strings".to_string()
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and run again".to_string()
            }
            Self::LedgerMismatchError { .. } => {
                "Regenerate matching_original_urls.json and matching_staging_urls.json with the URL matcher".to_string()
            }
            Self::AllCasesExcluded => {
                "Run `twinshot-ledger revert` to bring the excluded cases back".to_string()
            }
            Self::RevertUnavailable { .. } => {
                "Nothing to revert; exclude cases first".to_string()
            }
            Self::CaptureError { .. } => "Inspect the logs for the failing URL".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to the browser driver: {}", self),
            ErrorCategory::Browser => format!("Browser automation failed: {}", self),
            ErrorCategory::Storage => format!("Could not read or write state files: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Ledger => self.to_string(),
            ErrorCategory::Capture => format!("Screenshot capture failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TwinshotError>;
