use thiserror::Error;

/// Errors that can occur during a recipe import
#[derive(Error, Debug)]
pub enum ImportError {
    /// Every extraction strategy was tried and none produced text
    #[error("Couldn't extract recipe content from {input}: {}", .attempts.join("; "))]
    ExtractionFailed {
        input: String,
        /// One entry per failed attempt, in the order they were tried
        attempts: Vec<String>,
    },

    /// Every OCR provider failed or returned empty text
    #[error("Couldn't read text from image: {}", .attempts.join("; "))]
    OcrFailed { attempts: Vec<String> },

    /// Input rejected before any extraction was attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to fetch a URL
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Completion provider could not be created or called
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

/// Outcome of a single failed attempt inside a fallback chain.
///
/// These are logged and collected, never returned to the caller on their own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The strategy does not apply to this input and was skipped
    #[error("not applicable")]
    NotApplicable,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("no recipe content found: {0}")]
    NoContent(String),
}

impl StrategyError {
    /// Whether a retry of the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StrategyError::Request(_) | StrategyError::Timeout(_) => true,
            StrategyError::Status(code) => *code >= 500 || *code == 429,
            StrategyError::NotApplicable | StrategyError::NoContent(_) => false,
        }
    }
}

impl From<reqwest::Error> for StrategyError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => StrategyError::Status(status.as_u16()),
            None => StrategyError::Request(e.to_string()),
        }
    }
}
