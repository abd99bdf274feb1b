use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::recovery::RecoveryOptions;

/// Top-level pipeline configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub recovery: RecoveryOptions,
    #[serde(default)]
    pub ai: AiConfig,
}

/// Network behaviour of the content extractor
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Upper bound for one strategy attempt, retries included, in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout: u64,
    /// Extra tries after a transient failure
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base delay between retries in milliseconds (grows linearly)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL of the text-extraction proxy; the target URL is appended
    #[serde(default = "default_reader_proxy_url")]
    pub reader_proxy_url: String,
    /// oEmbed endpoints keyed by platform name
    #[serde(default = "default_oembed")]
    pub oembed: HashMap<String, String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            attempt_timeout: default_attempt_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
            reader_proxy_url: default_reader_proxy_url(),
            oembed: default_oembed(),
        }
    }
}

impl ExtractionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout)
    }
}

/// Defaults for the OCR engine
#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// Run the full preprocessing chain before recognition
    #[serde(default = "default_true")]
    pub preprocess: bool,
    /// "auto" or a provider name such as "google_vision"
    #[serde(default = "default_ocr_provider")]
    pub provider: String,
    #[serde(default = "default_true")]
    pub allow_fallback_providers: bool,
    /// Per-provider timeout in seconds
    #[serde(default = "default_ocr_timeout")]
    pub attempt_timeout: u64,
    /// Google Cloud Vision key, falls back to GOOGLE_API_KEY
    pub google_api_key: Option<String>,
    #[serde(default = "default_google_endpoint")]
    pub google_endpoint: String,
    #[serde(default = "default_tesseract_command")]
    pub tesseract_command: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            preprocess: true,
            provider: default_ocr_provider(),
            allow_fallback_providers: true,
            attempt_timeout: default_ocr_timeout(),
            google_api_key: None,
            google_endpoint: default_google_endpoint(),
            tesseract_command: default_tesseract_command(),
        }
    }
}

/// Completion provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Default provider to use when not specified
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            fallback: FallbackConfig::default(),
        }
    }
}

/// Configuration for a specific completion provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4.1-mini", "claude-3-5-haiku-latest")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of retry attempts per provider before fallback
    #[serde(default = "default_provider_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds
    #[serde(default = "default_provider_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_provider_retry_attempts(),
            retry_delay_ms: default_provider_retry_delay_ms(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    30
}

fn default_attempt_timeout() -> u64 {
    45
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_reader_proxy_url() -> String {
    "https://r.jina.ai/".to_string()
}

fn default_oembed() -> HashMap<String, String> {
    HashMap::from([
        (
            "tiktok".to_string(),
            "https://www.tiktok.com/oembed".to_string(),
        ),
        (
            "youtube".to_string(),
            "https://www.youtube.com/oembed".to_string(),
        ),
    ])
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ocr_provider() -> String {
    "auto".to_string()
}

fn default_ocr_timeout() -> u64 {
    30
}

fn default_google_endpoint() -> String {
    "https://vision.googleapis.com".to_string()
}

fn default_tesseract_command() -> String {
    "tesseract".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    500
}

fn default_provider_retry_attempts() -> u32 {
    2
}

fn default_provider_retry_delay_ms() -> u64 {
    1000
}

impl PipelineConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_INGEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_INGEST__AI__PROVIDERS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`PipelineConfig::load`] for the precedence rules.
pub fn load_config() -> Result<PipelineConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_INGEST__OCR__LANGUAGE
        .add_source(
            Environment::with_prefix("RECIPE_INGEST")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
