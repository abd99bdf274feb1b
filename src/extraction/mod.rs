//! Turning a classified input into raw recipe text.
//!
//! URLs run through an ordered chain of [`ExtractionStrategy`] objects until
//! one yields text. Text passes through, images go to the OCR engine.

pub mod fetcher;
pub mod strategies;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{normalize_url, parse_web_url};
use crate::config::ExtractionConfig;
use crate::error::{ImportError, StrategyError};
use crate::model::{
    DetectionResult, ExtractionMetadata, ExtractionResult, ImportInput, InputType, Platform,
};
use crate::ocr::{OcrEngine, OcrOptions};

pub use fetcher::RequestFetcher;
pub use strategies::{HtmlHeuristic, PlatformOembed, ReaderProxy, StructuredData};

pub const METHOD_PLAIN_TEXT: &str = "plain-text";
pub const METHOD_IMAGE_OCR: &str = "image-ocr";

/// Text produced by a successful strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub text: String,
    pub confidence: f64,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub image: Option<String>,
    pub nutrition: BTreeMap<String, String>,
    pub fallback_used: bool,
}

/// Per-import state shared by the strategies of one chain run.
pub struct ExtractionContext {
    pub url: Url,
    pub platform: Platform,
    pub fetcher: Arc<RequestFetcher>,
    // Kept as text, parsed documents are not Send
    page: Option<Result<Arc<str>, StrategyError>>,
}

impl ExtractionContext {
    pub fn new(url: Url, platform: Platform, fetcher: Arc<RequestFetcher>) -> Self {
        ExtractionContext {
            url,
            platform,
            fetcher,
            page: None,
        }
    }

    /// Page HTML, fetched on first use. A failed fetch is remembered too.
    pub async fn page(&mut self) -> Result<Arc<str>, StrategyError> {
        if let Some(cached) = &self.page {
            return cached.clone();
        }
        let fetched = self
            .fetcher
            .fetch_text(self.url.as_str())
            .await
            .map(Arc::<str>::from);
        self.page = Some(fetched.clone());
        fetched
    }
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err(StrategyError::NotApplicable)` skips the strategy without
    /// recording it.
    async fn attempt(&self, ctx: &mut ExtractionContext) -> Result<StrategyOutput, StrategyError>;
}

pub struct ContentExtractor {
    fetcher: Arc<RequestFetcher>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    attempt_timeout: Duration,
    ocr: OcrEngine,
    ocr_options: OcrOptions,
}

impl ContentExtractor {
    pub fn new(
        config: &ExtractionConfig,
        ocr: OcrEngine,
        ocr_options: OcrOptions,
    ) -> Result<Self, ImportError> {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(StructuredData),
            Box::new(PlatformOembed::new(config.oembed.clone())),
            Box::new(HtmlHeuristic),
            Box::new(ReaderProxy::new(&config.reader_proxy_url)),
        ];

        Ok(ContentExtractor {
            fetcher: Arc::new(RequestFetcher::new(config)?),
            strategies,
            attempt_timeout: config.attempt_timeout(),
            ocr,
            ocr_options,
        })
    }

    /// Replace the URL strategy chain
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn extract(
        &self,
        input: &ImportInput,
        detection: &DetectionResult,
    ) -> Result<ExtractionResult, ImportError> {
        match detection.input_type {
            InputType::Url => self.extract_url(input, detection).await,
            InputType::Text => extract_text(input, detection),
            InputType::Image => self.extract_image(input).await,
            InputType::Video => Err(ImportError::ExtractionFailed {
                input: source_name(input, "video"),
                attempts: vec!["video files are not supported".to_string()],
            }),
        }
    }

    async fn extract_url(
        &self,
        input: &ImportInput,
        detection: &DetectionResult,
    ) -> Result<ExtractionResult, ImportError> {
        let raw = match (&detection.metadata.url, input) {
            (Some(url), _) => url.as_str(),
            (None, ImportInput::Text(text)) => text.trim(),
            (None, ImportInput::File(_)) => {
                return Err(ImportError::InvalidInput(
                    "URL detection without a URL".to_string(),
                ))
            }
        };
        let url = parse_web_url(raw)
            .map(|u| normalize_url(&u))
            .ok_or_else(|| ImportError::InvalidInput(format!("not a web URL: {}", raw)))?;
        let platform = detection.metadata.platform.unwrap_or(Platform::Generic);

        self.run_chain(url, platform).await
    }

    async fn run_chain(&self, url: Url, platform: Platform) -> Result<ExtractionResult, ImportError> {
        let mut ctx = ExtractionContext::new(url, platform, self.fetcher.clone());
        let mut methods = Vec::new();
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            let outcome = match tokio::time::timeout(self.attempt_timeout, strategy.attempt(&mut ctx))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(StrategyError::Timeout(self.attempt_timeout.as_secs())),
            };

            match outcome {
                Err(StrategyError::NotApplicable) => {
                    debug!("Skipping {} for {}", name, ctx.url);
                }
                Ok(output) if !output.text.trim().is_empty() => {
                    methods.push(name.to_string());
                    info!("Extracted {} using {}", ctx.url, name);
                    return Ok(ExtractionResult {
                        raw_text: output.text.trim().to_string(),
                        metadata: ExtractionMetadata {
                            extraction_methods: methods,
                            confidence: output.confidence,
                            platform: Some(platform),
                            creator: output.creator,
                            title: output.title,
                            image: output.image,
                            nutrition: output.nutrition,
                            source: ctx.url.to_string(),
                        },
                        fallback_used: output.fallback_used,
                    });
                }
                Ok(_) => {
                    methods.push(name.to_string());
                    warn!("{} returned empty text for {}", name, ctx.url);
                    attempts.push(format!("{}: empty text", name));
                }
                Err(e) => {
                    methods.push(name.to_string());
                    warn!("{} failed for {}: {}", name, ctx.url, e);
                    attempts.push(format!("{}: {}", name, e));
                }
            }
        }

        Err(ImportError::ExtractionFailed {
            input: ctx.url.to_string(),
            attempts,
        })
    }

    async fn extract_image(&self, input: &ImportInput) -> Result<ExtractionResult, ImportError> {
        let file = match input {
            ImportInput::File(file) => file,
            ImportInput::Text(_) => {
                return Err(ImportError::InvalidInput(
                    "image detection without file data".to_string(),
                ))
            }
        };

        let ocr = self.ocr.recognize(&file.data, &self.ocr_options).await?;
        Ok(ExtractionResult {
            raw_text: ocr.text,
            metadata: ExtractionMetadata {
                extraction_methods: vec![METHOD_IMAGE_OCR.to_string()],
                confidence: ocr.confidence,
                source: source_name(input, "image"),
                ..Default::default()
            },
            fallback_used: false,
        })
    }
}

fn extract_text(
    input: &ImportInput,
    detection: &DetectionResult,
) -> Result<ExtractionResult, ImportError> {
    let text = match input {
        ImportInput::Text(text) => text.trim().to_string(),
        ImportInput::File(file) => String::from_utf8_lossy(&file.data).trim().to_string(),
    };
    if text.is_empty() {
        return Err(ImportError::ExtractionFailed {
            input: source_name(input, "text"),
            attempts: vec![format!("{}: empty text", METHOD_PLAIN_TEXT)],
        });
    }

    Ok(ExtractionResult {
        raw_text: text,
        metadata: ExtractionMetadata {
            extraction_methods: vec![METHOD_PLAIN_TEXT.to_string()],
            confidence: detection.confidence,
            source: source_name(input, "text"),
            ..Default::default()
        },
        fallback_used: false,
    })
}

fn source_name(input: &ImportInput, fallback: &str) -> String {
    match input {
        ImportInput::File(file) => file.name.clone().unwrap_or_else(|| fallback.to_string()),
        ImportInput::Text(_) => fallback.to_string(),
    }
}
