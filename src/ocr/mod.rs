//! Image to text.
//!
//! [`OcrEngine`] preprocesses the image, tries each registered
//! [`OcrProvider`] in order until one returns text, and cleans that text
//! up before handing it back.

pub mod postprocess;
pub mod preprocess;
pub mod providers;
pub mod validate;

use async_trait::async_trait;
use log::{debug, info, warn};
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::OcrConfig;
use crate::error::ImportError;
use crate::model::{OcrMetadata, OcrResult};

pub use postprocess::clean_text;
pub use preprocess::{preprocess, PreprocessOptions, PreprocessOutcome};
pub use providers::{GoogleVisionProvider, TesseractProvider};
pub use validate::{validate, OcrValidation};

/// What a provider hands back, confidence on a 0-100 scale
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub text: String,
    pub confidence: f64,
}

#[async_trait]
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Expected accuracy in `[0, 1]`, used for ordering
    fn accuracy(&self) -> f64;

    fn is_offline(&self) -> bool;

    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
    ) -> Result<ProviderOutput, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderChoice {
    #[default]
    Auto,
    Named(String),
}

impl From<&str> for ProviderChoice {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("auto") || value.is_empty() {
            ProviderChoice::Auto
        } else {
            ProviderChoice::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrOptions {
    pub language: String,
    pub preprocess: PreprocessOptions,
    pub provider: ProviderChoice,
    pub allow_fallback_providers: bool,
    pub attempt_timeout: Option<Duration>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        OcrOptions {
            language: "eng".to_string(),
            preprocess: PreprocessOptions::all(),
            provider: ProviderChoice::Auto,
            allow_fallback_providers: true,
            attempt_timeout: None,
        }
    }
}

impl OcrOptions {
    pub fn from_config(config: &OcrConfig) -> Self {
        OcrOptions {
            language: config.language.clone(),
            preprocess: if config.preprocess {
                PreprocessOptions::all()
            } else {
                PreprocessOptions::none()
            },
            provider: ProviderChoice::from(config.provider.as_str()),
            allow_fallback_providers: config.allow_fallback_providers,
            attempt_timeout: Some(Duration::from_secs(config.attempt_timeout)),
        }
    }
}

#[derive(Clone, Default)]
pub struct OcrEngine {
    providers: Vec<Arc<dyn OcrProvider>>,
}

impl OcrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn OcrProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Tesseract is always registered. Google Vision only when a key is
    /// available.
    pub fn from_config(config: &OcrConfig) -> Self {
        let mut engine = OcrEngine::new();
        let google = GoogleVisionProvider::new(config);
        if config.google_api_key.is_some() || std::env::var("GOOGLE_API_KEY").is_ok() {
            engine = engine.with_provider(Arc::new(google));
        } else {
            debug!("No Google Vision key configured, skipping provider");
        }
        engine.with_provider(Arc::new(TesseractProvider::new(config)))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Providers in the order they will be tried
    fn attempt_order(&self, options: &OcrOptions) -> Vec<Arc<dyn OcrProvider>> {
        let mut by_accuracy = self.providers.clone();
        by_accuracy.sort_by(|a, b| b.accuracy().total_cmp(&a.accuracy()));

        let mut order: Vec<Arc<dyn OcrProvider>> = match &options.provider {
            ProviderChoice::Auto => by_accuracy.clone(),
            ProviderChoice::Named(name) => {
                let mut order: Vec<_> = by_accuracy
                    .iter()
                    .filter(|p| p.name() == name)
                    .cloned()
                    .collect();
                if order.is_empty() {
                    warn!("OCR provider '{}' is not registered", name);
                }
                if options.allow_fallback_providers {
                    order.extend(by_accuracy.iter().filter(|p| p.name() != name).cloned());
                }
                order
            }
        };

        if let Some(offline) = by_accuracy.iter().find(|p| p.is_offline()) {
            if !order.iter().any(|p| p.name() == offline.name()) {
                order.push(offline.clone());
            }
        }
        order
    }

    pub async fn recognize(
        &self,
        image_data: &[u8],
        options: &OcrOptions,
    ) -> Result<OcrResult, ImportError> {
        let started = Instant::now();

        let (image, applied, image_size) = if options.preprocess.any() {
            match preprocess(image_data, &options.preprocess) {
                Ok(outcome) => (outcome.data, outcome.applied, outcome.original_size),
                Err(e) => {
                    warn!("Image preprocessing skipped: {}", e);
                    (
                        image_data.to_vec(),
                        Vec::new(),
                        preprocess::image_size(image_data).unwrap_or_default(),
                    )
                }
            }
        } else {
            (
                image_data.to_vec(),
                Vec::new(),
                preprocess::image_size(image_data).unwrap_or_default(),
            )
        };

        let mut attempts = Vec::new();

        for provider in self.attempt_order(options) {
            debug!("Trying OCR provider {}", provider.name());
            let attempt = provider.recognize(&image, &options.language);
            let outcome = match options.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(format!("timed out after {}s", limit.as_secs()).into()),
                },
                None => attempt.await,
            };

            match outcome {
                Ok(output) => {
                    let text = clean_text(&output.text);
                    if text.is_empty() {
                        warn!("OCR provider {} returned no text", provider.name());
                        attempts.push(format!("{}: no text detected", provider.name()));
                        continue;
                    }
                    info!(
                        "OCR succeeded using {} ({} characters)",
                        provider.name(),
                        text.len()
                    );
                    return Ok(OcrResult {
                        text,
                        confidence: (output.confidence / 100.0).clamp(0.0, 1.0),
                        metadata: OcrMetadata {
                            provider: provider.name().to_string(),
                            processing_time_ms: started.elapsed().as_millis() as u64,
                            image_size,
                            preprocessing_applied: applied,
                            language: options.language.clone(),
                        },
                    });
                }
                Err(e) => {
                    warn!("OCR provider {} failed: {}", provider.name(), e);
                    attempts.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        if attempts.is_empty() {
            attempts.push("no OCR providers registered".to_string());
        }
        Err(ImportError::OcrFailed { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockOcr {
        name: &'static str,
        accuracy: f64,
        offline: bool,
        reply: Result<(&'static str, f64), &'static str>,
        delay: Option<Duration>,
        calls: Arc<AtomicU32>,
    }

    impl MockOcr {
        fn ok(name: &'static str, accuracy: f64, text: &'static str, conf: f64) -> Self {
            MockOcr {
                name,
                accuracy,
                offline: false,
                reply: Ok((text, conf)),
                delay: None,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(name: &'static str, accuracy: f64) -> Self {
            MockOcr {
                reply: Err("service unavailable"),
                ..Self::ok(name, accuracy, "", 0.0)
            }
        }
    }

    #[async_trait]
    impl OcrProvider for MockOcr {
        fn name(&self) -> &str {
            self.name
        }

        fn accuracy(&self) -> f64 {
            self.accuracy
        }

        fn is_offline(&self) -> bool {
            self.offline
        }

        async fn recognize(
            &self,
            _image: &[u8],
            _language: &str,
        ) -> Result<ProviderOutput, Box<dyn Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.reply {
                Ok((text, confidence)) => Ok(ProviderOutput {
                    text: text.to_string(),
                    confidence,
                }),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn no_preprocess() -> OcrOptions {
        OcrOptions {
            preprocess: PreprocessOptions::none(),
            ..OcrOptions::default()
        }
    }

    #[tokio::test]
    async fn test_highest_accuracy_first() {
        let engine = OcrEngine::new()
            .with_provider(Arc::new(MockOcr::ok("low", 0.5, "from low", 50.0)))
            .with_provider(Arc::new(MockOcr::ok("high", 0.9, "2 cups f|our", 92.0)));

        let result = engine.recognize(b"bytes", &no_preprocess()).await.unwrap();
        assert_eq!(result.metadata.provider, "high");
        assert_eq!(result.text, "2 cups flour");
        assert!((result.confidence - 0.92).abs() < 1e-9);
        assert!(result.metadata.preprocessing_applied.is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_and_reports_attempts() {
        let engine = OcrEngine::new()
            .with_provider(Arc::new(MockOcr::failing("cloud", 0.95)))
            .with_provider(Arc::new(MockOcr {
                offline: true,
                ..MockOcr::ok("local", 0.7, "1 tsp salt", 70.0)
            }));

        let result = engine.recognize(b"bytes", &no_preprocess()).await.unwrap();
        assert_eq!(result.metadata.provider, "local");
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_named_without_fallback_still_tries_offline() {
        let spare = MockOcr::ok("spare", 0.8, "unused", 80.0);
        let spare_calls = spare.calls.clone();
        let engine = OcrEngine::new()
            .with_provider(Arc::new(MockOcr::failing("chosen", 0.6)))
            .with_provider(Arc::new(spare))
            .with_provider(Arc::new(MockOcr {
                offline: true,
                ..MockOcr::ok("local", 0.5, "local text", 60.0)
            }));

        let options = OcrOptions {
            provider: ProviderChoice::Named("chosen".to_string()),
            allow_fallback_providers: false,
            ..no_preprocess()
        };
        let result = engine.recognize(b"bytes", &options).await.unwrap();
        assert_eq!(result.metadata.provider, "local");
        assert_eq!(spare_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_text_and_timeouts_fail() {
        let engine = OcrEngine::new()
            .with_provider(Arc::new(MockOcr::ok("blank", 0.9, "  \n ", 99.0)))
            .with_provider(Arc::new(MockOcr {
                delay: Some(Duration::from_secs(5)),
                ..MockOcr::ok("slow", 0.8, "late", 90.0)
            }));

        let options = OcrOptions {
            attempt_timeout: Some(Duration::from_millis(20)),
            ..no_preprocess()
        };
        match engine.recognize(b"bytes", &options).await {
            Err(ImportError::OcrFailed { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].starts_with("blank: no text"));
                assert!(attempts[1].starts_with("slow: timed out"));
            }
            other => panic!("expected OcrFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_image_skips_preprocessing() {
        let engine =
            OcrEngine::new().with_provider(Arc::new(MockOcr::ok("only", 0.9, "text", 80.0)));
        let result = engine
            .recognize(b"not an image", &OcrOptions::default())
            .await
            .unwrap();
        assert!(result.metadata.preprocessing_applied.is_empty());
        assert_eq!(result.metadata.image_size.width, 0);
    }

    #[test]
    fn test_provider_choice_from_str() {
        assert_eq!(ProviderChoice::from("auto"), ProviderChoice::Auto);
        assert_eq!(
            ProviderChoice::from("tesseract"),
            ProviderChoice::Named("tesseract".to_string())
        );
    }

    #[test]
    fn test_from_config_always_has_tesseract() {
        let engine = OcrEngine::from_config(&OcrConfig::default());
        assert!(engine.provider_names().contains(&"tesseract"));
    }
}
