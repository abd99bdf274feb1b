use crate::config::AiConfig;
use crate::providers::{ChatMessage, CompletionProvider, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;

pub struct FallbackProvider {
    providers: Vec<Box<dyn CompletionProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Create a new fallback provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if !config.fallback.enabled {
            // If fallback is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(FallbackProvider {
                providers: vec![default_provider],
                retry_attempts: 1,
                retry_delay_ms: 0,
            });
        }

        let mut providers = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            if let Some(provider_config) = config.providers.get(provider_name) {
                if provider_config.enabled {
                    match ProviderFactory::create(provider_name, provider_config) {
                        Ok(provider) => {
                            info!("Added '{}' to fallback chain", provider_name);
                            providers.push(provider);
                        }
                        Err(e) => {
                            warn!("Failed to initialize provider '{}': {}", provider_name, e);
                        }
                    }
                }
            } else {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    provider_name
                );
            }
        }

        Self::from_providers(
            providers,
            config.fallback.retry_attempts,
            config.fallback.retry_delay_ms,
        )
    }

    /// Build a chain from already constructed providers
    pub fn from_providers(
        providers: Vec<Box<dyn CompletionProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if providers.is_empty() {
            return Err("No providers available in fallback configuration".into());
        }

        Ok(FallbackProvider {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        })
    }

    /// Try a provider with linear backoff between attempts
    async fn try_provider_with_retry(
        &self,
        provider: &dyn CompletionProvider,
        messages: &[ChatMessage],
    ) -> Result<String, String> {
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Attempting completion with {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            match provider.complete(messages).await {
                Ok(result) => {
                    info!("Completion succeeded using {}", provider.provider_name());
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry_attempts {
                let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl CompletionProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut all_errors: Vec<String> = Vec::new();

        for provider in &self.providers {
            match self
                .try_provider_with_retry(provider.as_ref(), messages)
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                }
            }
        }

        Err(format!("All providers failed:\n{}", all_errors.join("\n")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FallbackConfig, ProviderConfig};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        fail_times: u32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(
            &self,
            _messages: &[ChatMessage],
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_times {
                Err(format!("{} down", self.name).into())
            } else {
                Ok(format!("answer from {}", self.name))
            }
        }
    }

    fn provider_config(key: &str) -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: "test-model".to_string(),
            temperature: 0.2,
            max_tokens: 500,
            api_key: Some(key.to_string()),
            base_url: None,
        }
    }

    #[test]
    fn test_fallback_disabled_uses_default() {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), provider_config("k"));
        let config = AiConfig {
            default_provider: "openai".to_string(),
            providers,
            fallback: FallbackConfig::default(),
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 1);
        assert_eq!(fallback.retry_attempts, 1);
    }

    #[test]
    fn test_fallback_no_providers() {
        let config = AiConfig {
            default_provider: "openai".to_string(),
            providers: HashMap::new(),
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["openai".to_string()],
                retry_attempts: 3,
                retry_delay_ms: 100,
            },
        };

        let result = FallbackProvider::new(&config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("No providers available"));
        }
    }

    #[test]
    fn test_fallback_multiple_providers() {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), provider_config("k1"));
        providers.insert("anthropic".to_string(), provider_config("k2"));

        let config = AiConfig {
            default_provider: "openai".to_string(),
            providers,
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["openai".to_string(), "anthropic".to_string()],
                retry_attempts: 2,
                retry_delay_ms: 50,
            },
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 2);
    }

    #[tokio::test]
    async fn test_retries_then_moves_to_next_provider() {
        let first_calls = Arc::new(AtomicU32::new(0));
        let second_calls = Arc::new(AtomicU32::new(0));
        let chain = FallbackProvider::from_providers(
            vec![
                Box::new(Scripted {
                    name: "first",
                    fail_times: u32::MAX,
                    calls: first_calls.clone(),
                }),
                Box::new(Scripted {
                    name: "second",
                    fail_times: 1,
                    calls: second_calls.clone(),
                }),
            ],
            2,
            0,
        )
        .unwrap();

        let reply = chain.complete(&[ChatMessage::user("q")]).await.unwrap();
        assert_eq!(reply, "answer from second");
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
        assert_eq!(second_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let chain = FallbackProvider::from_providers(
            vec![Box::new(Scripted {
                name: "only",
                fail_times: u32::MAX,
                calls: Arc::new(AtomicU32::new(0)),
            })],
            1,
            0,
        )
        .unwrap();

        let err = chain.complete(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(err.to_string().contains("only: only down"));
    }
}
