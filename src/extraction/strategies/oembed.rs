use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::StrategyError;
use crate::extraction::{ExtractionContext, ExtractionStrategy, StrategyOutput};

const CONFIDENCE: f64 = 0.7;

/// Caption and author from a platform's oEmbed endpoint. Only applies to
/// platforms with a configured endpoint.
pub struct PlatformOembed {
    endpoints: HashMap<String, String>,
}

impl PlatformOembed {
    /// `endpoints` maps platform names (`tiktok`, `youtube`) to endpoint URLs
    pub fn new(endpoints: HashMap<String, String>) -> Self {
        Self { endpoints }
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ExtractionStrategy for PlatformOembed {
    fn name(&self) -> &'static str {
        "platform-oembed"
    }

    async fn attempt(&self, ctx: &mut ExtractionContext) -> Result<StrategyOutput, StrategyError> {
        let endpoint = self
            .endpoints
            .get(ctx.platform.as_str())
            .ok_or(StrategyError::NotApplicable)?;

        let request = Url::parse_with_params(
            endpoint,
            &[("url", ctx.url.as_str()), ("format", "json")],
        )
        .map_err(|e| StrategyError::Request(format!("bad oEmbed endpoint {}: {}", endpoint, e)))?;

        let body = ctx.fetcher.fetch_json(request.as_str()).await?;
        let caption = string_field(&body, "title")
            .ok_or_else(|| StrategyError::NoContent("oEmbed response has no caption".to_string()))?;

        Ok(StrategyOutput {
            title: caption.lines().next().map(|line| line.trim().to_string()),
            text: caption,
            confidence: CONFIDENCE,
            creator: string_field(&body, "author_name"),
            image: string_field(&body, "thumbnail_url"),
            ..Default::default()
        })
    }
}
