use async_trait::async_trait;

use crate::error::StrategyError;
use crate::extraction::{ExtractionContext, ExtractionStrategy, StrategyOutput};

const CONFIDENCE: f64 = 0.6;

/// Last resort: ask an external reader service for the page as plain text.
///
/// The normalized page URL is appended verbatim to the configured base, the
/// way `https://r.jina.ai/` expects it.
pub struct ReaderProxy {
    base_url: String,
}

impl ReaderProxy {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ExtractionStrategy for ReaderProxy {
    fn name(&self) -> &'static str {
        "reader-proxy"
    }

    async fn attempt(&self, ctx: &mut ExtractionContext) -> Result<StrategyOutput, StrategyError> {
        if self.base_url.is_empty() {
            return Err(StrategyError::NotApplicable);
        }

        let target = format!("{}{}", self.base_url, ctx.url);
        let text = ctx.fetcher.fetch_text(&target).await?;
        if text.trim().is_empty() {
            return Err(StrategyError::NoContent(
                "reader proxy returned an empty body".to_string(),
            ));
        }

        Ok(StrategyOutput {
            text,
            confidence: CONFIDENCE,
            fallback_used: true,
            ..Default::default()
        })
    }
}
