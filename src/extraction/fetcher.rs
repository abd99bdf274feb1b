use log::{debug, warn};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ExtractionConfig;
use crate::error::StrategyError;

/// Plain HTTP GET with a bounded number of retries on transient failures.
pub struct RequestFetcher {
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl RequestFetcher {
    pub fn new(config: &ExtractionConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn get(&self, url: &str) -> Result<Response, StrategyError> {
        let mut attempt = 0;
        loop {
            let err = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => StrategyError::Status(response.status().as_u16()),
                Err(e) => StrategyError::from(e),
            };
            if !err.is_transient() || attempt >= self.retry_attempts {
                return Err(err);
            }

            attempt += 1;
            let delay = self.retry_delay * attempt;
            warn!("GET {} failed ({}), retry {} in {:?}", url, err, attempt, delay);
            sleep(delay).await;
        }
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, StrategyError> {
        debug!("Fetching {}", url);
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }

    pub async fn fetch_json(&self, url: &str) -> Result<Value, StrategyError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| StrategyError::NoContent(format!("invalid JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(retry_attempts: u32) -> RequestFetcher {
        let config = ExtractionConfig {
            retry_attempts,
            retry_delay_ms: 1,
            ..ExtractionConfig::default()
        };
        RequestFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create();

        let body = fetcher(1)
            .fetch_text(&format!("{}/page", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
        mock.assert();
    }

    #[tokio::test]
    async fn test_server_error_is_retried_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(2)
            .create();

        let err = fetcher(1)
            .fetch_text(&format!("{}/flaky", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err, StrategyError::Status(503));
        mock.assert();
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create();

        let err = fetcher(3)
            .fetch_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err, StrategyError::Status(404));
        mock.assert();
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_html() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/oembed")
            .with_status(200)
            .with_body("<html></html>")
            .create();

        let err = fetcher(0)
            .fetch_json(&format!("{}/oembed", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::NoContent(_)));
    }
}
