use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error;

use crate::config::OcrConfig;
use crate::ocr::{OcrProvider, ProviderOutput};

/// Used when the response carries no page confidence
const DEFAULT_CONFIDENCE: f64 = 85.0;

pub struct GoogleVisionProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GoogleVisionProvider {
    pub fn new(config: &OcrConfig) -> Self {
        GoogleVisionProvider {
            client: Client::new(),
            api_key: config
                .google_api_key
                .clone()
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok()),
            endpoint: config.google_endpoint.trim_end_matches('/').to_string(),
        }
    }

    #[doc(hidden)]
    pub fn with_endpoint(api_key: &str, endpoint: &str) -> Self {
        GoogleVisionProvider {
            client: Client::new(),
            api_key: Some(api_key.to_string()),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

/// Vision language hints are BCP-47, tesseract codes are ISO 639-2
fn language_hint(language: &str) -> &str {
    match language {
        "eng" => "en",
        "deu" | "ger" => "de",
        "fra" | "fre" => "fr",
        "spa" => "es",
        "ita" => "it",
        "por" => "pt",
        "nld" | "dut" => "nl",
        "jpn" => "ja",
        "chi_sim" | "zho" => "zh",
        other => other,
    }
}

fn page_confidence(body: &Value) -> f64 {
    let pages = body["responses"][0]["fullTextAnnotation"]["pages"]
        .as_array()
        .map(|pages| {
            pages
                .iter()
                .filter_map(|p| p["confidence"].as_f64())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if pages.is_empty() {
        DEFAULT_CONFIDENCE
    } else {
        pages.iter().sum::<f64>() / pages.len() as f64 * 100.0
    }
}

#[async_trait]
impl OcrProvider for GoogleVisionProvider {
    fn name(&self) -> &str {
        "google_vision"
    }

    fn accuracy(&self) -> f64 {
        0.95
    }

    fn is_offline(&self) -> bool {
        false
    }

    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
    ) -> Result<ProviderOutput, Box<dyn Error + Send + Sync>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or("GOOGLE_API_KEY not found in config or environment")?;

        let request_body = json!({
            "requests": [{
                "image": {
                    "content": STANDARD.encode(image)
                },
                "features": [{
                    "type": "DOCUMENT_TEXT_DETECTION"
                }],
                "imageContext": {
                    "languageHints": [language_hint(language)]
                }
            }]
        });

        debug!("Sending OCR request to Google Vision API");

        let response = self
            .client
            .post(format!("{}/v1/images:annotate", self.endpoint))
            .query(&[("key", api_key)])
            .header("Accept-Encoding", "identity")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(format!("Google Vision API error ({}): {}", status, error_text).into());
        }

        let body: Value = response.json().await?;

        if let Some(message) = body["responses"][0]["error"]["message"].as_str() {
            return Err(format!("Google Vision API error: {}", message).into());
        }

        let text = body["responses"][0]["fullTextAnnotation"]["text"]
            .as_str()
            .ok_or("No text found in image")?
            .to_string();

        debug!("Extracted text from image: {} characters", text.len());

        Ok(ProviderOutput {
            text,
            confidence: page_confidence(&body),
        })
    }
}
