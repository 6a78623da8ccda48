//! Ollama generation client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{GenerateOptions, GenerationClient};
use super::error::GenerationError;
use crate::config::ReasoningConfig;

/// Client for Ollama's generate endpoint
///
/// One request per generation, no streaming; the per-request timeout comes
/// from [`GenerateOptions`] because the retry path uses a shorter one than
/// the primary call.
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: Client,
}

impl OllamaClient {
    /// Create a client from configuration
    pub fn from_config(config: &ReasoningConfig) -> Result<Self, GenerationError> {
        // No client-wide timeout; each request carries its own.
        let http = Client::builder().build().map_err(GenerationError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": options.temperature,
                "top_p": options.top_p,
            },
        });

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            timeout_secs = options.timeout.as_secs(),
            "generate: sending request"
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify(e, options))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            debug!(status, "generate: API error");
            return Err(GenerationError::Api { status, message });
        }

        let text = response.text().await.map_err(|e| classify(e, options))?;
        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        debug!(response_len = parsed.response.len(), "generate: success");
        Ok(parsed.response)
    }
}

fn classify(error: reqwest::Error, options: &GenerateOptions) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout(options.timeout)
    } else if error.is_connect() {
        GenerationError::Connect
    } else {
        GenerationError::Network(error)
    }
}
