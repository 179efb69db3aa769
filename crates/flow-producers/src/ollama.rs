//! Ollama-backed content producer
//!
//! Sends each generation request to an Ollama server's `/api/generate`
//! endpoint as a single non-streaming completion.

use std::time::Duration;

use async_trait::async_trait;
use flow_engine::{ContentProducer, GenerationRequest, ProducerError};
use serde::{Deserialize, Serialize};

use crate::prompt::render_prompt;

pub mod defaults {
    pub const BASE_URL: &str = "http://localhost:11434";
    pub const MODEL: &str = "llama3.2";
    pub const TIMEOUT_SECS: u64 = 120;
}

/// Connection and sampling settings for an Ollama server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OllamaConfig {
    /// Base URL of the Ollama server (default: http://localhost:11434)
    pub base_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    /// Maximum tokens to generate (`num_predict`)
    pub max_tokens: Option<i64>,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            model: defaults::MODEL.to_string(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
}

/// Producer that asks a local Ollama model to write each node's output
#[derive(Debug, Clone)]
pub struct OllamaProducer {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProducer {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// JSON body for one generation request
    pub fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": render_prompt(request),
            "stream": false
        });

        if let Some(system) = &self.config.system_prompt {
            body["system"] = serde_json::json!(system);
        }

        let mut options = serde_json::Map::new();
        if let Some(temperature) = self.config.temperature {
            options.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(max) = self.config.max_tokens {
            options.insert("num_predict".to_string(), serde_json::json!(max));
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }
}

impl Default for OllamaProducer {
    fn default() -> Self {
        Self::new(OllamaConfig::default())
    }
}

#[async_trait]
impl ContentProducer for OllamaProducer {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProducerError> {
        let url = self.config.generate_url();
        log::debug!(
            "Sending '{}' request to {} with model '{}'",
            request.format_label,
            url,
            self.config.model
        );

        let http_response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                ProducerError::unavailable(format!(
                    "Failed to connect to Ollama server at {}: {}. Is Ollama running?",
                    self.config.base_url, e
                ))
            })?;

        if !http_response.status().is_success() {
            let status = http_response.status();
            let error_body = http_response.text().await.unwrap_or_default();
            return Err(ProducerError::rejected(format!(
                "Ollama API error ({}): {}",
                status, error_body
            )));
        }

        let data: OllamaResponse = http_response.json().await.map_err(|e| {
            ProducerError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        if data.response.trim().is_empty() {
            return Err(ProducerError::InvalidResponse(format!(
                "Model '{}' returned an empty response",
                data.model
            )));
        }

        log::debug!(
            "Completed '{}' with {} chars using model '{}'",
            request.format_label,
            data.response.len(),
            data.model
        );
        Ok(data.response)
    }
}
