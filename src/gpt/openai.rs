use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;

use crate::error::{Error, Result};

use super::chat_completer::{ChatRequest, ChatResponse, CompletionBackend};

/// Configuration for the [`OpenAiBackend`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::from("https://api.openai.com/v1"),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Chat completions over the OpenAI HTTP API
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::MissingApiKey(String::from("<api_key>")));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Read the API key from the environment variable `var`
    pub fn from_env(var: &str, base_url: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var(var).map_err(|_| Error::MissingApiKey(var.to_string()))?;
        Self::new(OpenAiConfig {
            api_key,
            base_url: base_url.into(),
            ..Default::default()
        })
    }
}

impl CompletionBackend for OpenAiBackend {
    fn create(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!("POST {url} (model {})", request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("chat completion failed with {status}");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        ChatResponse::from_json(&response.text()?)
    }
}
