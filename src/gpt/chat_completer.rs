use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    assert_interval,
    error::{Error, Result},
};

use super::message::Message;

/// Body of a chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub n: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// Decode a response body; extra fields are ignored
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Something that can answer chat completion requests
pub trait CompletionBackend {
    fn create(&self, request: &ChatRequest<'_>) -> Result<ChatResponse>;
}

/// Configuration for the [`ChatCompleter`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompleterConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub n: u32,
}

impl Default for ChatCompleterConfig {
    fn default() -> Self {
        Self {
            model: String::from("gpt-4"),
            temperature: 0.0,
            max_tokens: None,
            n: 1,
        }
    }
}

/// A chat session: accumulates history and asks the backend for the next reply
pub struct ChatCompleter {
    backend: Box<dyn CompletionBackend>,
    chat_history: Vec<Message>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    n: u32,
}

impl ChatCompleter {
    /// **Panics** if the temperature is not in `[0, 2]` or `n` is zero
    pub fn new(backend: impl CompletionBackend + 'static, config: ChatCompleterConfig) -> Self {
        assert_interval!(config.temperature, 0.0, 2.0);
        assert!(config.n > 0, "at least one completion must be requested");
        Self {
            backend: Box::new(backend),
            chat_history: Vec::new(),
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            n: config.n,
        }
    }

    pub fn chat_history(&self) -> &[Message] {
        &self.chat_history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn clear(&mut self) {
        self.chat_history.clear();
    }

    pub fn add_message(&mut self, message: Message) {
        self.chat_history.push(message);
    }

    /// Ask for a reply to the current history
    ///
    /// The reply is not added to the history.
    pub fn generate_chat_completion(&self) -> Result<Message> {
        let request = ChatRequest {
            model: &self.model,
            messages: &self.chat_history,
            n: self.n,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(
            "requesting completion from {} with {} messages",
            self.model,
            self.chat_history.len()
        );

        let response = self.backend.create(&request)?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(Error::NoChoices)
    }
}
