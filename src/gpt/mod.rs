//! Chat completion client

pub mod chat_completer;
pub mod message;
#[cfg(feature = "openai")]
pub mod openai;

pub use chat_completer::{ChatCompleter, ChatCompleterConfig, CompletionBackend};
pub use message::{chatgpt_system_message, default_system_message, Message, Role};
#[cfg(feature = "openai")]
pub use openai::{OpenAiBackend, OpenAiConfig};
