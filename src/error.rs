use thiserror::Error;

/// Errors produced while building environments, parsing model output, or talking to a chat API
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown environment id: {0}")]
    UnknownEnv(String),

    #[error("unknown verb in task description: {0}")]
    UnknownVerb(String),

    #[error("unknown object in task description: {0}")]
    UnknownObject(String),

    #[error("invalid object description: {0}")]
    InvalidObjectDescription(String),

    #[error("invalid text grid: {0}")]
    InvalidTextGrid(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("could not place {0} on the grid")]
    Placement(String),

    #[error("chat completion request failed: {0}")]
    Request(String),

    #[error("chat completion returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat completion returned no choices")]
    NoChoices,

    #[error("environment variable {0} holding the API key is not set")]
    MissingApiKey(String),

    #[error("a chat completer is required for {0}")]
    CompleterRequired(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid decomposition: {0}")]
    InvalidDecomposition(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "openai")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
