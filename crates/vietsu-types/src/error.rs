use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("A request is already in flight")]
    Busy,

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}
