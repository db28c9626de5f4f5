use serde::{Deserialize, Serialize};

/// Client configuration. Everything the browser build needs to talk to
/// one backend deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base: String,
    /// Sent as `X-Client-Version` on every request.
    pub client_version: String,
    /// Sent as `Content-Language` on every request.
    pub language: String,
    /// Abort a streaming answer when no chunk arrives for this long.
    pub stream_idle_timeout_ms: u32,
    /// Pause between freezing an answer and revealing its citations,
    /// so the "extracting citations" state is observable.
    pub citation_reveal_delay_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api/v1".to_string(),
            client_version: "dev".to_string(),
            language: "vi-VN".to_string(),
            stream_idle_timeout_ms: 30_000,
            citation_reveal_delay_ms: 500,
        }
    }
}

/// Agent id of the general history advisor, used when the user starts a
/// conversation without picking a figure from the timeline.
pub const ADVISOR_AGENT_ID: &str = "agent_general_search";

/// Display name shown for the advisor persona.
pub const ADVISOR_HERO_NAME: &str = "Cố vấn lịch sử";
