use serde::{Deserialize, Serialize};

use crate::citation::{ContextChunk, GraphLink};

/// Body of `POST /agents/chat`, the only endpoint answered as an event
/// stream instead of a JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct AgentChatRequest {
    pub agent_id: String,
    pub query: String,
    pub session_id: Option<i64>,
}

/// One decoded event from the answer stream.
///
/// The wire form is a `data: <json>` line with a `type` discriminant.
/// `metadata` carries extra fields (e.g. a session id echo) which are
/// ignored here.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Content {
        content: String,
    },
    Metadata {
        #[serde(default)]
        sources: Vec<ContextChunk>,
        #[serde(default)]
        graph_links: Vec<GraphLink>,
    },
    Error {
        message: String,
    },
}
