use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Server-side summary of a conversation, as listed in the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub agent_id: String,
    pub hero_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// RFC 3339 timestamps as sent by the backend.
    pub created_at: String,
    pub last_message_at: String,
    #[serde(default)]
    pub message_count: u32,
}

impl ConversationSummary {
    pub fn last_message_date(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.last_message_at).ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationCreate {
    pub agent_id: String,
    pub hero_name: String,
    pub topic: Option<String>,
}

/// A message as persisted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

impl From<StoredMessage> for Message {
    fn from(m: StoredMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
            streaming: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessages {
    pub conversation: ConversationSummary,
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreetingResponse {
    pub greeting: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Greeting shown when `/agents/suggestions` is unreachable.
pub fn fallback_greeting(hero_name: &str) -> String {
    if hero_name.is_empty() {
        "Chào con, ta là cố vấn lịch sử. Con đang tò mò điều gì?".to_string()
    } else {
        format!(
            "Chào con, ta là {}. Con muốn hỏi điều chi về thời kỳ của ta?",
            hero_name
        )
    }
}
