use serde::{Deserialize, Serialize};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// A single message as displayed in a conversation.
///
/// `streaming` is client-side only: true while the assistant's answer is
/// still being assembled from stream fragments, false once frozen. The
/// server never sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub streaming: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            streaming: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            streaming: false,
        }
    }

    /// Empty assistant message awaiting stream fragments.
    pub fn streaming() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            streaming: true,
        }
    }

    /// Stop accepting fragments; the text is final from here on.
    pub fn freeze(&mut self) {
        self.streaming = false;
    }
}
