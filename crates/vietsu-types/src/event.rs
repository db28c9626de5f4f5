use serde::{Deserialize, Serialize};

use crate::citation::{ContextChunk, GraphLink};
use crate::conversation::ConversationSummary;
use crate::message::Message;

/// Events emitted by the chat runtime.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// The sidebar list changed (login, create, delete, post-send).
    ConversationsLoaded {
        conversations: Vec<ConversationSummary>,
    },

    /// A conversation was selected; `messages` replaces the transcript.
    ConversationSelected {
        id: i64,
        messages: Vec<Message>,
    },

    /// A question was submitted and an answer stream opened.
    /// Citation panels are cleared at this point.
    StreamStart,

    /// One answer fragment arrived.
    Delta { token: String },

    /// The answer text is complete and frozen.
    AnswerComplete { text: String },

    /// Citations are being extracted for the frozen answer.
    CitationsLoading,

    /// The citation/graph batch for the frozen answer.
    CitationsReady {
        sources: Vec<ContextChunk>,
        graph_links: Vec<GraphLink>,
    },

    /// The stream finished, normally or after an error.
    StreamEnd,

    /// An error occurred; `message` is user-visible text.
    Error { message: String },
}
