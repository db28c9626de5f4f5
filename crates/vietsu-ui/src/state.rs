//! UI-level state that drives rendering.
//! This is a read-only projection of the chat runtime state,
//! updated each frame by draining the EventBus.

use vietsu_types::citation::{ContextChunk, GraphLink};
use vietsu_types::conversation::ConversationSummary;
use vietsu_types::event::ChatEvent;
use vietsu_types::message::Message;

/// Which top-level screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// State visible to UI panels
pub struct UiState {
    pub screen: Screen,
    /// Sidebar conversation list
    pub conversations: Vec<ConversationSummary>,
    pub selected_conversation: Option<i64>,
    /// Displayed transcript; the last entry streams while `busy`
    pub messages: Vec<Message>,
    /// Citation panel contents for the latest frozen answer
    pub sources: Vec<ContextChunk>,
    pub graph_links: Vec<GraphLink>,
    pub citations_loading: bool,
    /// A stream is in flight; input is disabled
    pub busy: bool,
    /// Transient error banner, cleared on the next send
    pub error_banner: Option<String>,
    /// Input field content
    pub input_text: String,
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            conversations: Vec::new(),
            selected_conversation: None,
            messages: Vec::new(),
            sources: Vec::new(),
            graph_links: Vec::new(),
            citations_loading: false,
            busy: false,
            error_banner: None,
            input_text: String::new(),
            status_text: "Sẵn sàng".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::ConversationsLoaded { conversations } => {
                    self.conversations = conversations;
                    if let Some(id) = self.selected_conversation {
                        if !self.conversations.iter().any(|c| c.id == id) {
                            self.selected_conversation = None;
                        }
                    }
                }
                ChatEvent::ConversationSelected { id, messages } => {
                    self.selected_conversation = Some(id);
                    self.messages = messages;
                    self.sources.clear();
                    self.graph_links.clear();
                    self.citations_loading = false;
                    self.error_banner = None;
                }
                ChatEvent::StreamStart => {
                    self.busy = true;
                    self.error_banner = None;
                    self.sources.clear();
                    self.graph_links.clear();
                    self.citations_loading = false;
                    self.messages.push(Message::streaming());
                    self.status_text = "Đang trả lời...".to_string();
                }
                ChatEvent::Delta { token } => {
                    if let Some(last) = self.messages.last_mut() {
                        last.content.push_str(&token);
                    }
                }
                ChatEvent::AnswerComplete { text } => {
                    if let Some(last) = self.messages.last_mut() {
                        last.content = text;
                        last.freeze();
                    }
                }
                ChatEvent::CitationsLoading => {
                    self.citations_loading = true;
                }
                ChatEvent::CitationsReady {
                    sources,
                    graph_links,
                } => {
                    self.sources = sources;
                    self.graph_links = graph_links;
                    self.citations_loading = false;
                }
                ChatEvent::StreamEnd => {
                    self.busy = false;
                    self.status_text = "Sẵn sàng".to_string();
                }
                ChatEvent::Error { message } => {
                    self.error_banner = Some(message.clone());
                    self.status_text = message;
                }
            }
        }
    }

    /// Add a user message to the display
    pub fn push_user_message(&mut self, text: &str) {
        self.messages.push(Message::user(text));
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_citations(&self) -> bool {
        !self.sources.is_empty() || !self.graph_links.is_empty()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
