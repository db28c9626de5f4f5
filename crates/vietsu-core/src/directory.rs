//! Conversation directory — the sidebar's model.
//!
//! Owns the cached conversation list and the current selection. All
//! mutations go through the API first; local state follows the server.

use vietsu_types::conversation::{
    ConversationCreate, ConversationMessages, ConversationSummary, GreetingResponse,
};
use vietsu_types::{ClientError, Result};

use crate::api::ApiClient;

pub struct ConversationDirectory {
    api: ApiClient,
    conversations: Vec<ConversationSummary>,
    selected: Option<i64>,
}

impl ConversationDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            conversations: Vec::new(),
            selected: None,
        }
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ConversationSummary> {
        let id = self.selected?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Re-fetch the list. A selection pointing at a conversation that
    /// no longer exists is dropped.
    pub async fn refresh(&mut self) -> Result<()> {
        self.conversations = self.api.list_conversations().await?;
        if let Some(id) = self.selected {
            if !self.conversations.iter().any(|c| c.id == id) {
                self.selected = None;
            }
        }
        Ok(())
    }

    /// Create and select a new conversation. The persona id is checked
    /// here so an empty id never reaches the backend.
    pub async fn create(
        &mut self,
        agent_id: &str,
        hero_name: &str,
        topic: Option<String>,
    ) -> Result<ConversationSummary> {
        if agent_id.trim().is_empty() {
            return Err(ClientError::Validation(
                "Vui lòng chọn agent để tạo cuộc trò chuyện".to_string(),
            ));
        }
        let created = self
            .api
            .create_conversation(&ConversationCreate {
                agent_id: agent_id.to_string(),
                hero_name: hero_name.to_string(),
                topic,
            })
            .await?;
        self.selected = Some(created.id);
        self.conversations.insert(0, created.clone());
        Ok(created)
    }

    /// Select a conversation and load its history.
    pub async fn select(&mut self, id: i64) -> Result<ConversationMessages> {
        if !self.conversations.iter().any(|c| c.id == id) {
            return Err(ClientError::Validation(format!(
                "Unknown conversation: {}",
                id
            )));
        }
        let history = self.api.conversation_messages(id).await?;
        self.selected = Some(id);
        Ok(history)
    }

    /// Delete a conversation. Deleting the selected one clears the
    /// selection.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.api.delete_conversation(id).await?;
        self.conversations.retain(|c| c.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Greeting for a fresh conversation; never fails (falls back to a
    /// canned line).
    pub async fn greeting(&self, agent_id: &str, hero_name: &str) -> GreetingResponse {
        self.api.greeting(agent_id, hero_name).await
    }
}
