//! Read-mostly content types: timeline, library, notifications, quests
//! and the profile page. All simple CRUD shapes mirroring the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineNode {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub year_range: String,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    pub agent_id: String,
    pub summary: String,
    pub color: String,
    #[serde(default)]
    pub notable_figures: Option<Vec<String>>,
    #[serde(default)]
    pub key_events: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineResponse {
    pub nodes: Vec<TimelineNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryTopic {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub period: String,
    pub topic_type: String,
    pub tags: Vec<String>,
    pub agent_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryTopicDetail {
    #[serde(flatten)]
    pub topic: LibraryTopic,
    pub markdown: String,
    pub documents: Vec<LibraryDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDocument {
    pub id: i64,
    pub source: String,
    pub period: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryListResponse {
    #[serde(default)]
    pub cursor: Option<String>,
    pub items: Vec<LibraryTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationList {
    pub items: Vec<NotificationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub reward_badge: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestListResponse {
    pub quests: Vec<Quest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestProgressRequest {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_minutes: u32,
    #[serde(default)]
    pub badges: u32,
    #[serde(default)]
    pub quests_completed: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: crate::auth::UserPublic,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub preferences: serde_json::Value,
}
