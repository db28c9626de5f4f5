//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `vietsu-core` (pure Rust).
//! Implementations live in `vietsu-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use vietsu_types::{stream::AgentChatRequest, ClientError, Result};

// ─── HTTP Port ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A request as the core sees it. `path` is relative to the configured
/// API base; headers are added by the client, not the adapter.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The backend reports errors as `{"detail": "..."}`. Fall back to
    /// the raw body when it does not.
    pub fn error_detail(&self) -> String {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(String::from)))
            .unwrap_or_else(|| self.body.clone())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(ClientError::from)
    }
}

/// Performs a single HTTP exchange. No retry or auth logic here; that
/// lives in [`crate::api::ApiClient`].
#[async_trait(?Send)]
pub trait HttpPort {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse>;
}

// ─── Chat Stream Port ────────────────────────────────────────

/// Raw bytes as delivered by the transport. Chunks carry no framing
/// guarantees; an SSE line may span several chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>>>>;

#[async_trait(?Send)]
pub trait ChatStreamPort {
    /// Open the streaming chat endpoint. Errors here mean the request
    /// never produced a response (network failure, non-2xx status).
    async fn open(&self, req: AgentChatRequest, bearer: Option<String>) -> Result<ByteStream>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Timer Port ──────────────────────────────────────────────

/// Wall-clock delays. Browser adapters wrap `setTimeout`; tests
/// resolve immediately.
#[async_trait(?Send)]
pub trait TimerPort {
    async fn sleep_ms(&self, ms: u32);
}
