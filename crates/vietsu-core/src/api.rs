//! Typed API client over [`HttpPort`].
//!
//! Adds the standard headers to every request and handles the expired
//! access token dance: a 401 whose detail is `token_expired` triggers
//! one refresh and one retry. Concurrent requests that expire together
//! share a single refresh call via a `Shared` future.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde_json::json;

use vietsu_types::auth::{
    Credentials, LoginRequest, PasswordResetRequest, RefreshRequest, RegisterRequest,
    RegisterResponse, TokenResponse, TOKEN_EXPIRED_DETAIL,
};
use vietsu_types::config::ClientConfig;
use vietsu_types::content::{
    LibraryListResponse, LibraryTopicDetail, NotificationList, QuestListResponse,
    QuestProgressRequest, TimelineResponse, UserProfile,
};
use vietsu_types::conversation::{
    fallback_greeting, ConversationCreate, ConversationMessages, ConversationSummary,
    GreetingResponse,
};
use vietsu_types::{ClientError, Result};

use crate::ports::{HttpPort, HttpRequest, HttpResponse};
use crate::session::SessionStore;

/// Refresh outcomes must be `Clone` to fan out through `Shared`, so
/// the error side is flattened to its display string.
type RefreshFuture = Shared<LocalBoxFuture<'static, std::result::Result<(), String>>>;

struct ApiInner {
    http: Rc<dyn HttpPort>,
    session: SessionStore,
    config: ClientConfig,
    refresh_gate: RefCell<Option<RefreshFuture>>,
}

/// Shared API client — clone-cheap via Rc.
#[derive(Clone)]
pub struct ApiClient {
    inner: Rc<ApiInner>,
}

impl ApiClient {
    pub fn new(http: Rc<dyn HttpPort>, session: SessionStore, config: ClientConfig) -> Self {
        Self {
            inner: Rc::new(ApiInner {
                http,
                session,
                config,
                refresh_gate: RefCell::new(None),
            }),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn with_standard_headers(&self, req: HttpRequest) -> HttpRequest {
        let mut req = req
            .header("X-Client-Version", &self.inner.config.client_version)
            .header("Content-Language", &self.inner.config.language);
        if let Some(token) = self.inner.session.access_token() {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    /// Send a request, refreshing the access token once if it expired.
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let resp = self.inner.http.send(self.with_standard_headers(req.clone())).await?;
        if resp.is_ok() {
            return Ok(resp);
        }

        let detail = resp.error_detail();
        let expired = resp.status == 401 && detail == TOKEN_EXPIRED_DETAIL;
        if !expired || self.inner.session.refresh_token().is_none() {
            return Err(ClientError::Api {
                status: resp.status,
                detail,
            });
        }

        // Refresh failure already cleared the session; surface the
        // original 401 so callers see why the request died.
        if let Err(e) = self.refresh_access_token().await {
            log::warn!("Token refresh failed: {}", e);
            return Err(ClientError::Api {
                status: resp.status,
                detail,
            });
        }

        let retry = self.inner.http.send(self.with_standard_headers(req)).await?;
        if retry.is_ok() {
            Ok(retry)
        } else {
            Err(ClientError::Api {
                status: retry.status,
                detail: retry.error_detail(),
            })
        }
    }

    /// Run (or join) the single in-flight refresh.
    async fn refresh_access_token(&self) -> Result<()> {
        let shared = {
            let mut gate = self.inner.refresh_gate.borrow_mut();
            match gate.as_ref() {
                Some(f) => f.clone(),
                None => {
                    let inner = self.inner.clone();
                    let fut = async move {
                        let result = do_refresh(&inner).await;
                        inner.refresh_gate.replace(None);
                        if let Err(ref e) = result {
                            inner.session.clear().await;
                            return Err(e.to_string());
                        }
                        Ok(())
                    }
                    .boxed_local()
                    .shared();
                    *gate = Some(fut.clone());
                    fut
                }
            }
        };
        shared.await.map_err(ClientError::Auth)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(HttpRequest::get(path)).await?.json()
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.request(HttpRequest::post(path, body)).await?.json()
    }

    // ─── Auth ────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let resp: TokenResponse = self.post_json("/auth/login", body).await?;
        self.inner
            .session
            .set_session(resp.credentials(), resp.user.clone())
            .await?;
        Ok(resp)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse> {
        let body = serde_json::to_value(req)?;
        self.post_json("/auth/register", body).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let body = serde_json::to_value(PasswordResetRequest {
            email: email.to_string(),
        })?;
        self.request(HttpRequest::post("/auth/password/reset/request", body))
            .await?;
        Ok(())
    }

    /// Server-side logout is best-effort; the local session is cleared
    /// either way.
    pub async fn logout(&self) {
        let result = self
            .request(HttpRequest::post("/auth/logout", json!({})))
            .await;
        if let Err(e) = result {
            log::debug!("Logout request failed: {}", e);
        }
        self.inner.session.clear().await;
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.get_json("/users/me").await
    }

    // ─── Conversations ───────────────────────────────────────

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.get_json("/conversations").await
    }

    pub async fn create_conversation(
        &self,
        req: &ConversationCreate,
    ) -> Result<ConversationSummary> {
        let body = serde_json::to_value(req)?;
        self.post_json("/conversations", body).await
    }

    pub async fn conversation_messages(&self, id: i64) -> Result<ConversationMessages> {
        self.get_json(&format!("/conversations/{}/messages", id))
            .await
    }

    pub async fn delete_conversation(&self, id: i64) -> Result<()> {
        self.request(HttpRequest::delete(format!("/conversations/{}", id)))
            .await?;
        Ok(())
    }

    /// Persona greeting. Falls back to a canned line when the endpoint
    /// is unreachable so a fresh conversation never opens empty.
    pub async fn greeting(&self, agent_id: &str, hero_name: &str) -> GreetingResponse {
        let body = json!({ "agent_id": agent_id, "hero_name": hero_name });
        match self.post_json::<GreetingResponse>("/agents/suggestions", body).await {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("Greeting request failed, using fallback: {}", e);
                GreetingResponse {
                    greeting: fallback_greeting(hero_name),
                    suggestions: Vec::new(),
                }
            }
        }
    }

    // ─── Content ─────────────────────────────────────────────

    pub async fn timeline(&self) -> Result<TimelineResponse> {
        self.get_json("/timeline").await
    }

    pub async fn library_topics(&self) -> Result<LibraryListResponse> {
        self.get_json("/library/topics").await
    }

    pub async fn library_topic(&self, id: i64) -> Result<LibraryTopicDetail> {
        self.get_json(&format!("/library/topics/{}", id)).await
    }

    pub async fn notifications(&self) -> Result<NotificationList> {
        self.get_json("/notifications").await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
        self.request(HttpRequest::post(
            &format!("/notifications/{}/read", id),
            json!({}),
        ))
        .await?;
        Ok(())
    }

    pub async fn quests(&self) -> Result<QuestListResponse> {
        self.get_json("/quests").await
    }

    pub async fn quest_progress(&self, id: i64, req: &QuestProgressRequest) -> Result<()> {
        let body = serde_json::to_value(req)?;
        self.request(HttpRequest::post(&format!("/quests/{}/progress", id), body))
            .await?;
        Ok(())
    }
}

/// The refresh call itself. Sent without the bearer header; the body
/// carries the refresh token.
async fn do_refresh(inner: &Rc<ApiInner>) -> Result<()> {
    let refresh_token = inner
        .session
        .refresh_token()
        .ok_or_else(|| ClientError::Auth("No refresh token".to_string()))?;

    let body = serde_json::to_value(RefreshRequest { refresh_token })?;
    let req = HttpRequest::post("/auth/token/refresh", body)
        .header("X-Client-Version", &inner.config.client_version)
        .header("Content-Language", &inner.config.language);

    let resp = inner.http.send(req).await?;
    if !resp.is_ok() {
        return Err(ClientError::Api {
            status: resp.status,
            detail: resp.error_detail(),
        });
    }

    let tokens: TokenResponse = resp.json()?;
    let credentials = Credentials {
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
    };
    inner.session.set_tokens(credentials).await?;
    inner.session.set_user(tokens.user);
    log::info!("Access token refreshed");
    Ok(())
}
