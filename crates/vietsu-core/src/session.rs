//! Session store — the credential pair plus the signed-in user.
//!
//! Tokens are mirrored to storage so a reload stays signed in. The
//! in-memory copy is authoritative during a session; storage is only
//! read once at startup via [`SessionStore::load`].

use std::cell::RefCell;
use std::rc::Rc;

use vietsu_types::auth::{Credentials, UserPublic};
use vietsu_types::Result;

use crate::ports::StoragePort;

const ACCESS_TOKEN_KEY: &str = "auth:access_token";
const REFRESH_TOKEN_KEY: &str = "auth:refresh_token";

#[derive(Default)]
struct SessionInner {
    credentials: Option<Credentials>,
    user: Option<UserPublic>,
}

/// Shared session state — clone-cheap via Rc.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<RefCell<SessionInner>>,
    storage: Rc<dyn StoragePort>,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SessionInner::default())),
            storage,
        }
    }

    /// Restore tokens persisted by a previous session. The user record
    /// is not persisted; callers re-fetch it from `/users/me`.
    pub async fn load(&self) -> Result<bool> {
        let access = self.storage.get(ACCESS_TOKEN_KEY).await?;
        let refresh = self.storage.get(REFRESH_TOKEN_KEY).await?;
        if let (Some(access), Some(refresh)) = (access, refresh) {
            let credentials = Credentials {
                access_token: String::from_utf8_lossy(&access).into_owned(),
                refresh_token: String::from_utf8_lossy(&refresh).into_owned(),
            };
            self.inner.borrow_mut().credentials = Some(credentials);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Store a fresh token pair, persisting both keys.
    pub async fn set_tokens(&self, credentials: Credentials) -> Result<()> {
        self.storage
            .set(ACCESS_TOKEN_KEY, credentials.access_token.as_bytes())
            .await?;
        self.storage
            .set(REFRESH_TOKEN_KEY, credentials.refresh_token.as_bytes())
            .await?;
        self.inner.borrow_mut().credentials = Some(credentials);
        Ok(())
    }

    /// Full sign-in: tokens plus the user record.
    pub async fn set_session(&self, credentials: Credentials, user: UserPublic) -> Result<()> {
        self.set_tokens(credentials).await?;
        self.inner.borrow_mut().user = Some(user);
        Ok(())
    }

    pub fn set_user(&self, user: UserPublic) {
        self.inner.borrow_mut().user = Some(user);
    }

    /// Drop the session everywhere. Storage failures are logged, not
    /// propagated; the in-memory state is cleared regardless.
    pub async fn clear(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.credentials = None;
            inner.user = None;
        }
        if let Err(e) = self.storage.delete(ACCESS_TOKEN_KEY).await {
            log::warn!("Failed to clear access token: {}", e);
        }
        if let Err(e) = self.storage.delete(REFRESH_TOKEN_KEY).await {
            log::warn!("Failed to clear refresh token: {}", e);
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.refresh_token.clone())
    }

    pub fn user(&self) -> Option<UserPublic> {
        self.inner.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.borrow().credentials.is_some()
    }
}
