//! Cookie session authentication
//!
//! [`SessionAuth`] is the strategy the outside world sees. What it does with a
//! token is delegated to a [`SessionLayer`]; layers wrap one another to add
//! expiry ([`ExpiringLayer`](super::ExpiringLayer)) on top of [`StoreLayer`];
//! [`DurableLayer`](super::DurableLayer) is the same stack over a durable
//! store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    clock::{Clock, SystemClock},
    request::RequestView,
    session::{MemorySessionStore, Session, SessionStore},
    traits::{AuthStrategy, Identity, SessionStrategy},
    utils::{generate_session_token, token_fingerprint},
    AuthError, AuthResult,
};

/// One level of session behaviour
///
/// Errors returned here are store faults. [`SessionAuth`] decides whether
/// they reach the caller (writes) or fold into `Anonymous` (reads).
#[async_trait]
pub trait SessionLayer: Send + Sync {
    /// Create and persist a session for `user_id`
    async fn open(&self, user_id: &str) -> AuthResult<Session>;

    /// Fetch the live session for a token
    async fn lookup(&self, token: &str) -> AuthResult<Option<Session>>;

    /// Remove a session. True iff it existed.
    async fn close(&self, token: &str) -> AuthResult<bool>;

    /// Strategy name this layer stack is known by
    fn layer_name(&self) -> &str;
}

/// Base layer: random tokens, `created_at` stamping, one session store
#[derive(Clone)]
pub struct StoreLayer {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl StoreLayer {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Fresh in-memory store on the wall clock
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), Arc::new(SystemClock))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[async_trait]
impl SessionLayer for StoreLayer {
    async fn open(&self, user_id: &str) -> AuthResult<Session> {
        if user_id.is_empty() {
            return Err(AuthError::missing_field("user_id"));
        }

        let token = generate_session_token();
        let session = Session::new(token.clone(), user_id, self.clock.now());
        self.store.put(&token, session.clone()).await?;
        Ok(session)
    }

    async fn lookup(&self, token: &str) -> AuthResult<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.store.get(token).await
    }

    async fn close(&self, token: &str) -> AuthResult<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        self.store.remove(token).await
    }

    fn layer_name(&self) -> &str {
        "session_auth"
    }
}

/// Session strategy over a layer stack
pub struct SessionAuth<L> {
    layer: L,
    cookie_name: String,
}

impl<L: SessionLayer> SessionAuth<L> {
    pub fn new(layer: L, cookie_name: impl Into<String>) -> Self {
        Self {
            layer,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// The session token a request carries, if any
    pub fn session_cookie<'r>(&self, request: &'r RequestView) -> Option<&'r str> {
        request
            .cookie(&self.cookie_name)
            .filter(|token| !token.is_empty())
    }

    /// Resolve a bare token. Store faults resolve to `Anonymous`.
    pub async fn lookup(&self, token: &str) -> Identity {
        match self.layer.lookup(token).await {
            Ok(Some(session)) => Identity::Resolved(session.user_id),
            Ok(None) => Identity::Anonymous,
            Err(e) => {
                tracing::warn!(
                    strategy = self.layer.layer_name(),
                    token = token_fingerprint(token),
                    error = %e,
                    "session lookup failed, treating request as anonymous"
                );
                Identity::Anonymous
            }
        }
    }

    /// Remove the session for a bare token. Store faults count as not removed.
    pub async fn destroy_token(&self, token: &str) -> bool {
        match self.layer.close(token).await {
            Ok(removed) => {
                if removed {
                    tracing::info!(
                        strategy = self.layer.layer_name(),
                        token = token_fingerprint(token),
                        "session destroyed"
                    );
                }
                removed
            }
            Err(e) => {
                tracing::warn!(
                    strategy = self.layer.layer_name(),
                    token = token_fingerprint(token),
                    error = %e,
                    "session removal failed"
                );
                false
            }
        }
    }
}

impl SessionAuth<StoreLayer> {
    /// Never-expiring sessions in a fresh memory store
    pub fn in_memory(cookie_name: impl Into<String>) -> Self {
        Self::new(StoreLayer::in_memory(), cookie_name)
    }
}

#[async_trait]
impl<L: SessionLayer> AuthStrategy for SessionAuth<L> {
    async fn resolve_identity(&self, request: &RequestView) -> Identity {
        let Some(token) = self.session_cookie(request) else {
            tracing::debug!(cookie = %self.cookie_name, "no session cookie on request");
            return Identity::Anonymous;
        };
        self.lookup(token).await
    }

    fn strategy_name(&self) -> &str {
        self.layer.layer_name()
    }
}

#[async_trait]
impl<L: SessionLayer> SessionStrategy for SessionAuth<L> {
    async fn create_session(&self, user_id: &str) -> AuthResult<String> {
        let session = self.layer.open(user_id).await?;
        tracing::info!(
            strategy = self.layer.layer_name(),
            user_id = %session.user_id,
            token = token_fingerprint(&session.session_id),
            "session created"
        );
        Ok(session.session_id)
    }

    async fn destroy_session(&self, request: &RequestView) -> bool {
        match self.session_cookie(request) {
            Some(token) => self.destroy_token(token).await,
            None => false,
        }
    }

    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}
