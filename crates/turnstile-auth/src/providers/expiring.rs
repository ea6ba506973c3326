//! Session expiry layer

use std::sync::Arc;

use async_trait::async_trait;

use super::session::{SessionLayer, StoreLayer};
use crate::{
    clock::Clock,
    session::{Session, SessionDurationPolicy},
    utils::token_fingerprint,
    AuthResult,
};

/// Applies a [`SessionDurationPolicy`] to the sessions of an inner layer.
///
/// Expired sessions read as absent and are evicted on the spot; a failed
/// eviction is only logged since the read outcome is already decided.
#[derive(Clone)]
pub struct ExpiringLayer<L> {
    inner: L,
    policy: SessionDurationPolicy,
    clock: Arc<dyn Clock>,
}

impl<L: SessionLayer> ExpiringLayer<L> {
    pub fn new(inner: L, policy: SessionDurationPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            policy,
            clock,
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn policy(&self) -> &SessionDurationPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether `session` has outlived the policy as of now
    pub fn is_expired(&self, session: &Session) -> bool {
        self.policy.is_expired(session, self.clock.now())
    }
}

impl ExpiringLayer<StoreLayer> {
    /// Expiry over a store layer, sharing that layer's clock
    pub fn over_store(inner: StoreLayer, policy: SessionDurationPolicy) -> Self {
        let clock = inner.clock().clone();
        Self::new(inner, policy, clock)
    }
}

#[async_trait]
impl<L: SessionLayer> SessionLayer for ExpiringLayer<L> {
    async fn open(&self, user_id: &str) -> AuthResult<Session> {
        self.inner.open(user_id).await
    }

    async fn lookup(&self, token: &str) -> AuthResult<Option<Session>> {
        let Some(session) = self.inner.lookup(token).await? else {
            return Ok(None);
        };

        if !self.is_expired(&session) {
            return Ok(Some(session));
        }

        tracing::debug!(token = token_fingerprint(token), "session expired");
        if let Err(e) = self.inner.close(token).await {
            tracing::debug!(
                token = token_fingerprint(token),
                error = %e,
                "could not evict expired session"
            );
        }
        Ok(None)
    }

    async fn close(&self, token: &str) -> AuthResult<bool> {
        self.inner.close(token).await
    }

    fn layer_name(&self) -> &str {
        "session_exp_auth"
    }
}
