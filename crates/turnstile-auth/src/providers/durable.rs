//! Durable session persistence layer

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    expiring::ExpiringLayer,
    session::{SessionLayer, StoreLayer},
};
use crate::{
    clock::Clock,
    session::{Session, SessionDurationPolicy, SessionStore},
    utils::token_fingerprint,
    AuthResult,
};

/// Expiring sessions kept in a durable store instead of process memory.
///
/// The durable store is the only copy, so sessions survive restarts and every
/// worker sharing the store sees the same set. Expiry is derived from the
/// `created_at` read back from that store.
pub struct DurableLayer {
    inner: ExpiringLayer<StoreLayer>,
}

impl DurableLayer {
    pub fn new(
        durable: Arc<dyn SessionStore>,
        policy: SessionDurationPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = StoreLayer::new(durable, clock);
        Self {
            inner: ExpiringLayer::over_store(store, policy),
        }
    }

    pub fn inner(&self) -> &ExpiringLayer<StoreLayer> {
        &self.inner
    }

    pub fn durable(&self) -> &Arc<dyn SessionStore> {
        self.inner.inner().store()
    }
}

#[async_trait]
impl SessionLayer for DurableLayer {
    async fn open(&self, user_id: &str) -> AuthResult<Session> {
        let session = self.inner.open(user_id).await?;
        tracing::debug!(
            backend = self.durable().backend_name(),
            token = token_fingerprint(&session.session_id),
            "session persisted"
        );
        Ok(session)
    }

    async fn lookup(&self, token: &str) -> AuthResult<Option<Session>> {
        self.inner.lookup(token).await
    }

    async fn close(&self, token: &str) -> AuthResult<bool> {
        self.inner.close(token).await
    }

    fn layer_name(&self) -> &str {
        "session_db_auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        providers::SessionAuth,
        session::MemorySessionStore,
        traits::{AuthStrategy, Identity, SessionStrategy},
        AuthError, RequestView,
    };
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Durable store whose reads and writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemorySessionStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn fail(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> AuthResult<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(AuthError::storage_error("connection reset"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn put(&self, token: &str, session: Session) -> AuthResult<()> {
            self.check()?;
            self.inner.put(token, session).await
        }

        async fn get(&self, token: &str) -> AuthResult<Option<Session>> {
            self.check()?;
            self.inner.get(token).await
        }

        async fn remove(&self, token: &str) -> AuthResult<bool> {
            self.check()?;
            self.inner.remove(token).await
        }

        fn backend_name(&self) -> &str {
            "flaky"
        }
    }

    struct Fixture {
        auth: SessionAuth<DurableLayer>,
        clock: ManualClock,
        durable: Arc<FlakyStore>,
    }

    fn fixture(ttl: u64) -> Fixture {
        let clock = ManualClock::default();
        let durable = Arc::new(FlakyStore::default());
        let layer = DurableLayer::new(
            durable.clone(),
            SessionDurationPolicy::new(ttl),
            Arc::new(clock.clone()),
        );
        Fixture {
            auth: SessionAuth::new(layer, "session_id"),
            clock,
            durable,
        }
    }

    #[tokio::test]
    async fn test_persist_and_destroy() {
        let fx = fixture(0);
        let token = fx.auth.create_session("u1").await.unwrap();

        let stored = fx.durable.get(&token).await.unwrap().unwrap();
        assert_eq!(stored.user_id, "u1");
        assert_eq!(stored.created_at, fx.clock.now());
        assert_eq!(fx.durable.inner.len(), 1);

        let request = RequestView::new("/").with_cookie("session_id", token.clone());
        assert_eq!(fx.auth.resolve_identity(&request).await, Identity::resolved("u1"));
        assert!(fx.auth.destroy_session(&request).await);
        assert!(fx.durable.get(&token).await.unwrap().is_none());
        assert!(!fx.auth.destroy_session(&request).await);
    }

    #[tokio::test]
    async fn test_workers_share_durable_sessions() {
        let clock = ManualClock::default();
        let durable: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let worker = |durable: Arc<dyn SessionStore>| {
            let policy = SessionDurationPolicy::never_expires();
            let layer = DurableLayer::new(durable, policy, Arc::new(clock.clone()));
            SessionAuth::new(layer, "session_id")
        };
        let first = worker(durable.clone());
        let second = worker(durable.clone());

        let token = first.create_session("u1").await.unwrap();
        assert_eq!(second.lookup(&token).await, Identity::resolved("u1"));

        assert!(second.destroy_token(&token).await);
        assert_eq!(first.lookup(&token).await, Identity::Anonymous);
        assert!(!first.destroy_token(&token).await);
    }

    #[tokio::test]
    async fn test_expiry_from_durable_created_at() {
        let fx = fixture(5);
        let token = fx.auth.create_session("u1").await.unwrap();

        fx.clock.advance(Duration::seconds(4));
        assert_eq!(fx.auth.lookup(&token).await, Identity::resolved("u1"));

        fx.clock.advance(Duration::seconds(2));
        assert_eq!(fx.auth.lookup(&token).await, Identity::Anonymous);
        assert!(fx.durable.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_anonymous() {
        let fx = fixture(0);
        let token = fx.auth.create_session("u1").await.unwrap();

        fx.durable.fail(true);
        assert_eq!(fx.auth.lookup(&token).await, Identity::Anonymous);
        assert!(!fx.auth.destroy_token(&token).await);

        fx.durable.fail(false);
        assert_eq!(fx.auth.lookup(&token).await, Identity::resolved("u1"));
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let fx = fixture(0);
        fx.durable.fail(true);

        let err = fx.auth.create_session("u1").await.unwrap_err();
        assert_eq!(err.error_code(), "SESSION_STORE_UNAVAILABLE");
        assert!(fx.durable.inner.is_empty());
        assert_eq!(fx.auth.strategy_name(), "session_db_auth");
    }
}
