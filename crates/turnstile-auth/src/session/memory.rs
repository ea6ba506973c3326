//! In-memory session store

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::{Session, SessionDurationPolicy, SessionStore};
use crate::clock::Clock;
use crate::AuthResult;

/// Process-local session map
///
/// Construct once and share through `Arc`. Each token lives in one shard of
/// the map, so writes and removals of a token are exclusive with reads of it.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every record matching `predicate`, returning how many went
    pub fn purge_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Session) -> bool,
    {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !predicate(session));
        before.saturating_sub(self.sessions.len())
    }

    /// Drop every record the policy considers expired right now
    pub fn purge_expired(&self, policy: &SessionDurationPolicy, clock: &dyn Clock) -> usize {
        if !policy.is_expiring() {
            return 0;
        }
        let now = clock.now();
        self.purge_where(|session| policy.is_expired(session, now))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, token: &str, session: Session) -> AuthResult<()> {
        self.sessions.insert(token.to_string(), session);
        Ok(())
    }

    async fn get(&self, token: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.get(token).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, token: &str) -> AuthResult<bool> {
        Ok(self.sessions.remove(token).is_some())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Periodically purge expired sessions from a memory store.
///
/// Lookups already ignore expired records, this only reclaims memory. Abort
/// the returned handle to stop the task.
pub fn spawn_session_sweeper(
    store: Arc<MemorySessionStore>,
    policy: SessionDurationPolicy,
    clock: Arc<dyn Clock>,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = store.purge_expired(&policy, clock.as_ref());
            if removed > 0 {
                tracing::debug!(removed, remaining = store.len(), "purged expired sessions");
            }
        }
    })
}
