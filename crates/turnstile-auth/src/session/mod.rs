//! Session records and the stores that hold them
//!
//! A store is a plain token → record map. Expiry is not a stored state: it is
//! computed at read time from `created_at` and a [`SessionDurationPolicy`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthResult;

pub mod file;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::FileSessionStore;
pub use memory::{spawn_session_sweeper, MemorySessionStore};
#[cfg(feature = "postgres")]
pub use postgres::PgSessionStore;

/// Server-side session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            created_at,
        }
    }
}

/// How long a session stays valid after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionDurationPolicy {
    /// Lifetime in seconds, 0 never expires
    pub ttl_seconds: u64,
}

impl SessionDurationPolicy {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    pub fn never_expires() -> Self {
        Self { ttl_seconds: 0 }
    }

    pub fn is_expiring(&self) -> bool {
        self.ttl_seconds > 0
    }

    /// Last instant at which a session created at `created_at` is valid.
    /// `None` when sessions never expire (or the deadline is unrepresentable).
    pub fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_expiring() {
            return None;
        }
        let ttl = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)?;
        created_at.checked_add_signed(ttl)
    }

    pub fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.expires_at(session.created_at)
            .map_or(false, |deadline| now > deadline)
    }
}

/// Token-keyed session storage
///
/// A `get` that follows a `put` of the same token on the same store observes
/// the written record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, token: &str, session: Session) -> AuthResult<()>;

    async fn get(&self, token: &str) -> AuthResult<Option<Session>>;

    /// Delete a record. True iff it existed.
    async fn remove(&self, token: &str) -> AuthResult<bool>;

    fn backend_name(&self) -> &str;
}
