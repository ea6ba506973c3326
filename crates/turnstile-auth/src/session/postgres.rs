//! Durable session store backed by PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Session, SessionStore};
use crate::AuthResult;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS user_sessions (
    session_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)";

/// Sessions kept in the `user_sessions` table
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the sessions table if it is missing
    pub async fn ensure_schema(&self) -> AuthResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn put(&self, token: &str, session: Session) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO user_sessions (session_id, user_id, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (session_id) DO UPDATE
             SET user_id = EXCLUDED.user_id, created_at = EXCLUDED.created_at",
        )
        .bind(token)
        .bind(&session.user_id)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> AuthResult<Option<Session>> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT session_id, user_id, created_at FROM user_sessions WHERE session_id = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(session_id, user_id, created_at)| Session {
            session_id,
            user_id,
            created_at,
        }))
    }

    async fn remove(&self, token: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE session_id = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_session_token;
    use chrono::{Duration, SubsecRound};

    /// Store against `DATABASE_URL`; `None` skips the test when it is unset
    async fn store() -> Option<PgSessionStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping postgres session store test");
            return None;
        };
        let pool = PgPool::connect(&url).await.unwrap();
        let store = PgSessionStore::new(pool);
        store.ensure_schema().await.unwrap();
        Some(store)
    }

    // TIMESTAMPTZ keeps microseconds
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let Some(store) = store().await else { return };
        store.ensure_schema().await.unwrap();
        assert_eq!(store.backend_name(), "postgres");
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let Some(store) = store().await else { return };
        let token = generate_session_token();
        let session = Session::new(token.clone(), "u1", now());

        assert_eq!(store.get(&token).await.unwrap(), None);
        store.put(&token, session.clone()).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), Some(session));

        assert!(store.remove(&token).await.unwrap());
        assert!(!store.remove(&token).await.unwrap());
        assert_eq!(store.get(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_token() {
        let Some(store) = store().await else { return };
        let token = generate_session_token();
        let created = now();

        store.put(&token, Session::new(token.clone(), "u1", created)).await.unwrap();
        let replacement = Session::new(token.clone(), "u2", created + Duration::seconds(30));
        store.put(&token, replacement.clone()).await.unwrap();

        assert_eq!(store.get(&token).await.unwrap(), Some(replacement));
        assert!(store.remove(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_storage_error() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let store = PgSessionStore::new(pool);

        let err = store.get("tok").await.unwrap_err();
        assert_eq!(err.error_code(), "SESSION_STORE_UNAVAILABLE");
    }
}
