//! In-memory user directory

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    traits::{CredentialVerifier, UserDirectory, UserRecord},
    utils::hash_blocking,
    AuthError, AuthResult,
};

/// Users held in process memory
///
/// Stands in for a real persistence layer during development and tests.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` and store a new user under `identifier`
    pub async fn register(
        &self,
        identifier: &str,
        password: &str,
        verifier: &Arc<dyn CredentialVerifier>,
    ) -> AuthResult<UserRecord> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::missing_field("identifier"));
        }
        if password.is_empty() {
            return Err(AuthError::missing_field("password"));
        }

        let taken = self.users.read().iter().any(|u| u.identifier == identifier);
        if taken {
            return Err(AuthError::user_exists(identifier));
        }

        // hash outside the lock, bcrypt is slow
        let password_hash = hash_blocking(verifier, password).await?;

        let mut users = self.users.write();
        if users.iter().any(|u| u.identifier == identifier) {
            return Err(AuthError::user_exists(identifier));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            identifier: identifier.to_string(),
            password_hash,
        };
        users.push(record.clone());
        tracing::info!(user_id = %record.id, "user registered");
        Ok(record)
    }

    /// Store a prepared record as is, duplicates included
    pub fn insert(&self, record: UserRecord) {
        self.users.write().push(record);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_identifier(&self, identifier: &str) -> AuthResult<Vec<UserRecord>> {
        Ok(self
            .users
            .read()
            .iter()
            .filter(|u| u.identifier == identifier)
            .cloned()
            .collect())
    }
}
