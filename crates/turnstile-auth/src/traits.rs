//! Core authentication traits and the values that cross them

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::request::RequestView;
use crate::AuthResult;

/// Outcome of authenticating a request
///
/// This is the only value strategies hand back to callers; why a request
/// failed to authenticate is deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    Resolved(String),
    Anonymous,
}

impl Identity {
    pub fn resolved(user_id: impl Into<String>) -> Self {
        Identity::Resolved(user_id.into())
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Resolved(id) => Some(id),
            Identity::Anonymous => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Identity::Resolved(_))
    }
}

impl From<Option<String>> for Identity {
    fn from(user_id: Option<String>) -> Self {
        user_id.map_or(Identity::Anonymous, Identity::Resolved)
    }
}

/// Identifier/secret pair lifted from a request
///
/// Transient: never stored, and the secret is masked in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identifier: String,
    pub secret: String,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// Encoded password hash (algorithm, cost, salt and digest in one string)
///
/// There is intentionally no `PartialEq`: the only valid comparison is
/// [`CredentialVerifier::verify`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Salted adaptive password hashing
pub trait CredentialVerifier: Send + Sync {
    /// Hash a password with a fresh random salt
    fn hash(&self, plaintext: &str) -> AuthResult<PasswordHash>;

    /// Check a password against a stored hash. Malformed hashes verify as false.
    fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool;

    /// Get the hasher name
    fn hasher_name(&self) -> &str;
}

/// User as seen by the authentication layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub identifier: String,
    pub password_hash: PasswordHash,
}

/// Lookup side of the user persistence layer
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users registered under an identifier (usually an email address)
    async fn find_by_identifier(&self, identifier: &str) -> AuthResult<Vec<UserRecord>>;
}

/// Strategy that turns a request into an identity
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Resolve the identity attached to a request. Never fails: anything that
    /// goes wrong resolves to [`Identity::Anonymous`].
    async fn resolve_identity(&self, request: &RequestView) -> Identity;

    /// Get strategy name for identification
    fn strategy_name(&self) -> &str;
}

/// Strategy that also issues and revokes server-side sessions
#[async_trait]
pub trait SessionStrategy: AuthStrategy {
    /// Open a session for a user and return its token
    async fn create_session(&self, user_id: &str) -> AuthResult<String>;

    /// Drop the session named by the request's cookie. True iff one existed.
    async fn destroy_session(&self, request: &RequestView) -> bool;

    /// Name of the cookie that carries the token
    fn cookie_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        let identity = Identity::resolved("u1");
        assert!(identity.is_resolved());
        assert_eq!(identity.user_id(), Some("u1"));

        assert!(!Identity::Anonymous.is_resolved());
        assert_eq!(Identity::Anonymous.user_id(), None);
    }

    #[test]
    fn test_identity_from_option() {
        assert_eq!(Identity::from(Some("42".to_string())), Identity::resolved("42"));
        assert_eq!(Identity::from(None), Identity::Anonymous);
    }

    #[test]
    fn test_secrets_are_masked_in_debug() {
        let credential = Credential::new("bob@example.com", "hunter2");
        let printed = format!("{:?}", credential);
        assert!(printed.contains("bob@example.com"));
        assert!(!printed.contains("hunter2"));

        let hash = PasswordHash::new("$2b$04$abcdefghijklmnopqrstuv");
        assert_eq!(format!("{:?}", hash), "PasswordHash(..)");
    }
}
