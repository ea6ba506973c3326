//! Authentication and session error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Authentication and session errors
///
/// Lookup paths never surface these to callers: strategies collapse them into
/// [`Identity::Anonymous`](crate::Identity::Anonymous). Write paths (session
/// creation, password hashing) return them so the adapter can answer with a
/// server error.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Header or cookie did not have the expected shape
    #[error("Malformed credential")]
    MalformedCredential,

    /// Lookup or verification did not produce a user
    #[error("Identity could not be resolved")]
    UnresolvedIdentity,

    /// Login attempted with an unknown identifier or a wrong secret
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A required login field was blank
    #[error("Missing field: {field}")]
    MissingField { field: String },

    /// Registration for an identifier that is already taken
    #[error("User already exists: {identifier}")]
    UserAlreadyExists { identifier: String },

    /// Session operation requested from a strategy without sessions
    #[error("The active authentication strategy does not support sessions")]
    SessionsUnsupported,

    /// The user directory raised while being queried
    #[error("User directory unavailable: {message}")]
    DirectoryUnavailable { message: String },

    /// The session store raised while being read or written
    #[error("Session store unavailable: {message}")]
    SessionStoreUnavailable { message: String },

    /// Cryptographic errors
    #[error("Cryptographic error: {message}")]
    CryptographicError { message: String },

    /// Configuration errors
    #[error("Authentication configuration error: {message}")]
    ConfigurationError { message: String },
}

impl AuthError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedCredential => "MALFORMED_CREDENTIAL",
            AuthError::UnresolvedIdentity => "UNRESOLVED_IDENTITY",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingField { .. } => "MISSING_FIELD",
            AuthError::UserAlreadyExists { .. } => "USER_ALREADY_EXISTS",
            AuthError::SessionsUnsupported => "SESSIONS_UNSUPPORTED",
            AuthError::DirectoryUnavailable { .. } => "DIRECTORY_UNAVAILABLE",
            AuthError::SessionStoreUnavailable { .. } => "SESSION_STORE_UNAVAILABLE",
            AuthError::CryptographicError { .. } => "CRYPTOGRAPHIC_ERROR",
            AuthError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MalformedCredential => 401,
            AuthError::UnresolvedIdentity => 401,
            AuthError::InvalidCredentials => 401, // Don't reveal user existence
            AuthError::MissingField { .. } => 400,
            AuthError::UserAlreadyExists { .. } => 400,
            AuthError::SessionsUnsupported => 501,
            AuthError::DirectoryUnavailable { .. } => 500,
            AuthError::SessionStoreUnavailable { .. } => 500,
            AuthError::CryptographicError { .. } => 500,
            AuthError::ConfigurationError { .. } => 500,
        }
    }

    /// Whether the error is a backend fault rather than a rejected request
    pub fn is_server_fault(&self) -> bool {
        self.status_code() >= 500
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    /// Create a user already exists error
    pub fn user_exists(identifier: impl Into<String>) -> Self {
        Self::UserAlreadyExists { identifier: identifier.into() }
    }

    /// Create a directory error
    pub fn directory_error(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable { message: message.into() }
    }

    /// Create a session store error
    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::SessionStoreUnavailable { message: message.into() }
    }

    /// Create a cryptographic error
    pub fn crypto_error(message: impl Into<String>) -> Self {
        Self::CryptographicError { message: message.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }
}

#[cfg(feature = "argon2")]
impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::crypto_error(err.to_string())
    }
}

#[cfg(feature = "bcrypt")]
impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::crypto_error(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage_error(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::storage_error(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage_error(err.to_string())
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::config_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(AuthError::storage_error("down").error_code(), "SESSION_STORE_UNAVAILABLE");
        assert_eq!(AuthError::missing_field("email").error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MalformedCredential.status_code(), 401);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::missing_field("password").status_code(), 400);
        assert_eq!(AuthError::directory_error("timeout").status_code(), 500);
        assert_eq!(AuthError::SessionsUnsupported.status_code(), 501);
    }

    #[test]
    fn test_server_faults() {
        assert!(AuthError::storage_error("disk full").is_server_fault());
        assert!(AuthError::crypto_error("bad params").is_server_fault());
        assert!(!AuthError::UnresolvedIdentity.is_server_fault());
        assert!(!AuthError::user_exists("bob@example.com").is_server_fault());
    }

    #[test]
    fn test_error_display() {
        let err = AuthError::directory_error("connection refused");
        assert_eq!(err.to_string(), "User directory unavailable: connection refused");

        let err = AuthError::missing_field("email");
        assert_eq!(err.to_string(), "Missing field: email");
    }

    #[test]
    fn test_io_error_is_storage_fault() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = AuthError::from(io);
        assert_eq!(err.error_code(), "SESSION_STORE_UNAVAILABLE");
    }
}
