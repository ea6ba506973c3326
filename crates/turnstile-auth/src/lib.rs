//! # turnstile-auth: request authentication and session lifecycle
//!
//! Decides whether a request path needs an identity, resolves that identity
//! from an `Authorization: Basic` header or a session cookie, and manages the
//! sessions behind the cookie: in-memory, with expiry, or backed by a durable
//! store.
//!
//! ```
//! use turnstile_auth::{AuthConfig, AuthType, Authenticator, Identity, RequestView};
//!
//! tokio_test::block_on(async {
//!     let mut config = AuthConfig::development();
//!     config.auth_type = AuthType::SessionAuth;
//!     let auth = Authenticator::builder(config).build().unwrap();
//!
//!     let token = auth.create_session("user-1").await.unwrap();
//!     let request = RequestView::new("/api/v1/users/me").with_cookie("session_id", token);
//!     assert_eq!(auth.resolve_identity(&request).await, Identity::resolved("user-1"));
//! });
//! ```

pub mod authenticator;
pub mod clock;
pub mod config;
pub mod cookie;
pub mod directory;
pub mod error;
pub mod path;
pub mod providers;
pub mod request;
pub mod session;
pub mod traits;
pub mod utils;

// Error handling
pub use error::AuthError;

// Core traits and values
pub use traits::{
    AuthStrategy, Credential, CredentialVerifier, Identity, PasswordHash, SessionStrategy,
    UserDirectory, UserRecord,
};

// Configuration
pub use config::{AuthConfig, AuthType, ConfigError, PasswordConfig, SessionConfig};

// Entry point
pub use authenticator::{AccessDecision, Authenticator, AuthenticatorBuilder, SessionGrant};

// Building blocks
pub use clock::{Clock, ManualClock, SystemClock};
pub use cookie::SessionCookie;
pub use directory::MemoryUserDirectory;
pub use path::{requires_auth, PathMatcher, PathRule};
pub use providers::{BasicAuth, DurableSessionAuth, ExpiringSessionAuth, SessionAuth};
pub use request::RequestView;
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionDurationPolicy, SessionStore,
};
pub use utils::{generate_session_token, verifier_for};

#[cfg(feature = "argon2")]
pub use utils::Argon2Verifier;
#[cfg(feature = "bcrypt")]
pub use utils::BcryptVerifier;

#[cfg(feature = "postgres")]
pub use session::PgSessionStore;

/// Authentication result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
