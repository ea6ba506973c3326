//! Process-wide entry point used by the HTTP adapter
//!
//! An [`Authenticator`] is built once from [`AuthConfig`] and shared by every
//! request handler. It owns the exempt path rules and the strategy selected by
//! `AUTH_TYPE`, and exposes the operations the adapter needs: path checks,
//! identity resolution, login, and session creation and teardown.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    clock::{Clock, SystemClock},
    config::{AuthConfig, AuthType},
    cookie::SessionCookie,
    path::PathMatcher,
    providers::{
        basic::user_from_credential, BasicAuth, DurableLayer, ExpiringLayer, SessionAuth,
        StoreLayer,
    },
    request::RequestView,
    session::{spawn_session_sweeper, MemorySessionStore, SessionDurationPolicy, SessionStore},
    traits::{
        AuthStrategy, Credential, CredentialVerifier, Identity, SessionStrategy, UserDirectory,
    },
    utils::verifier_for,
    AuthError, AuthResult,
};

/// What the adapter should do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Path is exempt (or no strategy is configured), let it through
    Exempt,
    /// Request carries a valid identity
    Granted(String),
    /// Neither an authorization header nor a session cookie was sent
    MissingCredentials,
    /// Something was sent but it did not resolve to a user
    Forbidden,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Exempt | AccessDecision::Granted(_))
    }

    /// HTTP status to reject with, `None` when the request may proceed
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AccessDecision::Exempt | AccessDecision::Granted(_) => None,
            AccessDecision::MissingCredentials => Some(401),
            AccessDecision::Forbidden => Some(403),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: String,
    pub user_id: String,
}

enum ActiveStrategy {
    Disabled,
    Basic(BasicAuth),
    Session(Arc<dyn SessionStrategy>),
}

/// Authentication facade over the configured strategy
pub struct Authenticator {
    auth_type: AuthType,
    matcher: PathMatcher,
    strategy: ActiveStrategy,
    directory: Option<Arc<dyn UserDirectory>>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie: SessionCookie,
    policy: SessionDurationPolicy,
    cleanup_interval: u64,
    memory: Arc<MemorySessionStore>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn builder(config: AuthConfig) -> AuthenticatorBuilder {
        AuthenticatorBuilder::new(config)
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub fn strategy_name(&self) -> &str {
        match &self.strategy {
            ActiveStrategy::Disabled => "none",
            ActiveStrategy::Basic(basic) => basic.strategy_name(),
            ActiveStrategy::Session(session) => session.strategy_name(),
        }
    }

    /// Session cookie attributes, for rendering `Set-Cookie`
    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    pub fn verifier(&self) -> &Arc<dyn CredentialVerifier> {
        &self.verifier
    }

    /// Whether `path` needs an identity
    pub fn requires_auth(&self, path: &str) -> bool {
        self.matcher.requires_auth(path)
    }

    /// Identity attached to the request, by the active strategy
    pub async fn resolve_identity(&self, request: &RequestView) -> Identity {
        match &self.strategy {
            ActiveStrategy::Disabled => Identity::Anonymous,
            ActiveStrategy::Basic(basic) => basic.resolve_identity(request).await,
            ActiveStrategy::Session(session) => session.resolve_identity(request).await,
        }
    }

    /// Path check followed by identity resolution
    pub async fn check(&self, request: &RequestView) -> AccessDecision {
        let disabled = matches!(self.strategy, ActiveStrategy::Disabled);
        if disabled || !self.requires_auth(request.path()) {
            return AccessDecision::Exempt;
        }

        let presented = request.authorization_header().is_some()
            || request.cookie(&self.cookie.name).is_some();
        if !presented {
            return AccessDecision::MissingCredentials;
        }

        match self.resolve_identity(request).await {
            Identity::Resolved(user_id) => AccessDecision::Granted(user_id),
            Identity::Anonymous => AccessDecision::Forbidden,
        }
    }

    /// Open a session for a user. Store failures are returned, not hidden.
    pub async fn create_session(&self, user_id: &str) -> AuthResult<String> {
        match &self.strategy {
            ActiveStrategy::Session(session) => session.create_session(user_id).await,
            _ => Err(AuthError::SessionsUnsupported),
        }
    }

    /// Tear down the session named by the request's cookie
    pub async fn destroy_session(&self, request: &RequestView) -> bool {
        match &self.strategy {
            ActiveStrategy::Session(session) => session.destroy_session(request).await,
            _ => false,
        }
    }

    /// Check an identifier/secret pair and open a session for the user
    pub async fn login(&self, identifier: &str, secret: &str) -> AuthResult<SessionGrant> {
        if identifier.trim().is_empty() {
            return Err(AuthError::missing_field("identifier"));
        }
        if secret.trim().is_empty() {
            return Err(AuthError::missing_field("password"));
        }
        if !matches!(self.strategy, ActiveStrategy::Session(_)) {
            return Err(AuthError::SessionsUnsupported);
        }
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| AuthError::config_error("login requires a user directory"))?;

        let credential = Credential::new(identifier, secret);
        let user = user_from_credential(directory.as_ref(), &self.verifier, &credential)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.create_session(&user.id).await?;
        Ok(SessionGrant {
            token,
            user_id: user.id,
        })
    }

    /// Start the background sweep of expired in-memory sessions, when the
    /// configuration asks for one. Must be called inside a tokio runtime.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        // durable sessions never touch the memory store
        let sweepable = self.auth_type == AuthType::SessionExpAuth && self.policy.is_expiring();
        if !sweepable || self.cleanup_interval == 0 {
            return None;
        }

        Some(spawn_session_sweeper(
            self.memory.clone(),
            self.policy,
            self.clock.clone(),
            std::time::Duration::from_secs(self.cleanup_interval),
        ))
    }
}

/// Collaborators an [`Authenticator`] is assembled from
pub struct AuthenticatorBuilder {
    config: AuthConfig,
    directory: Option<Arc<dyn UserDirectory>>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    memory: Option<Arc<MemorySessionStore>>,
    durable: Option<Arc<dyn SessionStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AuthenticatorBuilder {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            directory: None,
            verifier: None,
            memory: None,
            durable: None,
            clock: None,
        }
    }

    /// User directory, required for basic auth and login
    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Password verifier; defaults to the one named in the password config
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Shared in-memory session store; defaults to a fresh one
    pub fn memory_store(mut self, store: Arc<MemorySessionStore>) -> Self {
        self.memory = Some(store);
        self
    }

    /// Durable session store, required for `session_db_auth`
    pub fn durable_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> AuthResult<Authenticator> {
        let config = self.config;
        config.validate()?;

        let verifier = match self.verifier {
            Some(verifier) => verifier,
            None => Arc::from(verifier_for(&config.password)?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let memory = self.memory.unwrap_or_default();
        let policy = SessionDurationPolicy::new(config.session.duration);
        let cookie_name = config.session.cookie_name.clone();
        let store_layer = StoreLayer::new(memory.clone(), clock.clone());

        let strategy = match config.auth_type {
            AuthType::None => ActiveStrategy::Disabled,
            AuthType::BasicAuth => {
                let directory = self.directory.clone().ok_or_else(|| {
                    AuthError::config_error("basic_auth requires a user directory")
                })?;
                ActiveStrategy::Basic(BasicAuth::new(directory, verifier.clone()))
            }
            AuthType::SessionAuth => {
                ActiveStrategy::Session(Arc::new(SessionAuth::new(store_layer, cookie_name)))
            }
            AuthType::SessionExpAuth => ActiveStrategy::Session(Arc::new(SessionAuth::new(
                ExpiringLayer::new(store_layer, policy, clock.clone()),
                cookie_name,
            ))),
            AuthType::SessionDbAuth => {
                let durable = self.durable.ok_or_else(|| {
                    AuthError::config_error("session_db_auth requires a durable session store")
                })?;
                ActiveStrategy::Session(Arc::new(SessionAuth::new(
                    DurableLayer::new(durable, policy, clock.clone()),
                    cookie_name,
                )))
            }
        };

        tracing::info!(
            auth_type = config.auth_type.as_str(),
            exempt_paths = config.excluded_paths.len(),
            session_duration = config.session.duration,
            hasher = verifier.hasher_name(),
            "authenticator ready"
        );

        Ok(Authenticator {
            auth_type: config.auth_type,
            matcher: PathMatcher::new(config.excluded_paths.iter().map(String::as_str)),
            strategy,
            directory: self.directory,
            verifier,
            cookie: SessionCookie::from_config(&config.session),
            policy,
            cleanup_interval: config.session.cleanup_interval,
            memory,
            clock,
        })
    }
}
