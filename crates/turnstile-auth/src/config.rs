//! Authentication configuration types and environment loading

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_AUTH_TYPE: &str = "AUTH_TYPE";
pub const ENV_SESSION_NAME: &str = "SESSION_NAME";
pub const ENV_SESSION_DURATION: &str = "SESSION_DURATION";
pub const ENV_SESSION_CLEANUP_INTERVAL: &str = "SESSION_CLEANUP_INTERVAL";
pub const ENV_EXCLUDED_PATHS: &str = "EXCLUDED_PATHS";

/// Configuration loading errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

/// Which authentication strategy the process runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// No strategy, every request resolves to anonymous
    #[default]
    None,
    /// `Authorization: Basic` credentials checked against the user directory
    BasicAuth,
    /// Cookie sessions kept in memory, never expiring
    SessionAuth,
    /// Cookie sessions kept in memory with a duration policy
    SessionExpAuth,
    /// Cookie sessions with expiry, written through to a durable store
    SessionDbAuth,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::BasicAuth => "basic_auth",
            AuthType::SessionAuth => "session_auth",
            AuthType::SessionExpAuth => "session_exp_auth",
            AuthType::SessionDbAuth => "session_db_auth",
        }
    }

    /// Whether the strategy hands out session cookies
    pub fn uses_sessions(&self) -> bool {
        matches!(
            self,
            AuthType::SessionAuth | AuthType::SessionExpAuth | AuthType::SessionDbAuth
        )
    }
}

impl FromStr for AuthType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(AuthType::None),
            "basic_auth" | "basic" => Ok(AuthType::BasicAuth),
            "session_auth" => Ok(AuthType::SessionAuth),
            "session_exp_auth" => Ok(AuthType::SessionExpAuth),
            "session_db_auth" => Ok(AuthType::SessionDbAuth),
            _ => Err(ConfigError::InvalidValue {
                field: "auth_type".to_string(),
                value: s.to_string(),
                expected: "none, basic_auth, session_auth, session_exp_auth or session_db_auth"
                    .to_string(),
            }),
        }
    }
}

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Active strategy
    #[serde(default)]
    pub auth_type: AuthType,

    /// Path rules that skip identity resolution
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Password hashing configuration
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds, 0 never expires
    #[serde(default)]
    pub duration: u64,

    /// Seconds between expired-session sweeps, 0 disables the sweeper
    #[serde(default)]
    pub cleanup_interval: u64,

    /// Session cookie path
    #[serde(default = "default_session_cookie_path")]
    pub cookie_path: String,

    /// Session cookie secure flag
    #[serde(default = "default_false")]
    pub cookie_secure: bool,

    /// Session cookie HTTP-only flag
    #[serde(default = "default_true")]
    pub cookie_http_only: bool,

    /// Session cookie SameSite policy
    #[serde(default = "default_session_cookie_same_site")]
    pub cookie_same_site: String,
}

/// Password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Password hashing algorithm (bcrypt, argon2)
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    /// Bcrypt cost factor
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Argon2 memory cost in KB
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory: u32,

    /// Argon2 time cost (iterations)
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism factor
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

fn default_excluded_paths() -> Vec<String> {
    vec![
        "/api/v1/status/".to_string(),
        "/api/v1/unauthorized/".to_string(),
        "/api/v1/forbidden/".to_string(),
        "/api/v1/auth_session/login/".to_string(),
    ]
}
fn default_session_cookie_name() -> String {
    "session_id".to_string()
}
fn default_session_cookie_path() -> String {
    "/".to_string()
}
fn default_session_cookie_same_site() -> String {
    "Lax".to_string()
}
fn default_hash_algorithm() -> String {
    "bcrypt".to_string()
}
fn default_bcrypt_cost() -> u32 {
    12
}
fn default_argon2_memory() -> u32 {
    65536
} // 64MB
fn default_argon2_iterations() -> u32 {
    3
}
fn default_argon2_parallelism() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: AuthType::default(),
            excluded_paths: default_excluded_paths(),
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_session_cookie_name(),
            duration: 0,
            cleanup_interval: 0,
            cookie_path: default_session_cookie_path(),
            cookie_secure: default_false(),
            cookie_http_only: default_true(),
            cookie_same_site: default_session_cookie_same_site(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: default_hash_algorithm(),
            bcrypt_cost: default_bcrypt_cost(),
            argon2_memory: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl AuthConfig {
    /// Development configuration: cheap hashing, plain HTTP cookies
    pub fn development() -> Self {
        let mut config = Self::default();
        config.session.cookie_secure = false;
        config.password.bcrypt_cost = 4;
        config.password.argon2_memory = 4096;
        config.password.argon2_iterations = 2;
        config.password.argon2_parallelism = 2;
        config
    }

    /// Production configuration with strict cookies
    pub fn production() -> Self {
        let mut config = Self::default();
        config.session.cookie_secure = true;
        config.session.cookie_same_site = "Strict".to_string();
        config
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(auth_type) = lookup(ENV_AUTH_TYPE) {
            config.auth_type = auth_type.parse()?;
        }

        if let Some(name) = lookup(ENV_SESSION_NAME) {
            let name = name.trim();
            if !name.is_empty() {
                config.session.cookie_name = name.to_string();
            }
        }

        config.session.duration =
            seconds_or_zero(ENV_SESSION_DURATION, lookup(ENV_SESSION_DURATION));
        config.session.cleanup_interval =
            seconds_or_zero(ENV_SESSION_CLEANUP_INTERVAL, lookup(ENV_SESSION_CLEANUP_INTERVAL));

        if let Some(paths) = lookup(ENV_EXCLUDED_PATHS) {
            config.excluded_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_type.uses_sessions() {
            let name = &self.session.cookie_name;
            let unsafe_char = |c: char| c == ';' || c == '=' || c.is_whitespace();
            if name.is_empty() || name.contains(unsafe_char) {
                return Err(ConfigError::ValidationFailed {
                    field: "session.cookie_name".to_string(),
                    reason: format!("'{}' is not a valid cookie name", name),
                });
            }
        }

        if !["bcrypt", "argon2"].contains(&self.password.hash_algorithm.as_str()) {
            return Err(ConfigError::ValidationFailed {
                field: "password.hash_algorithm".to_string(),
                reason: format!("unknown algorithm '{}'", self.password.hash_algorithm),
            });
        }

        if !(4..=31).contains(&self.password.bcrypt_cost) {
            return Err(ConfigError::ValidationFailed {
                field: "password.bcrypt_cost".to_string(),
                reason: "bcrypt cost must be between 4 and 31".to_string(),
            });
        }

        if !["Strict", "Lax", "None"].contains(&self.session.cookie_same_site.as_str()) {
            return Err(ConfigError::ValidationFailed {
                field: "session.cookie_same_site".to_string(),
                reason: "Invalid session cookie SameSite policy".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse a seconds value, falling back to 0 for anything that is not a
/// non-negative integer.
fn seconds_or_zero(var: &str, raw: Option<String>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };

    match raw.trim().parse::<i64>() {
        Ok(secs) if secs >= 0 => secs as u64,
        _ => {
            tracing::warn!(variable = var, value = %raw, "ignoring invalid duration, using 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.auth_type, AuthType::None);
        assert_eq!(config.session.cookie_name, "session_id");
        assert_eq!(config.session.duration, 0);
        assert_eq!(config.password.hash_algorithm, "bcrypt");
        assert!(config.excluded_paths.contains(&"/api/v1/status/".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = AuthConfig::development();
        assert_eq!(dev.password.bcrypt_cost, 4);
        assert!(!dev.session.cookie_secure);

        let prod = AuthConfig::production();
        assert!(prod.session.cookie_secure);
        assert_eq!(prod.session.cookie_same_site, "Strict");
    }

    #[test]
    fn test_from_lookup() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            ("AUTH_TYPE", "session_exp_auth"),
            ("SESSION_NAME", "_my_session_id"),
            ("SESSION_DURATION", "60"),
            ("EXCLUDED_PATHS", "/api/v1/status/, /api/v1/stat*"),
        ]))
        .unwrap();

        assert_eq!(config.auth_type, AuthType::SessionExpAuth);
        assert_eq!(config.session.cookie_name, "_my_session_id");
        assert_eq!(config.session.duration, 60);
        assert_eq!(config.excluded_paths, vec!["/api/v1/status/", "/api/v1/stat*"]);
    }

    #[test]
    fn test_invalid_duration_falls_back_to_zero() {
        for raw in ["abc", "-5", "", "1.5"] {
            let config =
                AuthConfig::from_lookup(lookup_from(&[("SESSION_DURATION", raw)])).unwrap();
            assert_eq!(config.session.duration, 0, "raw value {:?}", raw);
        }
    }

    #[test]
    fn test_unknown_auth_type_is_rejected() {
        let err = AuthConfig::from_lookup(lookup_from(&[("AUTH_TYPE", "kerberos")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_auth_type_round_trips_through_str() {
        for auth_type in [
            AuthType::None,
            AuthType::BasicAuth,
            AuthType::SessionAuth,
            AuthType::SessionExpAuth,
            AuthType::SessionDbAuth,
        ] {
            assert_eq!(auth_type.as_str().parse::<AuthType>().unwrap(), auth_type);
        }
        assert!(!AuthType::BasicAuth.uses_sessions());
        assert!(AuthType::SessionDbAuth.uses_sessions());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AuthConfig::default();
        config.auth_type = AuthType::SessionAuth;
        config.session.cookie_name = "bad name".to_string();
        assert!(config.validate().is_err());

        config.session.cookie_name = "sid".to_string();
        config.password.hash_algorithm = "md5".to_string();
        assert!(config.validate().is_err());

        config.password.hash_algorithm = "argon2".to_string();
        config.password.bcrypt_cost = 2;
        assert!(config.validate().is_err());

        config.password.bcrypt_cost = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let raw = r#"{"auth_type": "basic_auth", "session": {"duration": 30}}"#;
        let config: AuthConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.auth_type, AuthType::BasicAuth);
        assert_eq!(config.session.duration, 30);
        assert_eq!(config.session.cookie_name, "session_id");
        assert_eq!(config.password.bcrypt_cost, 12);
    }
}
