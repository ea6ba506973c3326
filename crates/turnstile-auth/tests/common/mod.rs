#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tracing_subscriber::EnvFilter;
use turnstile_auth::{AuthConfig, AuthType, BcryptVerifier, CredentialVerifier, ManualClock};

/// Route library logs to the test output, once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("turnstile_auth=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn config(auth_type: AuthType) -> AuthConfig {
    let mut config = AuthConfig::development();
    config.auth_type = auth_type;
    config
}

pub fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()))
}

pub fn fast_verifier() -> Arc<dyn CredentialVerifier> {
    Arc::new(BcryptVerifier::development())
}
