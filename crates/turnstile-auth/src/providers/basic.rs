//! HTTP Basic authentication

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    request::RequestView,
    traits::{AuthStrategy, Credential, CredentialVerifier, Identity, UserDirectory, UserRecord},
    AuthError, AuthResult,
};

const BASIC_PREFIX: &str = "Basic ";

/// The base64 payload of a `Basic` authorization header.
///
/// The scheme match is exact: case-sensitive, one space.
pub fn extract_base64_authorization_header(header: &str) -> Option<&str> {
    header.strip_prefix(BASIC_PREFIX)
}

/// Decode the payload to UTF-8 text
pub fn decode_base64_authorization_header(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Split `identifier:secret` on the first colon
pub fn extract_user_credentials(decoded: &str) -> Option<Credential> {
    let (identifier, secret) = decoded.split_once(':')?;
    if identifier.is_empty() || secret.is_empty() {
        return None;
    }
    Some(Credential::new(identifier, secret))
}

/// Full header → credential pipeline
pub fn credential_from_header(header: &str) -> Option<Credential> {
    let encoded = extract_base64_authorization_header(header)?;
    let decoded = decode_base64_authorization_header(encoded)?;
    extract_user_credentials(&decoded)
}

/// Users matching the identifier whose stored hash accepts the secret; the
/// first match wins. Verification runs on the blocking thread pool.
pub async fn user_from_credential(
    directory: &dyn UserDirectory,
    verifier: &Arc<dyn CredentialVerifier>,
    credential: &Credential,
) -> AuthResult<Option<UserRecord>> {
    let candidates = directory.find_by_identifier(&credential.identifier).await?;
    if candidates.is_empty() {
        return Ok(None);
    }

    let verifier = Arc::clone(verifier);
    let secret = credential.secret.clone();
    tokio::task::spawn_blocking(move || {
        candidates
            .into_iter()
            .find(|user| verifier.verify(&user.password_hash, &secret))
    })
    .await
    .map_err(|e| AuthError::crypto_error(format!("password verification task failed: {}", e)))
}

/// `Authorization: Basic` strategy
pub struct BasicAuth {
    directory: Arc<dyn UserDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl BasicAuth {
    pub fn new(directory: Arc<dyn UserDirectory>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            directory,
            verifier,
        }
    }

    /// Check a credential pair against the directory
    pub async fn authenticate(&self, credential: &Credential) -> AuthResult<Option<UserRecord>> {
        user_from_credential(self.directory.as_ref(), &self.verifier, credential).await
    }

    /// User id behind the request's `Authorization` header, with the reason
    /// when there is none
    pub async fn identify(&self, request: &RequestView) -> AuthResult<String> {
        let credential = request
            .authorization_header()
            .and_then(credential_from_header)
            .ok_or(AuthError::MalformedCredential)?;

        self.authenticate(&credential)
            .await?
            .map(|user| user.id)
            .ok_or(AuthError::UnresolvedIdentity)
    }
}

#[async_trait]
impl AuthStrategy for BasicAuth {
    async fn resolve_identity(&self, request: &RequestView) -> Identity {
        match self.identify(request).await {
            Ok(user_id) => Identity::Resolved(user_id),
            Err(e) if e.is_server_fault() => {
                tracing::warn!(error = %e, "user lookup failed, treating request as anonymous");
                Identity::Anonymous
            }
            Err(e) => {
                tracing::debug!(reason = e.error_code(), "basic credentials rejected");
                Identity::Anonymous
            }
        }
    }

    fn strategy_name(&self) -> &str {
        "basic_auth"
    }
}
