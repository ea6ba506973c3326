//! Password hashing and token utilities

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};

use crate::{config::PasswordConfig, AuthError, AuthResult, CredentialVerifier, PasswordHash};

#[cfg(feature = "argon2")]
use argon2::{
    password_hash::{
        rand_core::OsRng as SaltRng, PasswordHash as PhcString, PasswordHasher as _,
        PasswordVerifier, SaltString,
    },
    Argon2,
};

#[cfg(feature = "bcrypt")]
use bcrypt::{hash, verify, DEFAULT_COST};

/// Session token size in bytes (256 bits of entropy)
pub const SESSION_TOKEN_BYTES: usize = 32;

/// bcrypt password hasher
#[cfg(feature = "bcrypt")]
#[derive(Debug, Clone)]
pub struct BcryptVerifier {
    cost: u32,
}

#[cfg(feature = "bcrypt")]
impl BcryptVerifier {
    /// Create a new bcrypt hasher with custom cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Cheap cost factor for tests and local development
    pub fn development() -> Self {
        Self { cost: 4 }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

#[cfg(feature = "bcrypt")]
impl Default for BcryptVerifier {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

#[cfg(feature = "bcrypt")]
impl CredentialVerifier for BcryptVerifier {
    fn hash(&self, plaintext: &str) -> AuthResult<PasswordHash> {
        let encoded = hash(plaintext, self.cost)?;
        Ok(PasswordHash::new(encoded))
    }

    fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool {
        // bcrypt reads cost and salt back out of the stored hash
        verify(plaintext, hash.as_str()).unwrap_or(false)
    }

    fn hasher_name(&self) -> &str {
        "bcrypt"
    }
}

/// Argon2id password hasher
#[cfg(feature = "argon2")]
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

#[cfg(feature = "argon2")]
impl Argon2Verifier {
    /// Create a new Argon2 hasher with custom parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Create an Argon2 hasher optimized for development (faster)
    pub fn development() -> Self {
        Self {
            memory_cost: 4096, // 4 MB
            time_cost: 2,
            parallelism: 2,
        }
    }

    fn hasher(&self) -> AuthResult<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::crypto_error(e.to_string()))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2Verifier {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

#[cfg(feature = "argon2")]
impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plaintext: &str) -> AuthResult<PasswordHash> {
        let salt = SaltString::generate(&mut SaltRng);
        let encoded = self
            .hasher()?
            .hash_password(plaintext.as_bytes(), &salt)?
            .to_string();
        Ok(PasswordHash::new(encoded))
    }

    fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool {
        let Ok(parsed) = PhcString::new(hash.as_str()) else {
            return false;
        };
        // Parameters come from the PHC string, not from self
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    fn hasher_name(&self) -> &str {
        "argon2"
    }
}

/// Build the verifier named by the password configuration
pub fn verifier_for(config: &PasswordConfig) -> AuthResult<Box<dyn CredentialVerifier>> {
    match config.hash_algorithm.as_str() {
        #[cfg(feature = "bcrypt")]
        "bcrypt" => Ok(Box::new(BcryptVerifier::new(config.bcrypt_cost))),
        #[cfg(feature = "argon2")]
        "argon2" => Ok(Box::new(Argon2Verifier::new(
            config.argon2_memory,
            config.argon2_iterations,
            config.argon2_parallelism,
        ))),
        other => Err(AuthError::config_error(format!(
            "Unknown password hashing algorithm: {} (or feature not enabled)",
            other
        ))),
    }
}

/// Hash a password on the blocking thread pool.
///
/// Adaptive hashes cost tens to hundreds of milliseconds of CPU and must not
/// run on an async worker.
pub async fn hash_blocking(
    verifier: &Arc<dyn CredentialVerifier>,
    plaintext: &str,
) -> AuthResult<PasswordHash> {
    let verifier = Arc::clone(verifier);
    let plaintext = plaintext.to_string();

    tokio::task::spawn_blocking(move || verifier.hash(&plaintext))
        .await
        .map_err(|e| AuthError::crypto_error(format!("hashing task failed: {}", e)))?
}

/// Generate an unguessable session token (hex, 64 chars)
pub fn generate_session_token() -> String {
    let mut buffer = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}

/// Short, non-reversible prefix of a token for log lines
pub fn token_fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map_or(token.len(), |(idx, _)| idx);
    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[cfg(feature = "bcrypt")]
    #[test]
    fn test_bcrypt_round_trip() {
        let verifier = BcryptVerifier::development();
        let hash = verifier.hash("test_password_123").unwrap();

        assert!(verifier.verify(&hash, "test_password_123"));
        assert!(!verifier.verify(&hash, "wrong_password"));
        assert!(!verifier.verify(&hash, ""));
    }

    #[cfg(feature = "bcrypt")]
    #[test]
    fn test_bcrypt_hashes_are_salted() {
        let verifier = BcryptVerifier::development();
        let first = verifier.hash("same password").unwrap();
        let second = verifier.hash("same password").unwrap();

        assert_ne!(first.as_bytes(), second.as_bytes());
        assert!(verifier.verify(&first, "same password"));
        assert!(verifier.verify(&second, "same password"));
    }

    #[cfg(feature = "bcrypt")]
    #[test]
    fn test_bcrypt_uses_cost_embedded_in_hash() {
        let stored = BcryptVerifier::new(5).hash("pw").unwrap();
        assert!(BcryptVerifier::development().verify(&stored, "pw"));
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn test_argon2_round_trip() {
        let verifier = Argon2Verifier::development();
        let hash = verifier.hash("test_password_123").unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));

        assert!(verifier.verify(&hash, "test_password_123"));
        assert!(!verifier.verify(&hash, "wrong_password"));

        let again = verifier.hash("test_password_123").unwrap();
        assert_ne!(hash.as_str(), again.as_str());
    }

    #[test]
    fn test_malformed_hashes_verify_false() {
        let garbage = [
            PasswordHash::new(""),
            PasswordHash::new("not a hash"),
            PasswordHash::new("$2b$04$short"),
            PasswordHash::new("$argon2id$v=19$m=bad"),
        ];

        #[cfg(feature = "bcrypt")]
        for hash in &garbage {
            assert!(!BcryptVerifier::development().verify(hash, "anything"));
        }

        #[cfg(feature = "argon2")]
        for hash in &garbage {
            assert!(!Argon2Verifier::development().verify(hash, "anything"));
        }
    }

    #[test]
    fn test_verifier_for_config() {
        let mut config = PasswordConfig::default();
        config.bcrypt_cost = 4;
        assert_eq!(verifier_for(&config).unwrap().hasher_name(), "bcrypt");

        config.hash_algorithm = "argon2".to_string();
        assert_eq!(verifier_for(&config).unwrap().hasher_name(), "argon2");

        config.hash_algorithm = "md5".to_string();
        assert!(verifier_for(&config).is_err());
    }

    #[test]
    fn test_session_tokens() {
        let tokens: HashSet<String> = (0..256).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 256);
        assert!(tokens
            .iter()
            .all(|t| t.len() == SESSION_TOKEN_BYTES * 2
                && t.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn test_token_fingerprint() {
        assert_eq!(token_fingerprint("0123456789abcdef"), "01234567");
        assert_eq!(token_fingerprint("abc"), "abc");
        assert_eq!(token_fingerprint("ééééééééé"), "éééééééé");
    }
}
