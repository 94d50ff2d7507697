//! One-way password hashing.
//!
//! New hashes use the configured algorithm. Verification detects the stored
//! format from its prefix (`$argon2…` PHC strings, `$2…` bcrypt), so switching
//! the algorithm does not invalidate existing credentials.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use std::sync::Arc;

use argon2::Argon2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::warn;

/// Algorithm used for newly created hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordAlgorithm {
    #[default]
    Argon2,
    Bcrypt,
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct PasswordVerifier {
    algorithm: PasswordAlgorithm,
    bcrypt_cost: u32,
    // Hash of a random secret, checked when there is no real credential so
    // that a failed lookup costs as much as a failed verification.
    placeholder: Arc<OnceCell<String>>,
}

impl Default for PasswordVerifier {
    fn default() -> Self {
        Self::new(PasswordAlgorithm::default(), 10)
    }
}

impl PasswordVerifier {
    pub fn new(algorithm: PasswordAlgorithm, bcrypt_cost: u32) -> Self {
        Self {
            algorithm,
            bcrypt_cost,
            placeholder: Arc::new(OnceCell::new()),
        }
    }

    pub fn algorithm(&self) -> PasswordAlgorithm {
        self.algorithm
    }

    /// Hash `plaintext` with a fresh random salt embedded in the output.
    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let plaintext = plaintext.to_owned();
        let algorithm = self.algorithm;
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_blocking(algorithm, cost, &plaintext)).await?
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// An absent or empty hash means no credential is set and never verifies.
    pub async fn verify(&self, plaintext: &str, hash: Option<&str>) -> bool {
        let Some(hash) = hash.filter(|h| !h.is_empty()) else {
            return false;
        };
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        match tokio::task::spawn_blocking(move || verify_blocking(&plaintext, &hash)).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "password verification task failed");
                false
            }
        }
    }
}

impl PasswordVerifier {
    /// Run a full verification against the placeholder hash and report failure.
    ///
    /// Used for unknown accounts and accounts without a credential.
    pub async fn verify_placeholder(&self, plaintext: &str) -> bool {
        match self.placeholder_hash().await {
            Ok(hash) => {
                self.verify(plaintext, Some(hash)).await;
            }
            Err(e) => warn!(error = %e, "placeholder hash unavailable"),
        }
        false
    }

    /// Build the placeholder hash ahead of the first failed login.
    pub async fn prepare_placeholder(&self) {
        if let Err(e) = self.placeholder_hash().await {
            warn!(error = %e, "placeholder hash unavailable");
        }
    }

    async fn placeholder_hash(&self) -> Result<&str, PasswordError> {
        self.placeholder
            .get_or_try_init(|| async {
                let secret = SaltString::generate(&mut OsRng);
                self.hash(secret.as_str()).await
            })
            .await
            .map(String::as_str)
    }
}

fn hash_blocking(
    algorithm: PasswordAlgorithm,
    bcrypt_cost: u32,
    plaintext: &str,
) -> Result<String, PasswordError> {
    match algorithm {
        PasswordAlgorithm::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| PasswordError::Hash(e.to_string()))
        }
        PasswordAlgorithm::Bcrypt => {
            bcrypt::hash(plaintext, bcrypt_cost).map_err(|e| PasswordError::Hash(e.to_string()))
        }
    }
}

fn verify_blocking(plaintext: &str, hash: &str) -> bool {
    if hash.starts_with("$argon2") {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    } else if hash.starts_with("$2") {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn argon2_hash_verifies_same_password_only() {
        let v = PasswordVerifier::default();
        let hash = v.hash("s3cret-pass").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(v.verify("s3cret-pass", Some(&hash)).await);
        assert!(!v.verify("other-pass", Some(&hash)).await);
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let v = PasswordVerifier::default();
        let a = v.hash("same-password").await.unwrap();
        let b = v.hash("same-password").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn missing_or_empty_hash_never_verifies() {
        let v = PasswordVerifier::default();
        assert!(!v.verify("anything", None).await);
        assert!(!v.verify("", Some("")).await);
    }

    #[tokio::test]
    async fn unknown_hash_format_is_rejected() {
        let v = PasswordVerifier::default();
        assert!(!v.verify("plain", Some("plain")).await);
        assert!(!v.verify("x", Some("$argon2id$garbage")).await);
    }

    #[tokio::test]
    async fn bcrypt_hashes_still_verify_under_argon2_config() {
        let bcrypt = PasswordVerifier::new(PasswordAlgorithm::Bcrypt, 4);
        let hash = bcrypt.hash("legacy-pass").await.unwrap();
        assert!(hash.starts_with("$2"));

        let argon = PasswordVerifier::default();
        assert!(argon.verify("legacy-pass", Some(&hash)).await);
        assert!(!argon.verify("legacy-pasS", Some(&hash)).await);
    }

    #[tokio::test]
    async fn placeholder_check_always_fails_and_uses_configured_algorithm() {
        let v = PasswordVerifier::new(PasswordAlgorithm::Bcrypt, 4);
        assert!(v.placeholder.get().is_none());

        assert!(!v.verify_placeholder("password123").await);
        let first = v.placeholder.get().cloned().expect("placeholder built");
        assert!(first.starts_with("$2"));

        // clones share the placeholder; it is built once
        let clone = v.clone();
        assert!(!clone.verify_placeholder("anything-else").await);
        assert_eq!(clone.placeholder.get(), Some(&first));
    }

    #[tokio::test]
    async fn placeholder_can_be_prepared_up_front() {
        let v = PasswordVerifier::default();
        v.prepare_placeholder().await;
        let hash = v.placeholder.get().expect("placeholder built");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn algorithm_config_names_are_lowercase() {
        let a: PasswordAlgorithm = serde_json::from_str("\"bcrypt\"").unwrap();
        assert_eq!(a, PasswordAlgorithm::Bcrypt);
        assert_eq!(
            serde_json::to_string(&PasswordAlgorithm::Argon2).unwrap(),
            "\"argon2\""
        );
    }
}
