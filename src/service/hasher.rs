//! Password hashing capability. The service only sees `hash` and `verify`.

use crate::error::AppError;
use async_trait::async_trait;

/// bcrypt work factor applied to every stored hash.
pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// `Ok(false)` for a wrong password and for a stored value that is not a valid hash.
    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError>;
}

/// bcrypt on the blocking thread pool so request tasks keep moving while it works.
#[derive(Clone, Copy, Debug)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        BcryptHasher { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        BcryptHasher::new(BCRYPT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost).map_err(|e| AppError::Hashing(e.to_string())))
            .await
            .map_err(|e| AppError::Hashing(format!("hash task failed: {}", e)))?
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
            .await
            .map_err(|e| AppError::Hashing(format!("verify task failed: {}", e)))?;
        match outcome {
            Ok(matched) => Ok(matched),
            Err(e) => {
                tracing::debug!(error = %e, "stored value is not a bcrypt hash");
                Ok(false)
            }
        }
    }
}
