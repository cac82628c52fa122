use std::sync::OnceLock;

use thiserror::Error;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// Lowest cost bcrypt accepts
#[cfg(test)]
const HASH_COST: u32 = 4;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Hash a password with bcrypt. Runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
        .map_err(PasswordError::from)
}

/// Check `password` against a stored hash. A malformed hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

// Hash checked when no account matches, so a miss costs as much as a hit
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Run a bcrypt verification against a throwaway hash, for sign-ins
/// naming an unknown account
pub async fn verify_dummy_password(password: &str) {
    let password = password.to_string();
    let _ = tokio::task::spawn_blocking(move || {
        let hash = DUMMY_HASH.get_or_init(|| bcrypt::hash("no-such-account", HASH_COST).ok());
        if let Some(hash) = hash {
            let _ = bcrypt::verify(password, hash);
        }
    })
    .await;
}
