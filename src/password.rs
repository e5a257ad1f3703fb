//! Password hashing with bcrypt.
//!
//! bcrypt is deliberately slow, so both operations run on Tokio's blocking
//! pool instead of the request task.

use tracing::debug;

use crate::error::PasswordError;

/// Default bcrypt cost factor.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Lowest cost bcrypt accepts.
pub const MIN_HASH_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_HASH_COST: u32 = 31;

/// Check whether `cost` is a valid bcrypt cost factor.
pub fn is_valid_cost(cost: u32) -> bool {
    (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost)
}

/// Hash `password` with a fresh random salt.
pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `password` against a stored bcrypt `hash`.
///
/// A malformed hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            debug!("Stored password hash rejected: {}", e);
            false
        }
        Err(e) => {
            debug!("Password verification task failed: {}", e);
            false
        }
    }
}
