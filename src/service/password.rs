//! bcrypt hashing on the blocking pool.

use crate::error::AppError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task: {}", e)))?
        .map_err(AppError::from)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verify task: {}", e)))?;
    match outcome {
        Ok(matched) => Ok(matched),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be parsed");
            Ok(false)
        }
    }
}
