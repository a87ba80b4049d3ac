//! bcrypt password hashing.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use lazy_static::lazy_static;

lazy_static! {
    /// Hash at the production cost, checked when a login names no known
    /// admin so both failures spend the same bcrypt work.
    static ref DUMMY_HASH: Option<String> = hash("no-such-admin", DEFAULT_COST).ok();
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// bcrypt is CPU-bound, so the comparison runs on the blocking pool. A
/// malformed hash or a panicked task counts as a mismatch.
pub async fn verify_password(plaintext: &str, password_hash: &str) -> bool {
    let plaintext = plaintext.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || verify(&plaintext, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Verify `plaintext` against an admin's hash, or against the dummy hash
/// when there is no such admin. Only a real match returns `true`.
pub async fn verify_admin_password(plaintext: &str, password_hash: Option<&str>) -> bool {
    match password_hash {
        Some(stored) => verify_password(plaintext, stored).await,
        None => {
            // First use hashes at full cost, so keep it off the async workers.
            let dummy = tokio::task::spawn_blocking(|| DUMMY_HASH.clone())
                .await
                .ok()
                .flatten();
            if let Some(dummy) = dummy {
                verify_password(plaintext, &dummy).await;
            }
            false
        }
    }
}

pub fn hash_password(plaintext: &str) -> Result<String, BcryptError> {
    hash(plaintext, DEFAULT_COST)
}
