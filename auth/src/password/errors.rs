use thiserror::Error;

/// Error type for password operations.
///
/// Verification never fails with an error; a bad candidate or a malformed
/// stored hash simply does not verify.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
