use thiserror::Error;

/// Failures surfaced by the authentication service.
///
/// Which check failed (unknown email, wrong password, expired or forged
/// token) is logged, never returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal authentication failure")]
    Internal,
}
