use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use super::claims::TokenKind;

/// Error type for JWT operations.
///
/// Variants are fine-grained for logging. Callers facing
/// clients must collapse every verification variant into one opaque failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token lifetime for {0} tokens must be between one second and ten years")]
    InvalidLifetime(TokenKind),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token algorithm is not supported: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Expected a {expected} token but got a {actual} token")]
    KindMismatch {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Token is invalid: {0}")]
    Invalid(String),
}

impl From<JsonWebTokenError> for JwtError {
    fn from(error: JsonWebTokenError) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                JwtError::UnsupportedAlgorithm(error.to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => JwtError::Malformed(error.to_string()),
            _ => JwtError::Invalid(error.to_string()),
        }
    }
}
