use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Discriminates short-lived access tokens from long-lived refresh tokens.
///
/// Signed into every token so one kind can never be replayed as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Wire name of the kind ("access" or "refresh").
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set carried by every token this crate mints.
///
/// Standard RFC 7519 names are used on the wire (`sub`, `iss`, `exp`, `iat`)
/// plus the private `kind` claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Access or refresh
    pub kind: TokenKind,
}

impl Claims {
    /// Build claims for a subject issued at `issued_at` and valid for `lifetime`.
    ///
    /// # Arguments
    /// * `subject` - Account identifier the token speaks for
    /// * `issuer` - Issuer string stamped into the token
    /// * `kind` - Access or refresh
    /// * `issued_at` - Issuance instant
    /// * `lifetime` - Time until expiry
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry falls outside the representable date range
    pub fn new(
        subject: impl ToString,
        issuer: impl ToString,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = issued_at.checked_add_signed(lifetime).ok_or_else(|| {
            JwtError::EncodingFailed(format!("{} token expiry is out of range", kind))
        })?;

        Ok(Self {
            sub: subject.to_string(),
            iss: issuer.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            kind,
        })
    }

    /// Subject (account identifier).
    pub fn subject(&self) -> &str {
        &self.sub
    }
}
