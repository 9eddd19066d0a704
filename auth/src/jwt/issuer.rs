use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::JwtError;
use super::handler::JwtHandler;

/// Issuer stamped into tokens when none is configured.
pub const DEFAULT_ISSUER: &str = "ptf-auth-service";

/// Longest lifetime, in days, accepted for either token kind.
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 3650;

/// Settings for a [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Settings with the default issuer, a 24 hour access lifetime and a
    /// 7 day refresh lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::days(7),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// An access token and the refresh token minted alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and verifies access and refresh tokens.
///
/// Every token is HS256-signed with the configured secret, carries the
/// configured issuer and a `kind` claim. Verification checks signature,
/// issuer, expiry (no leeway) and kind.
pub struct TokenIssuer {
    handler: JwtHandler,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer from settings.
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty or whitespace
    /// * `InvalidLifetime` - A lifetime is shorter than one second or longer
    ///   than [`MAX_TOKEN_LIFETIME_DAYS`]
    pub fn new(settings: &TokenSettings) -> Result<Self, JwtError> {
        if settings.secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }
        validate_lifetime(TokenKind::Access, settings.access_ttl)?;
        validate_lifetime(TokenKind::Refresh, settings.refresh_ttl)?;

        Ok(Self {
            handler: JwtHandler::new(settings.secret.as_bytes()).with_issuer(&settings.issuer),
            issuer: settings.issuer.clone(),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        })
    }

    /// Issue an access and a refresh token for `subject`, both dated now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_token_pair(&self, subject: &str) -> Result<TokenPair, JwtError> {
        self.issue_token_pair_at(subject, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`.
    pub fn issue_token_pair_at(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue_at(subject, TokenKind::Access, now)?,
            refresh_token: self.issue_at(subject, TokenKind::Refresh, now)?,
        })
    }

    /// Issue a single token of `kind` for `subject` dated `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims::new(subject, &self.issuer, kind, now, lifetime)?;

        self.handler.encode(&claims)
    }

    /// Verify a token and require it to be of `expected` kind.
    ///
    /// # Returns
    /// The verified claims
    ///
    /// # Errors
    /// Any verification failure from [`JwtHandler::decode`], or
    /// `KindMismatch` when the token is of the other kind.
    pub fn verify_token(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims: Claims = self.handler.decode(token)?;

        if claims.kind != expected {
            return Err(JwtError::KindMismatch {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_token(token, TokenKind::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_token(token, TokenKind::Refresh)
    }

    /// Exchange a valid refresh token for a new access token for the same
    /// subject. The refresh token itself is not rotated.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String, JwtError> {
        self.refresh_access_token_at(refresh_token, Utc::now())
    }

    pub fn refresh_access_token_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = self.verify_refresh_token(refresh_token)?;

        self.issue_at(claims.subject(), TokenKind::Access, now)
    }
}

fn validate_lifetime(kind: TokenKind, lifetime: Duration) -> Result<(), JwtError> {
    let in_range = lifetime >= Duration::seconds(1)
        && lifetime <= Duration::days(MAX_TOKEN_LIFETIME_DAYS)
        && Utc::now().checked_add_signed(lifetime).is_some();

    if in_range {
        Ok(())
    } else {
        Err(JwtError::InvalidLifetime(kind))
    }
}
