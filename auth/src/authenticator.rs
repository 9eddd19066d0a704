use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenKind;
use crate::jwt::TokenPair;
use crate::jwt::TokenSettings;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `settings` - Signing secret, issuer and token lifetimes
    ///
    /// # Returns
    /// Configured Authenticator instance
    ///
    /// # Errors
    /// * `JwtError` - Settings are unusable (empty secret, zero lifetime)
    pub fn new(settings: &TokenSettings) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(settings)?,
        })
    }

    /// The hasher used for credentials; it is `Copy`, so callers can move it
    /// into a blocking task.
    pub fn password_hasher(&self) -> PasswordHasher {
        self.password_hasher
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Reject a login for an account that does not exist.
    ///
    /// Performs one full password verification first, so the rejection takes
    /// as long as a wrong password against a stored hash.
    pub fn reject_unknown_account(&self, password: &str) -> AuthenticationError {
        self.password_hasher.verify_placeholder(password);
        AuthenticationError::InvalidCredentials
    }

    /// Verify credentials and issue a token pair.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Account identifier to put into the tokens
    ///
    /// # Returns
    /// Access and refresh tokens
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_issuer.issue_token_pair(subject)?)
    }

    /// Issue a token pair without password verification.
    pub fn issue_token_pair(&self, subject: &str) -> Result<TokenPair, JwtError> {
        self.token_issuer.issue_token_pair(subject)
    }

    /// Issue a fresh access token for `subject` dated now.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, JwtError> {
        self.token_issuer.issue_at(subject, TokenKind::Access, Utc::now())
    }

    /// Validate an access token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_issuer.verify_access_token(token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_issuer.verify_refresh_token(token)
    }

    /// Exchange a refresh token for a new access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String, JwtError> {
        self.token_issuer.refresh_access_token(refresh_token)
    }
}
