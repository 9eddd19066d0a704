use async_trait::async_trait;
use auth::TokenPair;

use crate::account::models::AccountId;
use crate::domain::authentication::errors::AuthenticationError;

/// Port for login and token operations.
#[async_trait]
pub trait AuthenticationServicePort: Send + Sync + 'static {
    /// Exchange email and password for an access and refresh token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Internal` - Store lookup or token signing failed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthenticationError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, forged, expired, not a refresh
    ///   token, or (when enabled) its account no longer exists
    /// * `Internal` - Store lookup or token signing failed
    async fn refresh_session(&self, refresh_token: &str) -> Result<String, AuthenticationError>;

    /// Resolve a bearer access token to the account it speaks for.
    ///
    /// # Errors
    /// * `InvalidToken` - Token fails verification or its subject is not an account ID
    async fn authenticate(&self, access_token: &str) -> Result<AccountId, AuthenticationError>;
}
