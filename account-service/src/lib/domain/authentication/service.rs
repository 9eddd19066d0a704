use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenPair;

use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::ports::AccountRepository;
use crate::domain::authentication::errors::AuthenticationError;
use crate::domain::authentication::ports::AuthenticationServicePort;

/// Domain service implementation for login and token operations.
///
/// Stateless apart from the shared [`Authenticator`]; tokens are never stored.
pub struct AuthenticationService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    authenticator: Arc<Authenticator>,
    verify_account_on_refresh: bool,
}

impl<AR> AuthenticationService<AR>
where
    AR: AccountRepository,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account lookup by email and ID
    /// * `authenticator` - Credential verification and token issuance
    pub fn new(repository: Arc<AR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
            verify_account_on_refresh: false,
        }
    }

    /// Require the token subject to still exist before honoring a refresh.
    pub fn with_account_check_on_refresh(mut self, enabled: bool) -> Self {
        self.verify_account_on_refresh = enabled;
        self
    }

    async fn ensure_account_exists(&self, subject: &str) -> Result<(), AuthenticationError> {
        let account_id = AccountId::from_string(subject).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token subject is not an account ID");
            AuthenticationError::InvalidToken
        })?;

        match self.repository.find_by_id(&account_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                tracing::debug!(account_id = %account_id, "Refresh token for missing account");
                Err(AuthenticationError::InvalidToken)
            }
            Err(e) => {
                tracing::error!(error = %e, "Account lookup failed during refresh");
                Err(AuthenticationError::Internal)
            }
        }
    }
}

#[async_trait]
impl<AR> AuthenticationServicePort for AuthenticationService<AR>
where
    AR: AccountRepository,
{
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthenticationError> {
        let Ok(email) = EmailAddress::new(email.to_string()) else {
            tracing::debug!("Login attempt with malformed email");
            return Err(AuthenticationError::InvalidCredentials);
        };

        let account = match self.repository.find_by_email(&email).await {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(error = %e, "Account lookup failed during login");
                return Err(AuthenticationError::Internal);
            }
        };

        // Subject and stored hash; none for an unknown email
        let credentials = account.map(|account| {
            (
                account.id.to_string(),
                account.password_hash.as_str().to_string(),
            )
        });
        let account_id = credentials.as_ref().map(|(subject, _)| subject.clone());
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();

        // Argon2 is CPU bound. An unknown email still pays for one verification.
        let outcome = tokio::task::spawn_blocking(move || match credentials {
            Some((subject, stored_hash)) => {
                authenticator.authenticate(&password, &stored_hash, &subject)
            }
            None => Err(authenticator.reject_unknown_account(&password)),
        })
        .await;

        match outcome {
            Ok(Ok(token_pair)) => {
                tracing::info!(account_id = account_id.as_deref(), "Login succeeded");
                Ok(token_pair)
            }
            Ok(Err(auth::AuthenticationError::InvalidCredentials)) => {
                match account_id {
                    Some(account_id) => {
                        tracing::debug!(account_id = %account_id, "Login attempt with wrong password");
                    }
                    None => tracing::debug!("Login attempt for unknown email"),
                }
                Err(AuthenticationError::InvalidCredentials)
            }
            Ok(Err(auth::AuthenticationError::JwtError(e))) => {
                tracing::error!(error = %e, "Token issuance failed during login");
                Err(AuthenticationError::Internal)
            }
            Err(e) => {
                tracing::error!(error = %e, "Credential verification task failed");
                Err(AuthenticationError::Internal)
            }
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<String, AuthenticationError> {
        let claims = self
            .authenticator
            .verify_refresh_token(refresh_token)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Refresh token rejected");
                AuthenticationError::InvalidToken
            })?;

        if self.verify_account_on_refresh {
            self.ensure_account_exists(claims.subject()).await?;
        }

        self.authenticator
            .issue_access_token(claims.subject())
            .map_err(|e| {
                tracing::error!(error = %e, "Token issuance failed during refresh");
                AuthenticationError::Internal
            })
    }

    async fn authenticate(&self, access_token: &str) -> Result<AccountId, AuthenticationError> {
        let claims = self
            .authenticator
            .validate_access_token(access_token)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Access token rejected");
                AuthenticationError::InvalidToken
            })?;

        AccountId::from_string(claims.subject()).map_err(|e| {
            tracing::warn!(error = %e, "Access token subject is not an account ID");
            AuthenticationError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use auth::PasswordHasher;
    use auth::TokenKind;
    use auth::TokenSettings;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::account::errors::AccountError;
    use crate::account::models::Account;
    use crate::account::models::PasswordHash;
    use crate::account::models::Username;

    const SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn create(&self, account: Account) -> Result<Account, AccountError>;
            async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError>;
            async fn update(&self, account: Account) -> Result<Account, AccountError>;
            async fn delete(&self, id: &AccountId) -> Result<(), AccountError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(&TokenSettings::new(SECRET)).unwrap())
    }

    fn stored_account() -> Account {
        let hash = PasswordHasher::new().hash("Password123!").unwrap();
        Account::register(
            EmailAddress::new("user@example.com".to_string()).unwrap(),
            PasswordHash::from_hashed(hash),
            Username::new("user".to_string()).unwrap(),
            Utc::now(),
        )
    }

    fn repository_with(account: Account) -> MockTestAccountRepository {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_email()
            .returning(move |email| {
                if email == &account.email {
                    Ok(Some(account.clone()))
                } else {
                    Ok(None)
                }
            });
        repository
    }

    #[tokio::test]
    async fn test_login_success() {
        let account = stored_account();
        let account_id = account.id;
        let authenticator = authenticator();
        let service =
            AuthenticationService::new(Arc::new(repository_with(account)), authenticator.clone());

        let pair = service
            .login("user@example.com", "Password123!")
            .await
            .unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);

        let claims = authenticator
            .validate_access_token(&pair.access_token)
            .unwrap();
        assert_eq!(claims.subject(), account_id.to_string());
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_are_indistinguishable() {
        let service =
            AuthenticationService::new(Arc::new(repository_with(stored_account())), authenticator());

        let wrong_password = service.login("user@example.com", "wrong").await;
        let unknown_email = service.login("noone@example.com", "Password123!").await;
        let malformed_email = service.login("not-an-email", "Password123!").await;

        assert_eq!(wrong_password, Err(AuthenticationError::InvalidCredentials));
        assert_eq!(unknown_email, wrong_password);
        assert_eq!(malformed_email, wrong_password);
    }

    #[tokio::test]
    async fn test_login_unknown_email_performs_password_verification() {
        let service =
            AuthenticationService::new(Arc::new(repository_with(stored_account())), authenticator());

        let started = Instant::now();
        let wrong_password = service.login("user@example.com", "Password123?").await;
        let wrong_password_elapsed = started.elapsed();

        let started = Instant::now();
        let unknown_email = service.login("noone@example.com", "Password123?").await;
        let unknown_email_elapsed = started.elapsed();

        assert_eq!(wrong_password, Err(AuthenticationError::InvalidCredentials));
        assert_eq!(unknown_email, wrong_password);
        // Both paths run one Argon2 verification
        assert!(
            unknown_email_elapsed * 5 >= wrong_password_elapsed,
            "unknown email took {:?}, wrong password took {:?}",
            unknown_email_elapsed,
            wrong_password_elapsed
        );
    }

    #[tokio::test]
    async fn test_login_with_corrupt_stored_hash() {
        let mut account = stored_account();
        account.password_hash = PasswordHash::from_hashed("garbage".to_string());

        let service = AuthenticationService::new(Arc::new(repository_with(account)), authenticator());

        let result = service.login("user@example.com", "Password123!").await;
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_store_failure_is_internal() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Err(AccountError::DatabaseError("connection refused".to_string())));

        let service = AuthenticationService::new(Arc::new(repository), authenticator());

        let result = service.login("user@example.com", "Password123!").await;
        assert_eq!(result, Err(AuthenticationError::Internal));
    }

    #[tokio::test]
    async fn test_refresh_session_success() {
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();
        repository.expect_find_by_id().times(0);

        let service = AuthenticationService::new(Arc::new(repository), authenticator.clone());

        let account_id = AccountId::new();
        let pair = authenticator
            .issue_token_pair(&account_id.to_string())
            .unwrap();

        let access_token = service.refresh_session(&pair.refresh_token).await.unwrap();

        let claims = authenticator.validate_access_token(&access_token).unwrap();
        assert_eq!(claims.subject(), account_id.to_string());
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_refresh_session_rejects_access_token() {
        let authenticator = authenticator();
        let service = AuthenticationService::new(
            Arc::new(MockTestAccountRepository::new()),
            authenticator.clone(),
        );

        let pair = authenticator
            .issue_token_pair(&AccountId::new().to_string())
            .unwrap();

        let result = service.refresh_session(&pair.access_token).await;
        assert_eq!(result, Err(AuthenticationError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_session_rejects_garbage_and_expired_tokens() {
        let authenticator = authenticator();
        let service = AuthenticationService::new(
            Arc::new(MockTestAccountRepository::new()),
            authenticator.clone(),
        );

        let result = service.refresh_session("invalid.refresh.token").await;
        assert_eq!(result, Err(AuthenticationError::InvalidToken));

        let expired = authenticator
            .token_issuer()
            .issue_at(
                &AccountId::new().to_string(),
                TokenKind::Refresh,
                Utc::now() - Duration::days(8),
            )
            .unwrap();
        let result = service.refresh_session(&expired).await;
        assert_eq!(result, Err(AuthenticationError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_session_checks_account_when_enabled() {
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AuthenticationService::new(Arc::new(repository), authenticator.clone())
            .with_account_check_on_refresh(true);

        let pair = authenticator
            .issue_token_pair(&AccountId::new().to_string())
            .unwrap();

        let result = service.refresh_session(&pair.refresh_token).await;
        assert_eq!(result, Err(AuthenticationError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_session_with_existing_account_when_check_enabled() {
        let account = stored_account();
        let account_id = account.id;
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let service = AuthenticationService::new(Arc::new(repository), authenticator.clone())
            .with_account_check_on_refresh(true);

        let pair = authenticator
            .issue_token_pair(&account_id.to_string())
            .unwrap();

        assert!(service.refresh_session(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_access_token() {
        let authenticator = authenticator();
        let service = AuthenticationService::new(
            Arc::new(MockTestAccountRepository::new()),
            authenticator.clone(),
        );

        let account_id = AccountId::new();
        let pair = authenticator
            .issue_token_pair(&account_id.to_string())
            .unwrap();

        assert_eq!(service.authenticate(&pair.access_token).await, Ok(account_id));
        assert_eq!(
            service.authenticate(&pair.refresh_token).await,
            Err(AuthenticationError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejects_non_uuid_subject() {
        let authenticator = authenticator();
        let service = AuthenticationService::new(
            Arc::new(MockTestAccountRepository::new()),
            authenticator.clone(),
        );

        let pair = authenticator.issue_token_pair("user123").unwrap();

        assert_eq!(
            service.authenticate(&pair.access_token).await,
            Err(AuthenticationError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejects_token_from_other_secret() {
        let other = Authenticator::new(&TokenSettings::new("another-secret-key-of-32-bytes-long")).unwrap();
        let service = AuthenticationService::new(
            Arc::new(MockTestAccountRepository::new()),
            authenticator(),
        );

        let pair = other
            .issue_token_pair(&AccountId::new().to_string())
            .unwrap();

        assert_eq!(
            service.authenticate(&pair.access_token).await,
            Err(AuthenticationError::InvalidToken)
        );
    }
}
