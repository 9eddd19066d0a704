use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::PasswordHash;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;

/// Domain service implementation for registration and profile operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
pub struct AccountService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    password_hasher: PasswordHasher,
}

impl<AR> AccountService<AR>
where
    AR: AccountRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account persistence implementation
    /// * `password_hasher` - Hasher used for new credentials
    pub fn new(repository: Arc<AR>, password_hasher: PasswordHasher) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }
}

#[async_trait]
impl<AR> AccountServicePort for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn register(&self, command: RegisterAccountCommand) -> Result<Account, AccountError> {
        let RegisterAccountCommand {
            email,
            username,
            password,
        } = command;

        // Argon2 is CPU bound
        let hasher = self.password_hasher;
        let password_hash =
            tokio::task::spawn_blocking(move || hasher.hash(password.expose())).await??;

        let account = Account::register(
            email,
            PasswordHash::from_hashed(password_hash),
            username,
            Utc::now(),
        );

        let created_account = self.repository.create(account).await?;

        tracing::info!(account_id = %created_account.id, "Account registered");

        Ok(created_account)
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError> {
        let mut account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))?;

        let now = Utc::now();
        account.change_username(command.username, now);

        if let Some(avatar_url) = command.avatar_url {
            account.change_avatar_url(avatar_url, now);
        }

        let updated_account = self.repository.update(account).await?;

        tracing::info!(account_id = %updated_account.id, "Account profile updated");

        Ok(updated_account)
    }

    async fn delete_account(&self, id: &AccountId) -> Result<(), AccountError> {
        self.repository.delete(id).await?;

        tracing::info!(account_id = %id, "Account deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::account::models::AvatarUrl;
    use crate::account::models::EmailAddress;
    use crate::account::models::Password;
    use crate::account::models::Role;
    use crate::account::models::Username;

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

    fn existing_account() -> Account {
        Account::register(
            EmailAddress::new("user@example.com".to_string()).unwrap(),
            PasswordHash::from_hashed("$argon2id$test_hash".to_string()),
            Username::new("olduser".to_string()).unwrap(),
            Utc::now() - chrono::Duration::days(1),
        )
    }

    fn register_command() -> RegisterAccountCommand {
        RegisterAccountCommand::new(
            EmailAddress::new("user@example.com".to_string()).unwrap(),
            Username::new("testuser".to_string()).unwrap(),
            Password::new("Password123!".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_create()
            .withf(|account| {
                account.username.as_str() == "testuser"
                    && account.email.as_str() == "user@example.com"
                    && account.password_hash.as_str().starts_with("$argon2")
                    && account.role == Role::User
            })
            .times(1)
            .returning(|account| Ok(account));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let account = service.register(register_command()).await.unwrap();
        assert_eq!(account.username.as_str(), "testuser");

        // Stored hash verifies the original password and never contains it
        assert!(!account.password_hash.as_str().contains("Password123!"));
        assert!(PasswordHasher::new().verify("Password123!", account.password_hash.as_str()));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestAccountRepository::new();

        repository.expect_create().times(1).returning(|account| {
            Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ))
        });

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let result = service.register(register_command()).await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_get_account_success() {
        let mut repository = MockTestAccountRepository::new();

        let expected_account = existing_account();
        let account_id = expected_account.id;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(move |_| Ok(Some(expected_account.clone())));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let account = service.get_account(&account_id).await.unwrap();
        assert_eq!(account.id, account_id);
        assert_eq!(account.username.as_str(), "olduser");
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let result = service.get_account(&AccountId::new()).await;
        assert!(matches!(result.unwrap_err(), AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_profile_with_avatar() {
        let mut repository = MockTestAccountRepository::new();

        let existing = existing_account();
        let account_id = existing.id;
        let created_at = existing.created_at;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        repository
            .expect_update()
            .withf(|account| {
                account.username.as_str() == "newuser"
                    && account.avatar_url.as_ref().map(AvatarUrl::as_str)
                        == Some("https://example.com/avatar.png")
            })
            .times(1)
            .returning(|account| Ok(account));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let command = UpdateProfileCommand {
            username: Username::new("newuser".to_string()).unwrap(),
            avatar_url: Some(AvatarUrl::new("https://example.com/avatar.png".to_string()).unwrap()),
        };

        let account = service.update_profile(&account_id, command).await.unwrap();
        assert_eq!(account.username.as_str(), "newuser");
        assert_eq!(account.created_at, created_at);
        assert!(account.updated_at > created_at);
    }

    #[tokio::test]
    async fn test_update_profile_without_avatar_keeps_existing() {
        let mut repository = MockTestAccountRepository::new();

        let mut existing = existing_account();
        existing.avatar_url =
            Some(AvatarUrl::new("https://example.com/old.png".to_string()).unwrap());
        let account_id = existing.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        repository
            .expect_update()
            .withf(|account| {
                account.avatar_url.as_ref().map(AvatarUrl::as_str)
                    == Some("https://example.com/old.png")
            })
            .times(1)
            .returning(|account| Ok(account));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let command = UpdateProfileCommand {
            username: Username::new("newuser".to_string()).unwrap(),
            avatar_url: None,
        };

        let account = service.update_profile(&account_id, command).await.unwrap();
        assert_eq!(account.username.as_str(), "newuser");
    }

    #[tokio::test]
    async fn test_update_profile_not_found() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_update().times(0);

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let command = UpdateProfileCommand {
            username: Username::new("newuser".to_string()).unwrap(),
            avatar_url: None,
        };

        let result = service.update_profile(&AccountId::new(), command).await;
        assert!(matches!(result.unwrap_err(), AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_account_success() {
        let mut repository = MockTestAccountRepository::new();

        let account_id = AccountId::new();

        repository
            .expect_delete()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        assert!(service.delete_account(&account_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_account_not_found() {
        let mut repository = MockTestAccountRepository::new();

        let account_id = AccountId::new();

        repository
            .expect_delete()
            .times(1)
            .returning(move |_| Err(AccountError::NotFound(account_id.to_string())));

        let service = AccountService::new(Arc::new(repository), PasswordHasher::new());

        let result = service.delete_account(&account_id).await;
        assert!(matches!(result.unwrap_err(), AccountError::NotFound(_)));
    }
}
