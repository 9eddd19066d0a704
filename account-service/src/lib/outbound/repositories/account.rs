use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AvatarUrl;
use crate::account::models::EmailAddress;
use crate::account::models::PasswordHash;
use crate::account::models::Role;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

const EMAIL_UNIQUE_CONSTRAINT: &str = "accounts_email_key";

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, password_hash, username, avatar_url, email_verified_at,
           last_login_at, role, created_at, updated_at
    FROM accounts
"#;

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of the `accounts` table.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    /// Rebuild the aggregate from a stored row. A row that no longer passes
    /// domain validation is reported as `CorruptRecord`.
    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, reason: String| {
            AccountError::CorruptRecord(format!("account {} {}: {}", record.id, field, reason))
        };

        let now = Utc::now();
        let not_in_future = |field: &str, value: Option<DateTime<Utc>>| match value {
            Some(timestamp) if timestamp > now => Err(corrupt(
                field,
                format!("{} is in the future", timestamp.to_rfc3339()),
            )),
            _ => Ok(value),
        };

        let email_verified_at = not_in_future("email_verified_at", record.email_verified_at)?;
        let last_login_at = not_in_future("last_login_at", record.last_login_at)?;

        let email = EmailAddress::new(record.email).map_err(|e| corrupt("email", e.to_string()))?;
        let username =
            Username::new(record.username).map_err(|e| corrupt("username", e.to_string()))?;
        let avatar_url = record
            .avatar_url
            .map(AvatarUrl::new)
            .transpose()
            .map_err(|e| corrupt("avatar_url", e.to_string()))?;
        let role = record
            .role
            .parse::<Role>()
            .map_err(|e| corrupt("role", e.to_string()))?;

        Ok(Account {
            id: AccountId(record.id),
            email,
            password_hash: PasswordHash::from_hashed(record.password_hash),
            username,
            avatar_url,
            email_verified_at,
            last_login_at,
            role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn map_write_error(error: sqlx::Error, account: &Account) -> AccountError {
    if let Some(db_err) = error.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
            return AccountError::EmailAlreadyExists(account.email.as_str().to_string());
        }
    }
    AccountError::DatabaseError(error.to_string())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, username, avatar_url, email_verified_at,
                last_login_at, role, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.username.as_str())
        .bind(account.avatar_url.as_ref().map(AvatarUrl::as_str))
        .bind(account.email_verified_at)
        .bind(account.last_login_at)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account))?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        record.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        let record =
            sqlx::query_as::<_, AccountRecord>(&format!("{} WHERE email = $1", SELECT_COLUMNS))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        record.map(Account::try_from).transpose()
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2, password_hash = $3, username = $4, avatar_url = $5,
                email_verified_at = $6, last_login_at = $7, role = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.username.as_str())
        .bind(account.avatar_url.as_ref().map(AvatarUrl::as_str))
        .bind(account.email_verified_at)
        .bind(account.last_login_at)
        .bind(account.role.as_str())
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(account.id.to_string()));
        }

        Ok(account)
    }

    async fn delete(&self, id: &AccountId) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            DELETE FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
