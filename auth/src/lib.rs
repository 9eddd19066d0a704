//! Authentication primitives
//!
//! - Credential hashing (Argon2id, PHC strings)
//! - HS256 access and refresh tokens with issuer, expiry and kind checks
//! - An [`Authenticator`] tying the two together
//!
//! The crate knows nothing about accounts or storage; services adapt it
//! behind their own ports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password1").unwrap();
//! assert!(hasher.verify("my_password1", &hash));
//! assert!(!hasher.verify("other_password1", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenIssuer, TokenSettings};
//!
//! let issuer = TokenIssuer::new(&TokenSettings::new("secret_key_at_least_32_bytes_long!")).unwrap();
//! let pair = issuer.issue_token_pair("user123").unwrap();
//!
//! let claims = issuer.verify_access_token(&pair.access_token).unwrap();
//! assert_eq!(claims.subject(), "user123");
//!
//! // A refresh token is never accepted where an access token is expected
//! assert!(issuer.verify_access_token(&pair.refresh_token).is_err());
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenSettings};
//!
//! let auth = Authenticator::new(&TokenSettings::new("secret_key_at_least_32_bytes_long!")).unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue tokens
//! let pair = auth.authenticate("password123", &hash, "user123").unwrap();
//!
//! // Later: trade the refresh token for a new access token
//! let access_token = auth.refresh_access_token(&pair.refresh_token).unwrap();
//! let claims = auth.validate_access_token(&access_token).unwrap();
//! assert_eq!(claims.subject(), "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenIssuer;
pub use jwt::TokenKind;
pub use jwt::TokenPair;
pub use jwt::TokenSettings;
pub use password::PasswordError;
pub use password::PasswordHasher;
