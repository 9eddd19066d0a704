//! Token minting and verification.

pub mod claims;
pub mod errors;
pub mod handler;
pub mod issuer;

pub use claims::Claims;
pub use claims::TokenKind;
pub use errors::JwtError;
pub use handler::JwtHandler;
pub use issuer::TokenIssuer;
pub use issuer::TokenPair;
pub use issuer::TokenSettings;
pub use issuer::DEFAULT_ISSUER;
pub use issuer::MAX_TOKEN_LIFETIME_DAYS;
