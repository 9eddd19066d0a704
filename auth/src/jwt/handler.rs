use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding compact HS256 tokens.
///
/// Generic over the claims type. Decoding pins the algorithm: the header is
/// inspected before any signature work and anything other than HS256
/// (including `none`) is refused.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

/// The only header field inspected ahead of signature verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm, zero leeway and
    /// `exp`/`sub` as required claims
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Rotating the secret invalidates every outstanding token
    pub fn new(secret: &[u8]) -> Self {
        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        }
    }

    /// Only accept tokens carrying this `iss` claim.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Encode claims into a JWT token.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode (must implement Serialize)
    ///
    /// # Returns
    /// JWT token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// # Arguments
    /// * `token` - JWT token string to decode
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `Malformed` - Token is not a three-part base64url/JSON structure
    /// * `UnsupportedAlgorithm` - Header declares anything but HS256
    /// * `InvalidSignature` - Signature does not match the configured secret
    /// * `Expired` - `exp` is in the past
    /// * `Invalid` - Any other claim check failed (issuer, missing claim)
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        self.ensure_algorithm(token)?;

        let token_data = decode::<T>(token, &self.decoding_key, &self.validation)?;

        Ok(token_data.claims)
    }

    fn ensure_algorithm(&self, token: &str) -> Result<(), JwtError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(JwtError::Malformed(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        }

        let raw_header = URL_SAFE_NO_PAD
            .decode(segments[0])
            .map_err(|e| JwtError::Malformed(format!("header is not base64url: {}", e)))?;
        let header: RawHeader = serde_json::from_slice(&raw_header)
            .map_err(|e| JwtError::Malformed(format!("header is not valid JSON: {}", e)))?;

        match header.alg.parse::<Algorithm>() {
            Ok(algorithm) if algorithm == self.algorithm => Ok(()),
            _ => Err(JwtError::UnsupportedAlgorithm(header.alg)),
        }
    }
}
