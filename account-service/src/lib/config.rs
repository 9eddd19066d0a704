use std::env;
use std::fmt;

use auth::TokenSettings;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    /// Empty means any origin is allowed.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_expiration_hours")]
    pub access_expiration_hours: i64,
    #[serde(default = "default_refresh_expiration_hours")]
    pub refresh_expiration_hours: i64,
    /// Re-check that the account still exists before honoring a refresh token.
    #[serde(default)]
    pub verify_account_on_refresh: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_issuer() -> String {
    auth::jwt::DEFAULT_ISSUER.to_string()
}

fn default_access_expiration_hours() -> i64 {
    24
}

fn default_refresh_expiration_hours() -> i64 {
    168
}

impl JwtConfig {
    /// Token settings for [`auth::Authenticator::new`]. The secret and the
    /// lifetime bounds are checked there.
    ///
    /// # Errors
    /// * `ConfigError::Message` - An expiration in hours does not fit a duration
    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        let access_ttl =
            hours_to_duration("jwt.access_expiration_hours", self.access_expiration_hours)?;
        let refresh_ttl =
            hours_to_duration("jwt.refresh_expiration_hours", self.refresh_expiration_hours)?;

        Ok(TokenSettings::new(self.secret.clone())
            .with_issuer(self.issuer.clone())
            .with_access_ttl(access_ttl)
            .with_refresh_ttl(refresh_ttl))
    }
}

fn hours_to_duration(key: &str, hours: i64) -> Result<Duration, ConfigError> {
    Duration::try_hours(hours)
        .ok_or_else(|| ConfigError::Message(format!("{} is out of range: {}", key, hours)))
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_expiration_hours", &self.access_expiration_hours)
            .field("refresh_expiration_hours", &self.refresh_expiration_hours)
            .field("verify_account_on_refresh", &self.verify_account_on_refresh)
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. `JWT_SECRET_KEY` (signing secret only)
    /// 2. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, JWT__SECRET, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            )
            .set_override_option("jwt.secret", env::var("JWT_SECRET_KEY").ok())?
            .build()?;

        configuration.try_deserialize()
    }
}
