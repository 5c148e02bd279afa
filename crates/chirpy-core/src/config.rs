//! Chirpy Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! sensible defaults for development. Secrets are read once at startup and
//! are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Development-only signing secret used by `AppConfig::default()`
const DEV_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Upper bound for `access_token_ttl_secs` (7 days)
pub const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upper bound for `refresh_token_ttl_days` (10 years)
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token and credential settings
    pub auth: AuthConfig,

    /// Chirp content rules
    pub chirps: ChirpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Deployment platform (enables admin reset on dev)
    pub platform: Platform,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// `JWT_SECRET` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.auth.jwt_secret = String::new();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        self.validate()?;
        Ok(self)
    }

    /// Check invariants that defaults cannot guarantee
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        let access_ttl = self.auth.access_token_ttl_secs;
        if access_ttl == 0 || access_ttl > MAX_ACCESS_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "ACCESS_TOKEN_TTL_SECS".to_string(),
                value: access_ttl.to_string(),
            });
        }
        let refresh_ttl = self.auth.refresh_token_ttl_days;
        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&refresh_ttl) {
            return Err(ConfigError::InvalidValue {
                key: "REFRESH_TOKEN_TTL_DAYS".to_string(),
                value: refresh_ttl.to_string(),
            });
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.server.port = port;
        }
        if let Ok(root) = std::env::var("FILESERVER_ROOT") {
            self.server.fileserver_root = PathBuf::from(root);
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Ok(url) = std::env::var("DB_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            self.database.url = url;
        }
        if let Some(size) = parse_env("DB_POOL_SIZE")? {
            self.database.pool_size = size;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("POLKA_KEY") {
            self.auth.polka_key = key;
        }
        if let Some(ttl) = parse_env("ACCESS_TOKEN_TTL_SECS")? {
            self.auth.access_token_ttl_secs = ttl;
        }
        if let Some(days) = parse_env("REFRESH_TOKEN_TTL_DAYS")? {
            self.auth.refresh_token_ttl_days = days;
        }

        // Chirps
        if let Some(len) = parse_env("MAX_CHIRP_LENGTH")? {
            self.chirps.max_length = len;
        }

        // Platform
        if let Ok(platform) = std::env::var("PLATFORM") {
            self.platform = Platform::parse(&platform);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("LOG_JSON")? {
            self.logging.json_format = json;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory served under `/app/`
    pub fileserver_root: PathBuf,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            fileserver_root: PathBuf::from("."),
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Empty selects the in-memory store.
    pub url: String,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: 10,
        }
    }
}

/// Token and credential configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Shared secret for the Polka payment webhook
    pub polka_key: String,

    /// Access token lifetime in seconds (default: 1 hour)
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in days (default: 60 days)
    pub refresh_token_ttl_days: i64,

    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,

    /// Argon2 iterations
    pub hash_iterations: u32,

    /// Argon2 lanes
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            polka_key: String::new(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_days: 60,
            hash_memory_kib: 65536, // 64 MB
            hash_iterations: 3,
            hash_parallelism: 4,
        }
    }
}

// Secrets stay out of Debug output
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("polka_key", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

/// Chirp content rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChirpConfig {
    /// Maximum chirp body length in characters
    pub max_length: usize,

    /// Words replaced with `****` (matched case-insensitively)
    pub banned_words: Vec<String>,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            max_length: 140,
            banned_words: vec![
                "kerfuffle".to_string(),
                "sharbert".to_string(),
                "fornax".to_string(),
            ],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when RUST_LOG is unset
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "chirpy_api=debug,tower_http=debug".to_string(),
            json_format: false,
        }
    }
}

/// Deployment platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Prod,
}

impl Platform {
    /// Anything other than `dev` is treated as production
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("dev") {
            Self::Dev
        } else {
            Self::Prod
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_token_ttl_days, 60);
        assert_eq!(config.chirps.max_length, 140);
        assert_eq!(config.platform, Platform::Prod);
        assert!(config.database.url.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::parse("dev"), Platform::Dev);
        assert_eq!(Platform::parse("DEV"), Platform::Dev);
        assert_eq!(Platform::parse("prod"), Platform::Prod);
        assert_eq!(Platform::parse(""), Platform::Prod);
        assert!(Platform::Dev.is_dev());
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(key)) if key == "JWT_SECRET"
        ));
    }

    #[test]
    fn test_validate_token_lifetimes() {
        let invalid_key = |config: &AppConfig| match config.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => Some(key),
            _ => None,
        };

        for ttl in [0, MAX_ACCESS_TOKEN_TTL_SECS + 1, u64::MAX] {
            let mut config = AppConfig::default();
            config.auth.access_token_ttl_secs = ttl;
            assert_eq!(invalid_key(&config).as_deref(), Some("ACCESS_TOKEN_TTL_SECS"));
        }

        for days in [0, -1, MAX_REFRESH_TOKEN_TTL_DAYS + 1, i64::MAX] {
            let mut config = AppConfig::default();
            config.auth.refresh_token_ttl_days = days;
            assert_eq!(invalid_key(&config).as_deref(), Some("REFRESH_TOKEN_TTL_DAYS"));
        }

        let mut config = AppConfig::default();
        config.auth.access_token_ttl_secs = MAX_ACCESS_TOKEN_TTL_SECS;
        config.auth.refresh_token_ttl_days = MAX_REFRESH_TOKEN_TTL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            platform = "dev"

            [auth]
            jwt_secret = "from-file"
            polka_key = "f271c81ff7084ee5b99a5091b42d486e"

            [chirps]
            max_length = 280
            "#,
        )
        .unwrap();

        assert!(config.platform.is_dev());
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.chirps.max_length, 280);
        assert_eq!(config.chirps.banned_words.len(), 3);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_auth_config_debug_redacts_secrets() {
        let mut config = AuthConfig::default();
        config.polka_key = "super-secret-key".to_string();
        let debug = format!("{config:?}");

        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains(DEV_JWT_SECRET));
        assert!(debug.contains("<redacted>"));
    }
}
