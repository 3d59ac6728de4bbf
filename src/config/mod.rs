//! Configuration Module
//!
//! Environment-driven configuration for the server, storage and token
//! settings. Values may come from a `.env` file loaded at startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::database::DatabaseConfig;
use crate::utils::error::AppError;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Environment variable helpers
pub mod env {
    use std::env;

    use super::ConfigError;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }
}

/// Where account data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process memory; data is lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "STORAGE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage backend selection
    pub storage: StorageBackend,

    /// Database configuration; absent with the memory backend
    pub database: Option<DatabaseConfig>,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    /// Seconds between sweeps of expired and revoked sessions; 0 disables
    pub session_cleanup_interval_secs: u64,
}

/// Longest access token lifetime accepted, one year
pub const MAX_ACCESS_TOKEN_HOURS: i64 = 24 * 365;

/// Longest refresh token lifetime accepted, ten years
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 3650;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_hours: i64,
    pub refresh_token_expires_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_expires_hours", &self.access_token_expires_hours)
            .field("refresh_token_expires_days", &self.refresh_token_expires_days)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
            log_level: env::get_string("LOG_LEVEL", "info"),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            session_cleanup_interval_secs: env::get_u64("SESSION_CLEANUP_INTERVAL_SECS", 3600),
        }
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_secret: env::get_required("JWT_ACCESS_SECRET")?,
            refresh_secret: env::get_required("JWT_REFRESH_SECRET")?,
            access_token_expires_hours: env::get_i64("JWT_ACCESS_EXPIRES_HOURS", 1),
            refresh_token_expires_days: env::get_i64("JWT_REFRESH_EXPIRES_DAYS", 30),
        })
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.access_token_expires_hours)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_expires_days)
    }
}

/// Database settings from `DATABASE_URL` and the `DB_*` variables
pub fn database_config_from_env() -> Result<DatabaseConfig, ConfigError> {
    Ok(DatabaseConfig {
        url: env::get_required("DATABASE_URL")?,
        max_connections: env::get_u32("DB_MAX_CONNECTIONS", 20),
        min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
        connect_timeout: Duration::from_secs(env::get_u64("DB_CONNECT_TIMEOUT", 30)),
        idle_timeout: Duration::from_secs(env::get_u64("DB_IDLE_TIMEOUT", 600)),
        max_lifetime: Duration::from_secs(env::get_u64("DB_MAX_LIFETIME", 3600)),
    })
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage: StorageBackend = env::get_string("STORAGE_BACKEND", "postgres").parse()?;
        let database = match storage {
            StorageBackend::Postgres => Some(database_config_from_env()?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            server: ServerConfig::from_env(),
            storage,
            database,
            jwt: JwtConfig::from_env()?,
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".into(),
            ));
        }

        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::ValidationError(
                    "Database max_connections must be greater than 0".into(),
                ));
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::ValidationError(
                    "Database min_connections cannot be greater than max_connections".into(),
                ));
            }
        } else if self.storage == StorageBackend::Postgres {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".into()));
        }

        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT secrets cannot be empty".into(),
            ));
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(ConfigError::ValidationError(
                "JWT access and refresh secrets must be different".into(),
            ));
        }

        if self.jwt.access_token_expires_hours <= 0 || self.jwt.refresh_token_expires_days <= 0 {
            return Err(ConfigError::ValidationError(
                "Token lifetimes must be positive".into(),
            ));
        }

        if self.jwt.access_token_expires_hours > MAX_ACCESS_TOKEN_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "JWT_ACCESS_EXPIRES_HOURS cannot exceed {}",
                MAX_ACCESS_TOKEN_HOURS
            )));
        }

        if self.jwt.refresh_token_expires_days > MAX_REFRESH_TOKEN_DAYS {
            return Err(ConfigError::ValidationError(format!(
                "JWT_REFRESH_EXPIRES_DAYS cannot exceed {}",
                MAX_REFRESH_TOKEN_DAYS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                log_level: "info".to_string(),
                cors_origins: vec!["*".to_string()],
                session_cleanup_interval_secs: 3600,
            },
            storage: StorageBackend::Postgres,
            database: Some(DatabaseConfig::default()),
            jwt: JwtConfig {
                access_secret: "access".to_string(),
                refresh_secret: "refresh".to_string(),
                access_token_expires_hours: 1,
                refresh_token_expires_days: 30,
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
        assert_eq!(config().server.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_same_jwt_secrets_rejected() {
        let mut config = config();
        config.jwt.refresh_secret = config.jwt.access_secret.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_postgres_requires_database() {
        let mut config = config();
        config.database = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(_))));

        config.storage = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_connection_bounds() {
        let mut config = config();
        if let Some(database) = config.database.as_mut() {
            database.min_connections = 50;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_lifetime_limits() {
        let mut config = config();
        config.jwt.access_token_expires_hours = MAX_ACCESS_TOKEN_HOURS;
        config.jwt.refresh_token_expires_days = MAX_REFRESH_TOKEN_DAYS;
        assert!(config.validate().is_ok());

        config.jwt.refresh_token_expires_days = 100_000_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.jwt.refresh_token_expires_days = MAX_REFRESH_TOKEN_DAYS;
        config.jwt.access_token_expires_hours = MAX_ACCESS_TOKEN_HOURS + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.jwt.access_token_expires_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!(
            "Memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert_eq!(
            "postgresql".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_jwt_config_debug_redacts_secrets() {
        let debug = format!("{:?}", config().jwt);
        assert!(!debug.contains("\"access\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_env_helpers() {
        assert_eq!(env::get_u32("ACCOUNT_SERVICE_TEST_NONEXISTENT_U32", 42), 42);
        assert_eq!(
            env::get_string("ACCOUNT_SERVICE_TEST_NONEXISTENT_STRING", "default"),
            "default"
        );
        assert!(matches!(
            env::get_required("ACCOUNT_SERVICE_TEST_NONEXISTENT_REQUIRED"),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }
}
