//! Server configuration loaded from environment variables

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, e.g. `0.0.0.0:8080`
    pub bind_address: String,
    /// PostgreSQL URL. `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Run embedded migrations at startup
    pub run_migrations: bool,
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// CORS allow-list
    pub allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database (optional)
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        let run_migrations = std::env::var("RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RUN_MIGRATIONS"))?;

        // Auth
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiry_hours: i64 = std::env::var("JWT_EXPIRY_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("JWT_EXPIRY_HOURS"))?;
        if jwt_expiry_hours <= 0 {
            return Err(ConfigError::Invalid("JWT_EXPIRY_HOURS"));
        }

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let log_format = match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            run_migrations,
            jwt_secret,
            jwt_expiry_hours,
            allowed_origins,
            log_format,
        })
    }

    /// Configuration for tests and local runs without a database
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            database_url: None,
            database_max_connections: 1,
            run_migrations: false,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiry_hours: 1,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            log_format: LogFormat::Text,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
