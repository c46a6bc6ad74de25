//! API server configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY (or JWT_SECRET) must be set to a non-empty value")]
    MissingSecret,

    #[error("Unknown environment '{0}' (expected 'production' or 'development')")]
    UnknownEnvironment(String),
}

/// Deployment environment. Decides whether error responses carry diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// Whether error responses may include internal detail.
    pub fn exposes_error_detail(self) -> bool {
        self == Environment::Development
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// Controls error detail in responses.
    pub environment: Environment,
    /// Directory holding uploaded documents.
    pub upload_dir: PathBuf,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

/// Resolve the signing secret: env var `SECRET_KEY` → `JWT_SECRET`.
///
/// There is no generated fallback; a missing secret stops startup.
pub fn resolve_jwt_secret() -> Result<String, ConfigError> {
    ["SECRET_KEY", "JWT_SECRET"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|secret| !secret.is_empty())
        .ok_or(ConfigError::MissingSecret)
}
