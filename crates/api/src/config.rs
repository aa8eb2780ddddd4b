use std::str::FromStr;
use std::time::Duration;

use trellis_core::roles::ROLE_ADMIN;

use crate::auth::grants::{GrantError, StaticPermissionChecker};
use crate::auth::jwt::{JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("PERMISSION_GRANTS: {0}")]
    Grants(#[from] GrantError),
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    /// gRPC bind address (default: `0.0.0.0`).
    pub grpc_host: String,
    /// gRPC bind port (default: `50051`).
    pub grpc_port: u16,
    /// Port of the HTTP health endpoint (default: `3000`).
    pub health_port: u16,
    pub db_max_connections: u32,
    /// Bound on every storage call, in milliseconds (default: `1000`).
    pub db_query_timeout_ms: u64,
    /// Per-request deadline in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Raw `role=grant,...;role=...` string.
    pub permission_grants: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default      |
    /// |--------------------------|--------------|
    /// | `DATABASE_URL`           | **required** |
    /// | `GRPC_HOST`              | `0.0.0.0`    |
    /// | `GRPC_PORT`              | `50051`      |
    /// | `HEALTH_PORT`            | `3000`       |
    /// | `DB_MAX_CONNECTIONS`     | `20`         |
    /// | `DB_QUERY_TIMEOUT_MS`    | `1000`       |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`         |
    /// | `JWT_SECRET`             | **required** |
    /// | `JWT_ACCESS_EXPIRY_MINS` | `15`         |
    /// | `PERMISSION_GRANTS`      | `admin=*`    |
    /// | `LOG_FORMAT`             | `text`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let permission_grants =
            lookup("PERMISSION_GRANTS").unwrap_or_else(|| format!("{ROLE_ADMIN}=*"));
        // Fail at startup, not on the first request.
        StaticPermissionChecker::parse(&permission_grants)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            grpc_host: lookup("GRPC_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            grpc_port: var_or(&lookup, "GRPC_PORT", "50051")?,
            health_port: var_or(&lookup, "HEALTH_PORT", "3000")?,
            db_max_connections: var_or(&lookup, "DB_MAX_CONNECTIONS", "20")?,
            db_query_timeout_ms: var_or(&lookup, "DB_QUERY_TIMEOUT_MS", "1000")?,
            request_timeout_secs: var_or(&lookup, "REQUEST_TIMEOUT_SECS", "30")?,
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_token_expiry_mins: var_or(
                    &lookup,
                    "JWT_ACCESS_EXPIRY_MINS",
                    &DEFAULT_ACCESS_EXPIRY_MINS.to_string(),
                )?,
            },
            permission_grants,
            log_format: var_or(&lookup, "LOG_FORMAT", "text")?,
        })
    }

    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.grpc_host, self.grpc_port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.db_query_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse `name` from the lookup, falling back to `default` when unset.
fn var_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
