//! Server configuration, populated from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Secret used when `YATUBE_JWT_SECRET` is unset. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "yatube-development-secret-change-me";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid socket address (e.g. 0.0.0.0:8000), got {value:?}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
}

/// Runtime configuration for the API server.
///
/// All fields are populated from environment variables with defaults, so the
/// server can be started with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `YATUBE_BIND` | `0.0.0.0:8000` | TCP socket address to listen on |
/// | `YATUBE_API_BASE` | derived from YATUBE_BIND | Public origin used in pagination links |
/// | `YATUBE_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `YATUBE_JWT_SECRET` | development secret | HS256 signing secret |
/// | `YATUBE_ACCESS_TOKEN_TTL_SECS` | `86400` | Access-token lifetime |
/// | `YATUBE_REFRESH_TOKEN_TTL_SECS` | `604800` | Refresh-token lifetime |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Public origin of the server, without a trailing slash.
    /// Example: `"https://yatube.example.com"`.
    pub api_base: String,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl ServerConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_raw = std::env::var("YATUBE_BIND").unwrap_or_else(|_| "0.0.0.0:8000".into());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::InvalidAddr {
            var: "YATUBE_BIND",
            value: bind_raw.clone(),
        })?;

        let api_base = std::env::var("YATUBE_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{bind_addr}"));

        let jwt_secret = match std::env::var("YATUBE_JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("YATUBE_JWT_SECRET is not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            bind_addr,
            api_base,
            db_path: std::env::var("YATUBE_DB").ok(),
            jwt_secret,
            access_token_ttl: ttl_from_env("YATUBE_ACCESS_TOKEN_TTL_SECS", 86_400)?,
            refresh_token_ttl: ttl_from_env("YATUBE_REFRESH_TOKEN_TTL_SECS", 604_800)?,
        })
    }

    /// A config suited to tests and embedded use: in-memory storage and the
    /// development secret.
    pub fn local(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            api_base: format!("http://{bind_addr}"),
            db_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(86_400),
            refresh_token_ttl: Duration::from_secs(604_800),
        }
    }
}

fn ttl_from_env(var: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidDuration { var, value }),
        },
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}
