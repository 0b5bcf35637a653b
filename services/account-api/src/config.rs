//! Configuration for the Account API service.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vidhub_auth_core::{AuthConfig, MediaConfig};
use vidhub_db::PoolOptions;

/// Account API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Database pool tuning
    pub pool: PoolOptions,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Media host credentials
    pub media: MediaConfig,

    /// Exact origin allowed to send credentialed requests; any origin when unset
    pub cors_origin: Option<String>,

    /// Where multipart uploads are staged before going to the media host
    pub upload_dir: PathBuf,

    /// Maximum request body size
    pub body_limit_bytes: usize,

    /// Request timeout
    pub request_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,

    /// Add `Secure` to auth cookies
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        // Database
        let database_url = required("DATABASE_URL")?;
        let pool = PoolOptions {
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            ..PoolOptions::default()
        };

        // Server
        let http_port = parse_or(&lookup, "HTTP_PORT", 8000)?;

        // Token secrets and lifetimes
        let access_token_expiry: u64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRY_SECS", 86_400)?;
        let refresh_token_expiry: u64 =
            parse_or(&lookup, "REFRESH_TOKEN_EXPIRY_SECS", 864_000)?;

        let auth = AuthConfig::try_new(
            required("ACCESS_TOKEN_SECRET")?,
            required("REFRESH_TOKEN_SECRET")?,
        )
        .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
        .with_access_token_ttl(Duration::from_secs(access_token_expiry))
        .with_refresh_token_ttl(Duration::from_secs(refresh_token_expiry));

        // Media host
        let mut media = MediaConfig::new(
            required("CLOUDINARY_CLOUD_NAME")?,
            required("CLOUDINARY_API_KEY")?,
            required("CLOUDINARY_API_SECRET")?,
        );
        if let Some(api_base) = lookup("CLOUDINARY_API_BASE") {
            media = media.with_api_base(api_base);
        }

        // HTTP surface
        let cors_origin = lookup("CORS_ORIGIN").filter(|o| !o.is_empty() && o != "*");
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./public/temp"));
        let body_limit_bytes = parse_or(&lookup, "BODY_LIMIT_BYTES", 10 * 1024 * 1024)?;
        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            http_port,
            database_url,
            pool,
            auth,
            media,
            cors_origin,
            upload_dir,
            body_limit_bytes,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled: parse_or(&lookup, "METRICS_ENABLED", true)?,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
