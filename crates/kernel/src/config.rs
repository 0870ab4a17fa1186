//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL.
    pub redis_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,

    /// Expected `iss` claim of bearer tokens (default: "confcentral").
    pub jwt_issuer: String,

    /// Secret path segment for `POST /cron/{key}`. When None, the route rejects every key.
    pub cron_key: Option<String>,

    /// Seconds between scheduled announcement runs (default: 3600, 0 disables).
    pub announcement_interval_secs: u64,

    /// SMTP host for email delivery. When None, confirmation emails are only logged.
    pub smtp_host: Option<String>,

    /// SMTP port (default: 587).
    pub smtp_port: u16,

    /// SMTP username for authentication.
    pub smtp_username: Option<String>,

    /// SMTP password for authentication.
    pub smtp_password: Option<String>,

    /// SMTP encryption mode: "starttls" (default), "tls", or "none".
    pub smtp_encryption: String,

    /// From address for outgoing email.
    pub smtp_from_email: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let jwt_secret =
            env::var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET is too short (must be >= 32 bytes)");
        }

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "confcentral".to_string());

        let cron_key = env::var("CRON_KEY").ok().filter(|k| !k.is_empty());

        let announcement_interval_secs = env::var("ANNOUNCEMENT_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("ANNOUNCEMENT_INTERVAL_SECS must be a valid u64")?;

        let smtp_host = env::var("SMTP_HOST").ok();

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .context("SMTP_PORT must be a valid u16")?;

        let smtp_username = env::var("SMTP_USERNAME").ok();
        let smtp_password = env::var("SMTP_PASSWORD").ok();

        let smtp_encryption = env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .to_lowercase();

        let smtp_from_email =
            env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".to_string());

        Ok(Self {
            port,
            database_url,
            redis_url,
            database_max_connections,
            cors_allowed_origins,
            jwt_secret,
            jwt_issuer,
            cron_key,
            announcement_interval_secs,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_encryption,
            smtp_from_email,
        })
    }
}
