use portal_core::otp::{DEFAULT_EXPIRY_MINS, DEFAULT_RESEND_INTERVAL_SECS};

use crate::auth::jwt::JwtConfig;

/// A missing or malformed environment variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// One-time passcode settings.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Code lifetime in minutes (default: `10`).
    pub expiry_mins: i64,
    /// Minimum seconds between two codes for the same email (default: `25`).
    pub resend_interval_secs: i64,
    /// Accepted email domains. Empty means any domain.
    pub allowed_email_domains: Vec<String>,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the web client, used for links in emails.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `PUBLIC_BASE_URL`          | `http://localhost:5173` |
    /// | `OTP_EXPIRY_MINS`          | `10`                    |
    /// | `OTP_RESEND_INTERVAL_SECS` | `25`                    |
    /// | `ALLOWED_EMAIL_DOMAINS`    | empty (any domain)      |
    ///
    /// JWT variables are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0");
        let port = parse_env("PORT", 3000u16)?;
        let cors_origins = split_list(&env_or("CORS_ORIGINS", "http://localhost:5173"));
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 30u64)?;
        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:5173")
            .trim_end_matches('/')
            .to_string();

        let otp = OtpConfig {
            expiry_mins: parse_env("OTP_EXPIRY_MINS", DEFAULT_EXPIRY_MINS)?,
            resend_interval_secs: parse_env(
                "OTP_RESEND_INTERVAL_SECS",
                DEFAULT_RESEND_INTERVAL_SECS,
            )?,
            allowed_email_domains: split_list(&env_or("ALLOWED_EMAIL_DOMAINS", "")),
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            jwt: JwtConfig::from_env()?,
            otp,
        })
    }

    /// Absolute URL for an in-app path such as `/projects/soil`.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.public_base_url)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional variable, falling back to `default` when unset.
pub(crate) fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
