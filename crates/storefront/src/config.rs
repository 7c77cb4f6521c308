//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of this API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `MEDIA_BASE_URL` - Prefix for image paths (default: `{base_url}/media`)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated frontend origins
//! - `ADMIN_URL_PATH` - Secret admin path checked by `/api/verify-admin-path`
//! - `SHIPPING_RATE_INSIDE` - Inside Dhaka surcharge (default: 40.00)
//! - `SHIPPING_RATE_OUTSIDE` - Outside Dhaka surcharge (default: 150.00)
//! - `LOW_STOCK_THRESHOLD` - Dashboard low-stock cutoff (default: 5)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` - Order emails
//! - `ADMIN_EMAIL` - Recipient of new-order notifications
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use gadzilla_core::ShippingRates;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Prefix for relative image paths
    pub media_base_url: String,
    /// Origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,
    /// Secret admin path, if one is configured
    pub admin_url_path: Option<String>,
    /// Delivery surcharges for direct checkout
    pub shipping: ShippingRates,
    /// Products at or below this stock show on the dashboard
    pub low_stock_threshold: i32,
    /// SMTP settings; `None` disables email
    pub email: Option<EmailConfig>,
    /// Recipient of new-order notifications
    pub admin_email: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "8000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let media_base_url = get_optional_env("MEDIA_BASE_URL")
            .unwrap_or_else(|| format!("{base_url}/media"));

        let shipping = ShippingRates {
            inside: parse_env::<Decimal>("SHIPPING_RATE_INSIDE", "40.00")?,
            outside: parse_env::<Decimal>("SHIPPING_RATE_OUTSIDE", "150.00")?,
        };
        for (key, rate) in [
            ("SHIPPING_RATE_INSIDE", shipping.inside),
            ("SHIPPING_RATE_OUTSIDE", shipping.outside),
        ] {
            if rate.is_sign_negative() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            media_base_url,
            cors_allowed_origins: get_optional_env("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            admin_url_path: get_optional_env("ADMIN_URL_PATH")
                .map(|p| p.trim().trim_matches('/').to_owned())
                .filter(|p| !p.is_empty()),
            shipping,
            low_stock_threshold: parse_env("LOW_STOCK_THRESHOLD", "5")?,
            email: EmailConfig::from_env()?,
            admin_email: get_optional_env("ADMIN_EMAIL"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether `candidate` matches the configured admin path.
    ///
    /// Surrounding slashes and whitespace are ignored. Always `false` when no
    /// admin path is configured.
    #[must_use]
    pub fn is_admin_path(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().trim_matches('/');
        self.admin_url_path
            .as_deref()
            .is_some_and(|path| !candidate.is_empty() && path == candidate)
    }
}

impl EmailConfig {
    /// Email is enabled only when host, username and password are all set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(smtp_host), Some(smtp_username), Some(smtp_password)) = (
            get_optional_env("SMTP_HOST"),
            get_optional_env("SMTP_USERNAME"),
            get_optional_env("SMTP_PASSWORD"),
        ) else {
            return Ok(None);
        };

        validate_secret_strength(&smtp_password, "SMTP_PASSWORD")?;
        let smtp_port = parse_env("SMTP_PORT", "587")?;
        let from_address = get_optional_env("EMAIL_FROM").unwrap_or_else(|| smtp_username.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            from_address,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional, non-blank environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
