//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of the site, used for pagination links and templates
//! - `STOREFRONT_JWT_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `STOREFRONT_API_BASE_URL` - API root exposed to templates (default: `{base_url}/api/`)
//! - `STOREFRONT_MEDIA_URL` - Prefix for uploaded image paths (default: `/media/`)
//! - `STOREFRONT_MEDIA_ROOT` - Directory served under `/media` (default: `media`)
//! - `STOREFRONT_STATIC_ROOT` - Directory served under `/static`
//! - `GOOGLE_OAUTH_CLIENT_ID` - Google sign-in client ID (sign-in disabled when unset)
//! - `JWT_ACCESS_TOKEN_MINUTES` - Access token lifetime (default: 60)
//! - `JWT_REFRESH_TOKEN_DAYS` - Refresh token lifetime (default: 7)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
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
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// API root handed to the frontend JavaScript
    pub api_base_url: String,
    /// Prefix prepended to stored image paths
    pub media_url: String,
    /// Directory holding uploaded images
    pub media_root: PathBuf,
    /// Directory holding CSS/JS assets
    pub static_root: PathBuf,
    /// Token signing configuration
    pub jwt: JwtConfig,
    /// Google sign-in configuration
    pub google: GoogleConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// JWT signing configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: SecretString,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Google Identity Services configuration.
#[derive(Debug, Clone, Default)]
pub struct GoogleConfig {
    /// OAuth client ID; ID tokens must carry it as their audience
    pub client_id: Option<String>,
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
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = parse_env("STOREFRONT_PORT", 8000_u16)?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let api_base_url = get_optional_env("STOREFRONT_API_BASE_URL")
            .unwrap_or_else(|| format!("{base_url}/api/"));
        let media_url = normalize_media_url(&get_env_or_default("STOREFRONT_MEDIA_URL", "/media/"));
        let media_root = PathBuf::from(get_env_or_default("STOREFRONT_MEDIA_ROOT", "media"));
        let static_root = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATIC_ROOT",
            "crates/storefront/static",
        ));

        let jwt = JwtConfig::from_env()?;
        let google = GoogleConfig {
            client_id: get_optional_env("GOOGLE_OAUTH_CLIENT_ID").filter(|id| !id.is_empty()),
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api_base_url,
            media_url,
            media_root,
            static_root,
            jwt,
            google,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = load_signing_secret("STOREFRONT_JWT_SECRET")?;

        let access_minutes = parse_env("JWT_ACCESS_TOKEN_MINUTES", 60_i64)?;
        let refresh_days = parse_env("JWT_REFRESH_TOKEN_DAYS", 7_i64)?;
        if access_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_ACCESS_TOKEN_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }
        if refresh_days <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_REFRESH_TOKEN_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Self {
            secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Ensure the media URL starts and ends with a slash unless it is absolute.
fn normalize_media_url(raw: &str) -> String {
    let mut url = raw.trim().to_string();
    if !url.starts_with('/') && !url.starts_with("http://") && !url.starts_with("https://") {
        url.insert(0, '/');
    }
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Read `key` and reject secrets that are short, look like a template value,
/// or use too few distinct characters to have been generated randomly.
fn load_signing_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(get_required_env(key)?);
    check_signing_secret(&secret)
        .map_err(|reason| ConfigError::InsecureSecret(key.to_string(), reason))?;
    Ok(secret)
}

fn check_signing_secret(secret: &SecretString) -> Result<(), String> {
    let value = secret.expose_secret();
    let len = value.chars().count();
    if len < MIN_JWT_SECRET_LENGTH {
        return Err(format!("must be at least {MIN_JWT_SECRET_LENGTH} characters (got {len})"));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let bits = entropy_bits_per_char(value);
    if bits < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({bits:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); generate it with `openssl rand -base64 48`"
        ));
    }
    Ok(())
}

/// Shannon entropy of `s` in bits per character.
#[allow(clippy::cast_precision_loss)]
fn entropy_bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0_usize;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            api_base_url: "http://localhost:8000/api/".to_string(),
            media_url: "/media/".to_string(),
            media_root: PathBuf::from("media"),
            static_root: PathBuf::from("static"),
            jwt: JwtConfig {
                secret: SecretString::from("kQ9#vT2$mW7!pL4@zX8&nR3*bY6^cF1%"),
                access_ttl: Duration::minutes(60),
                refresh_ttl: Duration::days(7),
            },
            google: GoogleConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_entropy_bits_per_char() {
        assert!(entropy_bits_per_char("").abs() < f64::EPSILON);
        assert!((entropy_bits_per_char("abab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_signing_secret_rejects_short_values() {
        let err = check_signing_secret(&secret("kQ9#vT2$")).unwrap_err();
        assert!(err.contains("at least 32"));
    }

    #[test]
    fn test_signing_secret_rejects_placeholders() {
        let err =
            check_signing_secret(&secret("changeme-dental-com-jwt-key-0123456789")).unwrap_err();
        assert!(err.contains("changeme"));
    }

    #[test]
    fn test_signing_secret_rejects_repetitive_values() {
        let err = check_signing_secret(&secret(&"ab".repeat(20))).unwrap_err();
        assert!(err.contains("entropy"));
    }

    #[test]
    fn test_signing_secret_accepts_random_values() {
        assert!(check_signing_secret(&secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%")).is_ok());
    }

    #[test]
    fn test_normalize_media_url() {
        assert_eq!(normalize_media_url("/media/"), "/media/");
        assert_eq!(normalize_media_url("media"), "/media/");
        assert_eq!(
            normalize_media_url("https://cdn.example.com/m"),
            "https://cdn.example.com/m/"
        );
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_jwt_config_debug_redacts_secret() {
        let debug_output = format!("{:?}", test_config().jwt);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kQ9#vT2$"));
    }
}
