//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup and shared through `AppState`.

use std::env;
use std::time::Duration;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Which media service stores uploaded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBackend {
    Cloudinary,
    Memory,
}

/// Cloudinary account credentials.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub store_backend: StoreBackend,
    pub media_backend: MediaBackend,
    /// Lifetime of issued bearer tokens
    pub token_ttl: Duration,
    /// Upper bound for any single store/media call
    pub external_call_timeout: Duration,
    /// Largest accepted multipart body
    pub max_upload_bytes: usize,
    /// PBKDF2 work factor for new password hashes
    pub password_iterations: u32,

    // --- Secrets ---
    /// JWT signing key for bearer tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Present when `media_backend` is Cloudinary
    pub cloudinary: Option<CloudinaryConfig>,
}

pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 8;
pub const DEFAULT_EXTERNAL_CALL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl Config {
    /// Config for tests: in-memory backends and a fixed signing key.
    pub fn test_default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            media_backend: MediaBackend::Memory,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_HOURS * 60 * 60),
            external_call_timeout: Duration::from_secs(DEFAULT_EXTERNAL_CALL_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            // Keep test hashing cheap
            password_iterations: 1_000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            cloudinary: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// For local development, a `.env` file is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let media_backend = match env::var("MEDIA_BACKEND").as_deref() {
            Ok("memory") => MediaBackend::Memory,
            Ok("cloudinary") | Err(_) => MediaBackend::Cloudinary,
            Ok(_) => return Err(ConfigError::Invalid("MEDIA_BACKEND")),
        };

        let cloudinary = match media_backend {
            MediaBackend::Cloudinary => Some(CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            }),
            MediaBackend::Memory => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend,
            media_backend,
            token_ttl: token_ttl(parse_or("TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?)?,
            external_call_timeout: Duration::from_secs(parse_or(
                "EXTERNAL_CALL_TIMEOUT_SECS",
                DEFAULT_EXTERNAL_CALL_TIMEOUT_SECS,
            )?),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            password_iterations: parse_or(
                "PASSWORD_ITERATIONS",
                crate::services::password::DEFAULT_ITERATIONS,
            )?,
            jwt_signing_key: signing_key(required("JWT_SIGNING_KEY")?)?,
            cloudinary,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Signing key bytes; blank keys are rejected.
fn signing_key(raw: String) -> Result<Vec<u8>, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Invalid("JWT_SIGNING_KEY"));
    }
    Ok(raw.into_bytes())
}

fn token_ttl(hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or(ConfigError::Invalid("TOKEN_TTL_HOURS"))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("MEDIA_BACKEND", "memory");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.media_backend, MediaBackend::Memory);
        assert!(config.cloudinary.is_none());
        assert_eq!(config.token_ttl, Duration::from_secs(8 * 60 * 60));
    }

    #[test]
    fn test_blank_signing_key_is_rejected() {
        for raw in ["", "   "] {
            assert!(matches!(
                signing_key(raw.to_string()),
                Err(ConfigError::Invalid("JWT_SIGNING_KEY"))
            ));
        }
        assert_eq!(signing_key("k".to_string()).unwrap(), b"k");
    }

    #[test]
    fn test_token_ttl_rejects_overflow() {
        assert_eq!(token_ttl(2).unwrap(), Duration::from_secs(7_200));
        assert!(matches!(
            token_ttl(u64::MAX),
            Err(ConfigError::Invalid("TOKEN_TTL_HOURS"))
        ));
    }

    #[test]
    fn test_test_default_uses_memory_backends() {
        let config = Config::test_default();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.media_backend, MediaBackend::Memory);
    }
}
