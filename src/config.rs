//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const MIN_BCRYPT_COST: u32 = 4;

/// `MONGO_URI` value that selects the in-process store instead of MongoDB.
pub const MEMORY_URI: &str = "memory://";

const DEFAULT_DATABASE: &str = "storycraft";

/// Upper bound for `JWT_EXPIRY_HOURS` (one year).
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string, or `memory://`
    pub mongo_uri: String,
    /// Database name override (falls back to the one in the URI)
    pub mongo_db: Option<String>,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory whose `uploads/` subtree is served publicly
    pub public_dir: PathBuf,
    /// Session token lifetime in hours
    pub token_ttl_hours: i64,
    /// Largest accepted image upload in bytes
    pub max_upload_bytes: usize,
    /// bcrypt cost factor for new password hashes
    pub bcrypt_cost: u32,

    // --- Secrets ---
    /// HMAC key for session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            mongo_uri: MEMORY_URI.to_string(),
            mongo_db: None,
            frontend_url: "http://localhost:3000".to_string(),
            port: 5000,
            public_dir: PathBuf::from("public"),
            token_ttl_hours: 1,
            max_upload_bytes: 5 * 1024 * 1024,
            bcrypt_cost: MIN_BCRYPT_COST,
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            mongo_uri: env::var("MONGO_URI").map_err(|_| ConfigError::Missing("MONGO_URI"))?,
            mongo_db: env::var("MONGO_DB").ok().filter(|v| !v.is_empty()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: parse_or("PORT", 5000)?,
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            token_ttl_hours: parse_token_ttl()?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,

            jwt_secret: env::var("JWT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
        })
    }

    /// Whether the in-process store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.mongo_uri == MEMORY_URI
    }

    pub fn database_name(&self, uri_default: Option<&str>) -> String {
        self.mongo_db
            .clone()
            .or_else(|| uri_default.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_token_ttl() -> Result<i64, ConfigError> {
    let hours = parse_or("JWT_EXPIRY_HOURS", 1)?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::Invalid("JWT_EXPIRY_HOURS", hours.to_string()));
    }
    Ok(hours)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
