//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_PORT=8080                                                │
//! │     STOCKROOM_SESSION_SECRET=…                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $STOCKROOM_CONFIG, or                                              │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/… (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! trust_proxy = false
//!
//! [database]
//! path = "/var/lib/stockroom/stockroom.db"
//!
//! [auth]
//! session_secret = "at-least-sixteen-bytes"
//! session_ttl_secs = 28800
//! admin_password = "first-boot-only"
//! secure_cookies = true
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Minimum session secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

const DEFAULT_ADMIN_PASSWORD: &str = "changeme";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Take the client address from `X-Forwarded-For`. Only safe behind a
    /// reverse proxy that overwrites the header.
    #[serde(default)]
    pub trust_proxy: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            host: default_host(),
            port: default_port(),
            trust_proxy: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().join("stockroom.db"))
        .unwrap_or_else(|| PathBuf::from("./stockroom.db"))
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 key for session tokens. Generated per process when unset.
    #[serde(default)]
    pub session_secret: String,

    /// Session lifetime. Default: 8 hours
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    /// Stored (hashed) only when the admin has no password yet.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Adds `Secure` to cookies. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_session_ttl() -> i64 {
    8 * 60 * 60
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            session_secret: String::new(),
            session_ttl_secs: default_session_ttl(),
            admin_password: default_admin_password(),
            secure_cookies: false,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = std::env::var("STOCKROOM_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.fill_generated();
        config.validate()?;

        Ok(config)
    }

    /// Applies `STOCKROOM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("STOCKROOM_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("STOCKROOM_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOCKROOM_PORT".to_string()))?;
        }

        if let Some(trust) = lookup("STOCKROOM_TRUST_PROXY") {
            self.server.trust_proxy = parse_flag(&trust);
        }

        if let Some(path) = lookup("STOCKROOM_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("STOCKROOM_SESSION_SECRET") {
            self.auth.session_secret = secret;
        }

        if let Some(ttl) = lookup("STOCKROOM_SESSION_TTL_SECS") {
            self.auth.session_ttl_secs = ttl
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOCKROOM_SESSION_TTL_SECS".to_string()))?;
        }

        if let Some(password) = lookup("STOCKROOM_ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }

        if let Some(secure) = lookup("STOCKROOM_SECURE_COOKIES") {
            self.auth.secure_cookies = parse_flag(&secure);
        }

        Ok(())
    }

    /// Fills in a random session secret when none was configured.
    fn fill_generated(&mut self) {
        if self.auth.session_secret.is_empty() {
            warn!("No session secret configured; sessions will not survive a restart");
            self.auth.session_secret = format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            );
        }
        if self.auth.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!("Using the default admin password for first boot; change it after logging in");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "session_secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.auth.session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_secs must be greater than 0".into(),
            ));
        }

        self.bind_address()?;
        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("server.host".to_string()))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}
