//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. A malformed ordinary setting is
//! logged and falls back to its default; a malformed key-encryption key is
//! fatal, since running without it would silently store keys unwrapped.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cloakdrive_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT, KEY_SIZE, MAX_UPLOAD_SIZE};
use cloakdrive_shared::crypto::DerivedKey;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("KEY_ENCRYPTION_KEY is set but invalid: {0}")]
    InvalidKeyEncryptionKey(String),
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path where encrypted blobs are stored.
    /// Env: `BLOB_STORAGE_PATH`
    /// Default: `./blobs`
    pub blob_storage_path: PathBuf,

    /// SQLite metadata database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./cloakdrive.db`
    pub database_path: PathBuf,

    /// Maximum accepted upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 50 MiB
    pub max_upload_size: usize,

    /// Request header carrying the caller identity, set by the upstream
    /// identity provider.
    /// Env: `IDENTITY_HEADER`
    /// Default: `x-user-id`
    pub identity_header: String,

    /// Key-encryption key used to seal per-file keys before they are
    /// persisted (hex-encoded, 64 chars). When absent, file keys are stored
    /// as plain hex.
    /// Env: `KEY_ENCRYPTION_KEY`
    pub key_encryption_key: Option<DerivedKey>,

    /// How often the orphaned-blob sweep runs.
    /// Env: `ORPHAN_SWEEP_INTERVAL_SECS`
    /// Default: 3600
    pub orphan_sweep_interval: Duration,

    /// Minimum age of an unreferenced blob before the sweep deletes it.
    /// Env: `ORPHAN_GRACE_SECS`
    /// Default: 900
    pub orphan_grace: Duration,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"CloakDrive"`
    pub instance_name: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("blob_storage_path", &self.blob_storage_path)
            .field("database_path", &self.database_path)
            .field("max_upload_size", &self.max_upload_size)
            .field("identity_header", &self.identity_header)
            .field("key_wrapping", &self.key_encryption_key.is_some())
            .field("orphan_sweep_interval", &self.orphan_sweep_interval)
            .field("orphan_grace", &self.orphan_grace)
            .field("instance_name", &self.instance_name)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            blob_storage_path: PathBuf::from("./blobs"),
            database_path: PathBuf::from("./cloakdrive.db"),
            max_upload_size: MAX_UPLOAD_SIZE,
            identity_header: "x-user-id".to_string(),
            key_encryption_key: None,
            orphan_sweep_interval: Duration::from_secs(3600),
            orphan_grace: Duration::from_secs(900),
            instance_name: APP_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("BLOB_STORAGE_PATH") {
            config.blob_storage_path = PathBuf::from(path);
        }

        if let Some(path) = var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(val) = var("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(header) = var("IDENTITY_HEADER") {
            let header = header.trim().to_ascii_lowercase();
            if axum::http::HeaderName::from_bytes(header.as_bytes()).is_ok() {
                config.identity_header = header;
            } else {
                tracing::warn!(value = %header, "Invalid IDENTITY_HEADER, using default");
            }
        }

        if let Some(hex_key) = var("KEY_ENCRYPTION_KEY") {
            let key = parse_hex_key(&hex_key).map_err(ConfigError::InvalidKeyEncryptionKey)?;
            config.key_encryption_key = Some(key);
        }

        if let Some(val) = var("ORPHAN_SWEEP_INTERVAL_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.orphan_sweep_interval = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid ORPHAN_SWEEP_INTERVAL_SECS, using default"),
            }
        }

        if let Some(val) = var("ORPHAN_GRACE_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => config.orphan_grace = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %val, "Invalid ORPHAN_GRACE_SECS, using default"),
            }
        }

        if let Some(name) = var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        Ok(config)
    }
}

/// Parse a 64-character hex string into a 32-byte key.
fn parse_hex_key(hex: &str) -> Result<DerivedKey, String> {
    let hex = hex.trim();
    if hex.len() != KEY_SIZE * 2 {
        return Err(format!("expected {} hex chars, got {}", KEY_SIZE * 2, hex.len()));
    }
    DerivedKey::from_hex(hex).map_err(|e| e.to_string())
}
