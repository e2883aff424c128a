//! # cloakdrive-server
//!
//! Encrypted cloud-drive backend.
//!
//! This binary provides:
//! - **Per-file envelope encryption**: every upload is sealed under its own
//!   PBKDF2-derived key before it reaches storage
//! - **Encrypted blob storage** on the local filesystem (opaque ciphertext,
//!   named independently of the original filename)
//! - **SQLite metadata** for files, folders and share links
//! - **REST API** (axum) for upload/download, folders, storage stats and
//!   password-protected, expiring share links
//! - **Orphan sweep** that reclaims blobs no metadata row references

mod api;
mod auth;
mod blob_store;
mod config;
mod drive;
mod error;
mod gc;
mod share;
mod stats;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cloakdrive_store::Database;

use crate::api::AppState;
use crate::blob_store::FsBlobStore;
use crate::config::ServerConfig;
use crate::drive::Drive;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cloakdrive_server=debug")),
        )
        .init();

    info!("Starting CloakDrive server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env()?;
    info!(?config, "Loaded configuration");
    if config.key_encryption_key.is_none() {
        tracing::warn!("KEY_ENCRYPTION_KEY not set, file keys are stored unwrapped");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Metadata store (runs migrations on open)
    let db = Database::open_at(&config.database_path)?;
    let db = Arc::new(Mutex::new(db));

    // Blob store (creates directory if missing)
    let blobs = Arc::new(FsBlobStore::new(config.blob_storage_path.clone()).await?);

    let drive = Arc::new(Drive::new(
        db,
        blobs,
        config.key_encryption_key.clone(),
        config.max_upload_size,
    ));

    let app_state = AppState {
        drive: drive.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic orphaned-blob sweep
    let sweep_interval = config.orphan_sweep_interval;
    let grace = config.orphan_grace;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = gc::sweep_orphans(&drive, grace).await {
                tracing::error!(error = %e, "Orphan sweep failed");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    if let Err(e) = api::serve(app_state, config.http_addr, shutdown).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    Ok(())
}
