//! Domain model structs persisted in the metadata database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Folder
// ---------------------------------------------------------------------------

/// A folder in a user's drive. `parent_id == None` means it sits at the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    /// Identity string of the owner.
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Metadata for one encrypted file.
///
/// Carries the key material needed to reverse the file's encryption, so it is
/// deliberately not `Serialize`: API responses go through a redacted view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: Uuid,
    /// Original file name as uploaded.
    pub filename: String,
    /// Lowercased extension, or `"unknown"`.
    pub file_type: String,
    /// Human-readable size, e.g. `"5.20 MB"`.
    pub size_label: String,
    /// Plaintext size in bytes.
    pub size_bytes: i64,
    pub owner: String,
    pub folder_id: Option<Uuid>,
    /// Object name in the blob store.
    pub storage_path: String,
    /// Hex-encoded 16-byte KDF salt.
    pub salt_hex: String,
    /// Hex-encoded 32-byte file key, or a hex wrapped key when `key_wrapped`.
    pub encryption_key: String,
    pub key_wrapped: bool,
    /// Hex-encoded 12-byte nonce.
    pub nonce_hex: String,
    pub uploaded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Share link
// ---------------------------------------------------------------------------

/// A public capability referencing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub id: Uuid,
    pub file_id: Uuid,
    pub token: String,
    /// Argon2id PHC string; `None` means the link is open.
    pub password_hash: Option<String>,
    /// `None` means the link never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
