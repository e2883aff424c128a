//! # cloakdrive-store
//!
//! Relational metadata store for CloakDrive, backed by SQLite.
//!
//! Holds file metadata (including the key material needed to reverse each
//! file's encryption), the per-user folder hierarchy and share links. The
//! encrypted file bytes themselves never touch this database.

pub mod database;
pub mod files;
pub mod folders;
pub mod migrations;
pub mod models;
pub mod share_links;
pub mod tree;

mod error;
mod sql;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use tree::FolderTree;
