//! # cloakdrive-shared
//!
//! Core primitives shared by the CloakDrive store and server:
//! - **crypto**: PBKDF2 per-file key derivation, ChaCha20-Poly1305 envelope
//!   cipher, key wrapping and the hex encoding used for persistence
//! - **share**: share-link tokens, password hashing and the access gate
//! - **types**: validated identities and file classification helpers

pub mod constants;
pub mod crypto;
pub mod error;
pub mod share;
pub mod types;

pub use error::{CryptoError, IdentityError, ShareError};
