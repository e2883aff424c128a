//! Share link gate.
//!
//! A share link is a capability: a random URL-safe token referencing one
//! file, optionally protected by a password (stored only as an Argon2id PHC
//! hash) and optionally expiring. Expiry is evaluated lazily on every access.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;

use crate::constants::SHARE_TOKEN_BYTES;
use crate::error::ShareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Open,
    PasswordRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    pub lifetime: Lifetime,
    pub protection: Protection,
}

impl LinkState {
    pub fn evaluate(
        expires_at: Option<DateTime<Utc>>,
        password_hash: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let lifetime = match expires_at {
            Some(at) if at <= now => Lifetime::Expired,
            _ => Lifetime::Active,
        };
        let protection = if password_hash.is_some() {
            Protection::PasswordRequired
        } else {
            Protection::Open
        };
        Self {
            lifetime,
            protection,
        }
    }
}

/// Gate a share link access attempt. Expiry is checked before the password so
/// an expired link never acts as a password oracle.
pub fn check_access(
    expires_at: Option<DateTime<Utc>>,
    password_hash: Option<&str>,
    supplied: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ShareError> {
    let state = LinkState::evaluate(expires_at, password_hash, now);

    if state.lifetime == Lifetime::Expired {
        return Err(ShareError::Expired);
    }

    match (password_hash, supplied.filter(|p| !p.is_empty())) {
        (None, _) => Ok(()),
        (Some(_), None) => Err(ShareError::PasswordRequired),
        (Some(hash), Some(password)) => {
            if verify_share_password(password, hash)? {
                Ok(())
            } else {
                Err(ShareError::IncorrectPassword)
            }
        }
    }
}

/// Compute the expiry timestamp for a link created at `now` with an optional
/// lifetime in minutes. Zero minutes yields a link that is already expired.
pub fn expiry_from_ttl(
    now: DateTime<Utc>,
    ttl_minutes: Option<i64>,
) -> Result<Option<DateTime<Utc>>, ShareError> {
    let Some(minutes) = ttl_minutes else {
        return Ok(None);
    };
    if minutes < 0 {
        return Err(ShareError::InvalidLifetime(minutes));
    }

    TimeDelta::try_minutes(minutes)
        .and_then(|delta| now.checked_add_signed(delta))
        .map(Some)
        .ok_or(ShareError::InvalidLifetime(minutes))
}

/// 16 random bytes as unpadded base64url (22 characters).
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check before touching the database.
pub fn is_well_formed_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 64
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn hash_share_password(password: &str) -> Result<String, ShareError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ShareError::Hash(e.to_string()))
}

pub fn verify_share_password(password: &str, hash: &str) -> Result<bool, ShareError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ShareError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
