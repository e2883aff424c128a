//! Per-file envelope encryption.
//!
//! Every uploaded file gets its own key: PBKDF2-HMAC-SHA256 over the owner's
//! identity and a fresh 16-byte salt. File bytes are sealed with
//! ChaCha20-Poly1305 under a fresh 12-byte nonce; the 16-byte tag is appended
//! to the ciphertext.
//!
//! Key material is persisted as lowercase hex. A wrapped key is the hex of
//! `nonce || ciphertext` produced by sealing the file key under a server
//! key-encryption key.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{KEY_SIZE, NONCE_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, TAG_SIZE};
use crate::error::CryptoError;

pub type Salt = [u8; SALT_SIZE];
pub type FileNonce = [u8; NONCE_SIZE];

/// A 256-bit symmetric key. Wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    #[cfg(test)]
    pub(crate) fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(text.trim())?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a file key from an identity string and a per-file salt.
///
/// Deterministic: the same `(identity, salt)` pair always yields the same key.
/// Deliberately slow (100 000 PBKDF2 rounds), so async callers should run it
/// on the blocking pool.
pub fn derive_key(identity: &str, salt: &[u8]) -> Result<DerivedKey, CryptoError> {
    derive_key_with_rounds(identity, salt, PBKDF2_ITERATIONS)
}

fn derive_key_with_rounds(
    identity: &str,
    salt: &[u8],
    rounds: u32,
) -> Result<DerivedKey, CryptoError> {
    if identity.is_empty() {
        return Err(CryptoError::InvalidInput("identity must not be empty"));
    }
    if salt.len() != SALT_SIZE {
        return Err(CryptoError::InvalidInput("salt must be exactly 16 bytes"));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(identity.as_bytes(), salt, rounds, &mut key);
    Ok(DerivedKey(key))
}

// ---------------------------------------------------------------------------
// Envelope cipher
// ---------------------------------------------------------------------------

/// Authenticated encryption of whole file payloads under one key.
///
/// Holds no mutable state, so a single instance may be shared across threads.
pub struct FileCipher {
    cipher: ChaCha20Poly1305,
}

impl FileCipher {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    pub fn from_key(key: &DerivedKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }

    /// Returns `(ciphertext || tag, nonce)`. The nonce is freshly drawn from the
    /// OS RNG on every call.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(Vec<u8>, FileNonce), CryptoError> {
        self.encrypt_bound(plaintext, &[])
    }

    pub fn decrypt(&self, ciphertext: &[u8], nonce: &FileNonce) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_bound(ciphertext, nonce, &[])
    }

    /// Like [`encrypt`](Self::encrypt), but authenticates `aad` alongside the
    /// payload. Decryption must present the same `aad`.
    pub fn encrypt_bound(
        &self,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<(Vec<u8>, FileNonce), CryptoError> {
        let nonce_bytes = generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok((ciphertext, nonce_bytes))
    }

    pub fn decrypt_bound(
        &self,
        ciphertext: &[u8],
        nonce: &FileNonce,
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::AuthenticationFailure);
        }

        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailure)
    }
}

pub fn generate_nonce() -> FileNonce {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

// ---------------------------------------------------------------------------
// Key custody
// ---------------------------------------------------------------------------

/// Seal a file key under a key-encryption key, bound to `aad`.
pub fn wrap_key(kek: &DerivedKey, file_key: &DerivedKey, aad: &[u8]) -> Result<String, CryptoError> {
    let (sealed, nonce) = FileCipher::from_key(kek).encrypt_bound(file_key.as_bytes(), aad)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(hex::encode(out))
}

pub fn unwrap_key(kek: &DerivedKey, wrapped: &str, aad: &[u8]) -> Result<DerivedKey, CryptoError> {
    let data = hex::decode(wrapped.trim())?;
    if data.len() != NONCE_SIZE + KEY_SIZE + TAG_SIZE {
        return Err(CryptoError::Encoding(format!(
            "wrapped key: expected {} bytes, got {}",
            NONCE_SIZE + KEY_SIZE + TAG_SIZE,
            data.len()
        )));
    }

    let (nonce, sealed) = data.split_at(NONCE_SIZE);
    let nonce: FileNonce = nonce
        .try_into()
        .map_err(|_| CryptoError::Encoding("wrapped key nonce".to_string()))?;

    let mut raw = FileCipher::from_key(kek).decrypt_bound(sealed, &nonce, aad)?;
    let key = DerivedKey::from_slice(&raw);
    raw.zeroize();
    key
}

// ---------------------------------------------------------------------------
// Text encoding for persistence
// ---------------------------------------------------------------------------

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_salt(text: &str) -> Result<Salt, CryptoError> {
    decode_fixed(text, "salt")
}

pub fn decode_nonce(text: &str) -> Result<FileNonce, CryptoError> {
    decode_fixed(text, "nonce")
}

fn decode_fixed<const N: usize>(text: &str, what: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(text.trim())?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::Encoding(format!("{what}: expected {N} bytes, got {}", bytes.len()))
    })
}
