use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Authentication failed: wrong key, wrong nonce or tampered ciphertext")]
    AuthenticationFailure,

    #[error("Malformed key material encoding: {0}")]
    Encoding(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::Encoding(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Share link has expired")]
    Expired,

    #[error("Share link requires a password")]
    PasswordRequired,

    #[error("Incorrect share link password")]
    IncorrectPassword,

    #[error("Invalid share link lifetime: {0} minutes")]
    InvalidLifetime(i64),

    #[error("Password hashing error: {0}")]
    Hash(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity is empty")]
    Empty,

    #[error("Identity is too long ({0} bytes)")]
    TooLong(usize),

    #[error("Identity contains control characters")]
    ControlCharacters,
}
