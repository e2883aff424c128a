/// Application name
pub const APP_NAME: &str = "CloakDrive";

/// Derived / symmetric key size in bytes (ChaCha20-Poly1305, 256-bit)
pub const KEY_SIZE: usize = 32;

/// Per-file KDF salt size in bytes
pub const SALT_SIZE: usize = 16;

/// ChaCha20-Poly1305 (IETF) nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Random bytes behind a share token (encoded as base64url, 22 chars)
pub const SHARE_TOKEN_BYTES: usize = 16;

/// How many times share creation retries on a token collision
pub const SHARE_TOKEN_ATTEMPTS: usize = 5;

/// Longest accepted identity string in bytes
pub const MAX_IDENTITY_LEN: usize = 256;

/// Longest accepted folder name in bytes
pub const MAX_FOLDER_NAME_LEN: usize = 255;

/// Maximum upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;
