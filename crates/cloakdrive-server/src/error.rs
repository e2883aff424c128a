use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cloakdrive_shared::{CryptoError, ShareError};
use cloakdrive_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("File not found")]
    FileNotFound,

    #[error("Folder not found")]
    FolderNotFound,

    /// The file exists but belongs to someone else. Rendered exactly like
    /// [`ServerError::FileNotFound`] so callers cannot enumerate ids.
    #[error("Requester does not own the file")]
    NotOwner,

    #[error("File missing from storage: {0}")]
    BlobNotFound(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("Upload exceeds the {max} byte limit")]
    PayloadTooLarge { max: usize },

    #[error("Link not found")]
    LinkNotFound,

    #[error("Link expired")]
    LinkExpired,

    #[error("Password required")]
    PasswordRequired,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CryptoError> for ServerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidInput(msg) => ServerError::InvalidInput(msg.to_string()),
            CryptoError::InvalidKeyLength(len) => ServerError::InvalidKeyLength(len),
            CryptoError::AuthenticationFailure | CryptoError::Encoding(_) => {
                ServerError::DecryptionFailed
            }
            CryptoError::EncryptionFailed => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<ShareError> for ServerError {
    fn from(e: ShareError) -> Self {
        match e {
            ShareError::Expired => ServerError::LinkExpired,
            ShareError::PasswordRequired => ServerError::PasswordRequired,
            ShareError::IncorrectPassword => ServerError::IncorrectPassword,
            ShareError::InvalidLifetime(_) => ServerError::InvalidInput(e.to_string()),
            ShareError::Hash(msg) => ServerError::Internal(format!("password hash: {msg}")),
        }
    }
}

// Extractor rejections keep the JSON error body instead of axum's plain text.

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::InvalidInput(e.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(e: PathRejection) -> Self {
        ServerError::InvalidInput(e.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        ServerError::InvalidInput(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::FileNotFound | ServerError::NotOwner => {
                (StatusCode::NOT_FOUND, "File not found".to_string())
            }
            ServerError::FolderNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BlobNotFound(_) => (
                StatusCode::NOT_FOUND,
                "File missing from storage".to_string(),
            ),
            ServerError::DecryptionFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::InvalidKeyLength(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ServerError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::LinkNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::LinkExpired => (StatusCode::GONE, self.to_string()),
            ServerError::PasswordRequired | ServerError::IncorrectPassword => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::BlobStorage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Blob storage error".to_string(),
            ),
            ServerError::Store(_) | ServerError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() || matches!(self, ServerError::BlobNotFound(_)) {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
