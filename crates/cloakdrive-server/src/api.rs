use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use cloakdrive_store::{FileRecord, Folder};

use crate::auth::CurrentUser;
use crate::config::ServerConfig;
use crate::drive::{DownloadedFile, Drive, FolderContent};
use crate::error::ServerError;
use crate::share::ShareInfo;
use crate::stats::StorageStats;

/// Headroom on top of the upload limit for multipart framing and form fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub drive: Arc<Drive>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_size
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_file))
        .route("/files", get(list_files))
        .route("/files/stats", get(storage_stats))
        .route("/files/{id}/download", get(download_file))
        .route("/files/{id}", delete(delete_file))
        .route("/folders/create", post(create_folder))
        .route("/folders/content", get(folder_content))
        .route("/share/create", post(create_share))
        .route("/share/{token}/info", get(share_info))
        .route("/share/{token}/download", post(share_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Wire types ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    name: String,
    version: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    file_id: Uuid,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Public view of a file row. Key material, salt, nonce and storage path
/// never leave the server.
#[derive(Serialize)]
struct FileResponse {
    id: Uuid,
    filename: String,
    file_type: String,
    size: String,
    size_bytes: i64,
    folder_id: Option<Uuid>,
    upload_date: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            file_type: file.file_type,
            size: file.size_label,
            size_bytes: file.size_bytes,
            folder_id: file.folder_id,
            upload_date: file.uploaded_at,
        }
    }
}

#[derive(Serialize)]
struct FolderResponse {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            created_at: folder.created_at,
        }
    }
}

#[derive(Serialize)]
struct FolderContentResponse {
    current_folder_id: Option<Uuid>,
    path: Vec<FolderResponse>,
    folders: Vec<FolderResponse>,
    files: Vec<FileResponse>,
}

impl From<FolderContent> for FolderContentResponse {
    fn from(content: FolderContent) -> Self {
        Self {
            current_folder_id: content.current_folder_id,
            path: content.path.into_iter().map(Into::into).collect(),
            folders: content.folders.into_iter().map(Into::into).collect(),
            files: content.files.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
struct CreateFolderRequest {
    name: String,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct FolderContentQuery {
    folder_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct CreateShareRequest {
    file_id: Uuid,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    expires_minutes: Option<i64>,
}

#[derive(Serialize)]
struct CreateShareResponse {
    hash: String,
    full_url: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ShareInfoResponse {
    filename: String,
    size: String,
    is_protected: bool,
    upload_date: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<ShareInfo> for ShareInfoResponse {
    fn from(info: ShareInfo) -> Self {
        Self {
            filename: info.filename,
            size: info.size_label,
            is_protected: info.is_protected,
            upload_date: info.uploaded_at,
            expires_at: info.expires_at,
        }
    }
}

#[derive(Deserialize, Default)]
struct SharePasswordRequest {
    #[serde(default)]
    password: Option<String>,
}

// ─── Handlers ───

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut folder_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &state.config))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, &state.config))?;
                upload = Some((filename, data));
            }
            "folder_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, &state.config))?;
                folder_id = parse_folder_id(&text)?;
            }
            _ => {}
        }
    }

    let Some((filename, data)) = upload else {
        return Err(ServerError::InvalidInput(
            "Missing 'file' field in multipart form".to_string(),
        ));
    };

    let record = state
        .drive
        .upload(&user, &filename, folder_id, data.to_vec())
        .await?;

    info!(file_id = %record.id, size = record.size_bytes, "File uploaded via API");

    Ok(Json(UploadResponse {
        message: "File uploaded",
        file_id: record.id,
    }))
}

async fn list_files(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FileResponse>>, ServerError> {
    let files = state.drive.list(&user).await?;
    Ok(Json(files.into_iter().map(Into::into).collect()))
}

async fn storage_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StorageStats>, ServerError> {
    Ok(Json(state.drive.stats(&user).await?))
}

async fn download_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ServerError> {
    let Path(id) = id?;
    let file = state.drive.download(&user, id).await?;
    Ok(attachment(file))
}

async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, ServerError> {
    let Path(id) = id?;
    state.drive.delete(&user, id).await?;
    Ok(Json(MessageResponse {
        message: "File deleted",
    }))
}

async fn create_folder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    req: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FolderResponse>), ServerError> {
    let Json(req) = req?;
    let folder = state
        .drive
        .create_folder(&user, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder.into())))
}

async fn folder_content(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<FolderContentQuery>, QueryRejection>,
) -> Result<Json<FolderContentResponse>, ServerError> {
    let Query(query) = query?;
    let content = state.drive.folder_content(&user, query.folder_id).await?;
    Ok(Json(content.into()))
}

async fn create_share(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    req: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<Json<CreateShareResponse>, ServerError> {
    let Json(req) = req?;
    let link = state
        .drive
        .create_share_link(&user, req.file_id, req.password, req.expires_minutes)
        .await?;

    Ok(Json(CreateShareResponse {
        full_url: format!("/share/{}", link.token),
        hash: link.token,
        expires_at: link.expires_at,
    }))
}

async fn share_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ShareInfoResponse>, ServerError> {
    Ok(Json(state.drive.share_info(&token).await?.into()))
}

/// The body is optional: an empty body is an attempt without a password.
async fn share_download(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Response, ServerError> {
    let req: SharePasswordRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SharePasswordRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServerError::InvalidInput(format!("Invalid JSON body: {e}")))?
    };

    let file = state.drive.download_shared(&token, req.password).await?;
    Ok(attachment(file))
}

// ─── Helpers ───

fn multipart_error(e: MultipartError, config: &ServerConfig) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge {
            max: config.max_upload_size,
        }
    } else {
        ServerError::InvalidInput(format!("Multipart error: {}", e.body_text()))
    }
}

/// Form value for the target folder. Empty or `null` means the root.
fn parse_folder_id(text: &str) -> Result<Option<Uuid>, ServerError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    text.parse::<Uuid>()
        .map(Some)
        .map_err(|_| ServerError::InvalidInput(format!("Invalid folder_id: {text}")))
}

fn attachment(file: DownloadedFile) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&file.filename),
            ),
        ],
        file.data,
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// as RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub async fn serve(
    state: AppState,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
