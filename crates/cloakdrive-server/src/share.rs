//! Public share links.
//!
//! A link borrows the referenced file's key material at download time and
//! never carries its own. Expiry is evaluated lazily on every access; there
//! is no background sweep for links.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use cloakdrive_shared::constants::SHARE_TOKEN_ATTEMPTS;
use cloakdrive_shared::share::{
    check_access, expiry_from_ttl, generate_share_token, hash_share_password,
    is_well_formed_token, LinkState, Lifetime, Protection,
};
use cloakdrive_shared::types::Identity;
use cloakdrive_store::{FileRecord, ShareLink, StoreError};

use crate::drive::{not_found_as, DownloadedFile, Drive};
use crate::error::ServerError;

/// What an anonymous visitor may learn about a link before downloading.
#[derive(Debug, Clone)]
pub struct ShareInfo {
    pub filename: String,
    pub size_label: String,
    pub is_protected: bool,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Drive {
    /// Create a share link for a file `owner` owns. An empty password means
    /// an open link.
    pub async fn create_share_link(
        &self,
        owner: &Identity,
        file_id: Uuid,
        password: Option<String>,
        ttl_minutes: Option<i64>,
    ) -> Result<ShareLink, ServerError> {
        let file = self.owned_file(owner, file_id).await?;

        let created_at = Utc::now();
        let expires_at = expiry_from_ttl(created_at, ttl_minutes)?;

        let password_hash = match password.filter(|p| !p.is_empty()) {
            Some(password) => Some(
                tokio::task::spawn_blocking(move || hash_share_password(&password))
                    .await
                    .map_err(|e| ServerError::Internal(format!("Hashing task failed: {e}")))??,
            ),
            None => None,
        };

        for attempt in 1..=SHARE_TOKEN_ATTEMPTS {
            let link = ShareLink {
                id: Uuid::new_v4(),
                file_id: file.id,
                token: generate_share_token(),
                password_hash: password_hash.clone(),
                expires_at,
                created_at,
            };

            let inserted = self
                .with_db(move |db| match db.insert_share_link(&link) {
                    Ok(()) => Ok(Some(link)),
                    Err(StoreError::Conflict) => Ok(None),
                    Err(e) => Err(e.into()),
                })
                .await?;

            if let Some(link) = inserted {
                info!(
                    file_id = %file.id,
                    owner = %owner,
                    protected = link.password_hash.is_some(),
                    expires_at = ?link.expires_at,
                    "Share link created"
                );
                return Ok(link);
            }
            warn!(attempt, "Share token collision, retrying");
        }

        Err(ServerError::Internal(
            "Could not allocate a unique share token".into(),
        ))
    }

    /// Public metadata of a link. Expired links are reported as such; the
    /// password is not checked here.
    pub async fn share_info(&self, token: &str) -> Result<ShareInfo, ServerError> {
        let (link, file) = self.resolve_link(token).await?;

        let state = LinkState::evaluate(link.expires_at, link.password_hash.as_deref(), Utc::now());
        if state.lifetime == Lifetime::Expired {
            return Err(ServerError::LinkExpired);
        }

        Ok(ShareInfo {
            filename: file.filename,
            size_label: file.size_label,
            is_protected: state.protection == Protection::PasswordRequired,
            uploaded_at: file.uploaded_at,
            expires_at: link.expires_at,
        })
    }

    /// Gate a download through a link and decrypt the referenced file. No
    /// caller identity is required.
    pub async fn download_shared(
        &self,
        token: &str,
        password: Option<String>,
    ) -> Result<DownloadedFile, ServerError> {
        let (link, file) = self.resolve_link(token).await?;

        tokio::task::spawn_blocking(move || {
            check_access(
                link.expires_at,
                link.password_hash.as_deref(),
                password.as_deref(),
                Utc::now(),
            )
        })
        .await
        .map_err(|e| ServerError::Internal(format!("Verification task failed: {e}")))??;

        let file_id = file.id;
        let filename = file.filename.clone();
        let data = self.decrypt_record(file).await?;
        info!(file_id = %file_id, size = data.len(), "Shared file downloaded");
        Ok(DownloadedFile { filename, data })
    }

    async fn resolve_link(&self, token: &str) -> Result<(ShareLink, FileRecord), ServerError> {
        if !is_well_formed_token(token) {
            return Err(ServerError::LinkNotFound);
        }

        let token = token.to_string();
        self.with_db(move |db| {
            let link = db
                .get_share_link_by_token(&token)
                .map_err(|e| not_found_as(e, ServerError::LinkNotFound))?;
            let file = db
                .get_file(link.file_id)
                .map_err(|e| not_found_as(e, ServerError::LinkNotFound))?;
            Ok((link, file))
        })
        .await
    }
}
