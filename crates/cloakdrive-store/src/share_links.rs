//! CRUD operations for [`ShareLink`] records.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::ShareLink;
use crate::sql::{opt_ts_col, ts_col, uuid_col};

impl Database {
    /// Insert a share link. A token collision surfaces as
    /// [`StoreError::Conflict`] so the caller can retry with a fresh token.
    pub fn insert_share_link(&self, link: &ShareLink) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO share_links (id, file_id, token, password_hash, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    link.id.to_string(),
                    link.file_id.to_string(),
                    link.token,
                    link.password_hash,
                    link.expires_at.map(|t| t.to_rfc3339()),
                    link.created_at.to_rfc3339(),
                ],
            )
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub fn get_share_link_by_token(&self, token: &str) -> Result<ShareLink> {
        self.conn()
            .query_row(
                "SELECT id, file_id, token, password_hash, expires_at, created_at
                 FROM share_links
                 WHERE token = ?1",
                params![token],
                row_to_share_link,
            )
            .map_err(StoreError::classify)
    }
}

fn row_to_share_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareLink> {
    let id_str: String = row.get(0)?;
    let file_str: String = row.get(1)?;
    let expires_str: Option<String> = row.get(4)?;
    let created_str: String = row.get(5)?;

    Ok(ShareLink {
        id: uuid_col(0, &id_str)?,
        file_id: uuid_col(1, &file_str)?,
        token: row.get(2)?,
        password_hash: row.get(3)?,
        expires_at: opt_ts_col(4, expires_str)?,
        created_at: ts_col(5, &created_str)?,
    })
}
