//! CRUD operations for [`FileRecord`] metadata.

use std::collections::HashSet;

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::FileRecord;
use crate::sql::{opt_uuid_col, ts_col, uuid_col};

const FILE_COLUMNS: &str = "id, filename, file_type, size_label, size_bytes, owner, folder_id,
     storage_path, salt_hex, encryption_key, key_wrapped, nonce_hex, uploaded_at";

impl Database {
    /// Insert a file row. All columns are written by a single statement, so
    /// the row either exists complete or not at all.
    pub fn insert_file(&self, file: &FileRecord) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO files ({FILE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    file.id.to_string(),
                    file.filename,
                    file.file_type,
                    file.size_label,
                    file.size_bytes,
                    file.owner,
                    file.folder_id.map(|f| f.to_string()),
                    file.storage_path,
                    file.salt_hex,
                    file.encryption_key,
                    file.key_wrapped as i32,
                    file.nonce_hex,
                    file.uploaded_at.to_rfc3339(),
                ],
            )
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub fn get_file(&self, id: Uuid) -> Result<FileRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
                params![id.to_string()],
                row_to_file,
            )
            .map_err(StoreError::classify)
    }

    /// Fetch a file only if `owner` owns it. A file owned by someone else is
    /// reported as [`StoreError::NotFound`].
    pub fn get_file_for_owner(&self, id: Uuid, owner: &str) -> Result<FileRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1 AND owner = ?2"),
                params![id.to_string(), owner],
                row_to_file,
            )
            .map_err(StoreError::classify)
    }

    /// All files of one owner, newest first.
    pub fn list_files_for_owner(&self, owner: &str) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE owner = ?1
             ORDER BY uploaded_at DESC"
        ))?;

        let rows = stmt.query_map(params![owner], row_to_file)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Files of one owner directly inside `folder_id` (`None` = root), by name.
    pub fn list_files_in_folder(
        &self,
        owner: &str,
        folder_id: Option<Uuid>,
    ) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE owner = ?1 AND folder_id IS ?2
             ORDER BY filename ASC"
        ))?;

        let rows = stmt.query_map(
            params![owner, folder_id.map(|f| f.to_string())],
            row_to_file,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Delete a file row (and, by cascade, its share links). Returns `true`
    /// if a row was deleted. The blob is not touched.
    pub fn delete_file(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM files WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Every blob name referenced by a metadata row.
    pub fn storage_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn().prepare("SELECT storage_path FROM files")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<HashSet<_>>>()
            .map_err(StoreError::from)
    }
}

fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    let id_str: String = row.get(0)?;
    let folder_str: Option<String> = row.get(6)?;
    let key_wrapped: i32 = row.get(10)?;
    let uploaded_str: String = row.get(12)?;

    Ok(FileRecord {
        id: uuid_col(0, &id_str)?,
        filename: row.get(1)?,
        file_type: row.get(2)?,
        size_label: row.get(3)?,
        size_bytes: row.get(4)?,
        owner: row.get(5)?,
        folder_id: opt_uuid_col(6, folder_str)?,
        storage_path: row.get(7)?,
        salt_hex: row.get(8)?,
        encryption_key: row.get(9)?,
        key_wrapped: key_wrapped != 0,
        nonce_hex: row.get(11)?,
        uploaded_at: ts_col(12, &uploaded_str)?,
    })
}
