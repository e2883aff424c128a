//! CRUD operations for [`Folder`] records.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Folder;
use crate::sql::{opt_uuid_col, ts_col, uuid_col};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new folder.
    pub fn create_folder(&self, folder: &Folder) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO folders (id, name, parent_id, owner, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    folder.id.to_string(),
                    folder.name,
                    folder.parent_id.map(|p| p.to_string()),
                    folder.owner,
                    folder.created_at.to_rfc3339(),
                ],
            )
            .map_err(StoreError::classify)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a folder owned by `owner`.
    pub fn get_folder_for_owner(&self, id: Uuid, owner: &str) -> Result<Folder> {
        self.conn()
            .query_row(
                "SELECT id, name, parent_id, owner, created_at
                 FROM folders
                 WHERE id = ?1 AND owner = ?2",
                params![id.to_string(), owner],
                row_to_folder,
            )
            .map_err(StoreError::classify)
    }

    /// Every folder of one owner, used to build a [`FolderTree`].
    ///
    /// [`FolderTree`]: crate::FolderTree
    pub fn list_folders_for_owner(&self, owner: &str) -> Result<Vec<Folder>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, parent_id, owner, created_at
             FROM folders
             WHERE owner = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![owner], row_to_folder)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_folder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Folder> {
    let id_str: String = row.get(0)?;
    let parent_str: Option<String> = row.get(2)?;
    let created_str: String = row.get(4)?;

    Ok(Folder {
        id: uuid_col(0, &id_str)?,
        name: row.get(1)?,
        parent_id: opt_uuid_col(2, parent_str)?,
        owner: row.get(3)?,
        created_at: ts_col(4, &created_str)?,
    })
}
