//! Encrypted drive orchestration.
//!
//! Ties the per-file envelope cipher to the two collaborators that hold its
//! output: ciphertext goes to the injected [`BlobStore`], key material and
//! file metadata go to the SQLite [`Database`].
//!
//! Ordering rules:
//! - upload writes the blob first and commits metadata only afterwards, so a
//!   metadata row never references a missing blob;
//! - delete removes metadata first, then the blob, so a failure in between
//!   leaves at worst an orphaned blob (collected by [`crate::gc`]).
//!
//! SQLite work runs on the blocking pool through [`Drive::with_db`]; the
//! database lock is never held across an await.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use cloakdrive_shared::constants::MAX_FOLDER_NAME_LEN;
use cloakdrive_shared::crypto::{
    decode_nonce, derive_key, encode_hex, generate_salt, unwrap_key, wrap_key, DerivedKey,
    FileCipher,
};
use cloakdrive_shared::types::{file_type, human_size, Identity};
use cloakdrive_store::{Database, FileRecord, Folder, FolderTree, StoreError};

use crate::blob_store::BlobStore;
use crate::error::ServerError;
use crate::stats::StorageStats;

/// Plaintext of a file, ready to be streamed back to its owner or a share
/// link holder.
#[derive(Debug)]
pub struct DownloadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// One level of an owner's folder hierarchy.
#[derive(Debug)]
pub struct FolderContent {
    pub current_folder_id: Option<Uuid>,
    /// Breadcrumb from the root down to the current folder (empty at root).
    pub path: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub files: Vec<FileRecord>,
}

/// Output of the CPU-bound half of an upload.
struct Sealed {
    ciphertext: Vec<u8>,
    salt_hex: String,
    nonce_hex: String,
    encryption_key: String,
    key_wrapped: bool,
}

pub struct Drive {
    db: Arc<Mutex<Database>>,
    blobs: Arc<dyn BlobStore>,
    kek: Option<DerivedKey>,
    max_upload_size: usize,
}

impl Drive {
    pub fn new(
        db: Arc<Mutex<Database>>,
        blobs: Arc<dyn BlobStore>,
        kek: Option<DerivedKey>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            db,
            blobs,
            kek,
            max_upload_size,
        }
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> &Arc<Mutex<Database>> {
        &self.db
    }

    pub(crate) fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Encrypt and store a new file for `owner`.
    pub async fn upload(
        &self,
        owner: &Identity,
        filename: &str,
        folder_id: Option<Uuid>,
        data: Vec<u8>,
    ) -> Result<FileRecord, ServerError> {
        if data.len() > self.max_upload_size {
            return Err(ServerError::PayloadTooLarge {
                max: self.max_upload_size,
            });
        }
        let filename = clean_filename(filename)?;

        if let Some(folder_id) = folder_id {
            let owner_key = owner.as_str().to_string();
            self.with_db(move |db| {
                db.get_folder_for_owner(folder_id, &owner_key)
                    .map(|_| ())
                    .map_err(|e| not_found_as(e, ServerError::FolderNotFound))
            })
            .await?;
        }

        let id = Uuid::new_v4();
        let storage_path = format!("enc_{}", id.simple());
        let size_bytes = data.len();

        let identity = owner.clone();
        let kek = self.kek.clone();
        let sealed = tokio::task::spawn_blocking(move || seal(&identity, id, kek.as_ref(), &data))
            .await
            .map_err(|e| ServerError::Internal(format!("Encryption task failed: {e}")))??;

        self.blobs.put(&storage_path, &sealed.ciphertext).await?;

        let record = FileRecord {
            id,
            file_type: file_type(&filename),
            size_label: human_size(size_bytes as u64),
            size_bytes: size_bytes as i64,
            filename,
            owner: owner.as_str().to_string(),
            folder_id,
            storage_path,
            salt_hex: sealed.salt_hex,
            encryption_key: sealed.encryption_key,
            key_wrapped: sealed.key_wrapped,
            nonce_hex: sealed.nonce_hex,
            uploaded_at: Utc::now(),
        };

        let storage_path = record.storage_path.clone();
        let inserted = self
            .with_db(move |db| {
                db.insert_file(&record)?;
                Ok(record)
            })
            .await;
        let record = match inserted {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&storage_path).await {
                    warn!(
                        storage_path = %storage_path,
                        error = %cleanup,
                        "Failed to remove blob after metadata commit failure"
                    );
                }
                return Err(e);
            }
        };

        info!(
            file_id = %record.id,
            owner = %owner,
            size = size_bytes,
            wrapped = record.key_wrapped,
            "File uploaded"
        );
        Ok(record)
    }

    /// Decrypt a file owned by `owner`.
    pub async fn download(
        &self,
        owner: &Identity,
        file_id: Uuid,
    ) -> Result<DownloadedFile, ServerError> {
        let record = self.owned_file(owner, file_id).await?;
        let filename = record.filename.clone();
        let data = self.decrypt_record(record).await?;
        Ok(DownloadedFile { filename, data })
    }

    /// Remove a file's metadata (and share links), then its blob.
    pub async fn delete(&self, owner: &Identity, file_id: Uuid) -> Result<(), ServerError> {
        let owner_key = owner.as_str().to_string();
        let record = self
            .with_db(move |db| {
                let record = db
                    .get_file_for_owner(file_id, &owner_key)
                    .map_err(|e| not_found_as(e, ServerError::FileNotFound))?;
                if !db.delete_file(record.id)? {
                    return Err(ServerError::FileNotFound);
                }
                Ok(record)
            })
            .await?;

        if let Err(e) = self.blobs.delete(&record.storage_path).await {
            warn!(
                file_id = %record.id,
                storage_path = %record.storage_path,
                error = %e,
                "Metadata deleted but blob removal failed; blob is now orphaned"
            );
        }

        info!(file_id = %record.id, owner = %owner, "File deleted");
        Ok(())
    }

    /// All files of `owner`, newest first.
    pub async fn list(&self, owner: &Identity) -> Result<Vec<FileRecord>, ServerError> {
        let owner_key = owner.as_str().to_string();
        self.with_db(move |db| Ok(db.list_files_for_owner(&owner_key)?))
            .await
    }

    pub async fn stats(&self, owner: &Identity) -> Result<StorageStats, ServerError> {
        let files = self.list(owner).await?;
        Ok(StorageStats::from_files(&files))
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    pub async fn create_folder(
        &self,
        owner: &Identity,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder, ServerError> {
        let folder = Folder {
            id: Uuid::new_v4(),
            name: clean_folder_name(name)?,
            parent_id,
            owner: owner.as_str().to_string(),
            created_at: Utc::now(),
        };

        let folder = self
            .with_db(move |db| {
                if let Some(parent_id) = folder.parent_id {
                    db.get_folder_for_owner(parent_id, &folder.owner)
                        .map_err(|e| not_found_as(e, ServerError::FolderNotFound))?;
                }
                db.create_folder(&folder)?;
                Ok(folder)
            })
            .await?;

        info!(folder_id = %folder.id, owner = %owner, "Folder created");
        Ok(folder)
    }

    /// Subfolders, files and breadcrumb of one folder (`None` = root).
    pub async fn folder_content(
        &self,
        owner: &Identity,
        folder_id: Option<Uuid>,
    ) -> Result<FolderContent, ServerError> {
        let owner_key = owner.as_str().to_string();
        self.with_db(move |db| {
            let tree = FolderTree::build(db.list_folders_for_owner(&owner_key)?);

            let path = match folder_id {
                Some(id) if !tree.contains(id) => return Err(ServerError::FolderNotFound),
                Some(id) => tree.path_to(id).into_iter().cloned().collect(),
                None => Vec::new(),
            };
            let folders = tree.children(folder_id).cloned().collect();
            let files = db.list_files_in_folder(&owner_key, folder_id)?;

            Ok(FolderContent {
                current_folder_id: folder_id,
                path,
                folders,
                files,
            })
        })
        .await
    }

    // ------------------------------------------------------------------
    // Shared internals
    // ------------------------------------------------------------------

    /// Run `work` against the database on the blocking pool.
    pub(crate) async fn with_db<T, F>(&self, work: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Database) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.blocking_lock();
            work(&guard)
        })
        .await
        .map_err(|e| ServerError::Internal(format!("Database task failed: {e}")))?
    }

    /// Load a file and require that `owner` owns it.
    pub(crate) async fn owned_file(
        &self,
        owner: &Identity,
        file_id: Uuid,
    ) -> Result<FileRecord, ServerError> {
        let record = self
            .with_db(move |db| {
                db.get_file(file_id)
                    .map_err(|e| not_found_as(e, ServerError::FileNotFound))
            })
            .await?;
        if record.owner != owner.as_str() {
            return Err(ServerError::NotOwner);
        }
        Ok(record)
    }

    /// Fetch and decrypt a file's blob. A missing blob stays
    /// [`ServerError::BlobNotFound`]; every failure after the fetch is
    /// [`ServerError::DecryptionFailed`].
    pub(crate) async fn decrypt_record(&self, record: FileRecord) -> Result<Vec<u8>, ServerError> {
        let ciphertext = self.blobs.get(&record.storage_path).await?;

        let file_id = record.id;
        let kek = self.kek.clone();
        tokio::task::spawn_blocking(move || open(&record, kek.as_ref(), &ciphertext))
            .await
            .map_err(|e| ServerError::Internal(format!("Decryption task failed: {e}")))?
            .map_err(|e| {
                error!(file_id = %file_id, error = %e, "File decryption failed");
                ServerError::DecryptionFailed
            })
    }
}

/// Derive a fresh per-file key, seal `data` bound to the file id, and encode
/// everything that must be persisted.
fn seal(
    owner: &Identity,
    file_id: Uuid,
    kek: Option<&DerivedKey>,
    data: &[u8],
) -> Result<Sealed, ServerError> {
    let salt = generate_salt();
    let key = derive_key(owner.as_str(), &salt)?;
    let (ciphertext, nonce) = FileCipher::from_key(&key).encrypt_bound(data, file_id.as_bytes())?;

    let (encryption_key, key_wrapped) = match kek {
        Some(kek) => (wrap_key(kek, &key, file_id.as_bytes())?, true),
        None => (key.to_hex(), false),
    };

    Ok(Sealed {
        ciphertext,
        salt_hex: encode_hex(&salt),
        nonce_hex: encode_hex(&nonce),
        encryption_key,
        key_wrapped,
    })
}

fn open(
    record: &FileRecord,
    kek: Option<&DerivedKey>,
    ciphertext: &[u8],
) -> Result<Vec<u8>, String> {
    let aad = record.id.as_bytes();
    let key = if record.key_wrapped {
        let kek = kek.ok_or("file key is wrapped but no key-encryption key is configured")?;
        unwrap_key(kek, &record.encryption_key, aad).map_err(|e| e.to_string())?
    } else {
        DerivedKey::from_hex(&record.encryption_key).map_err(|e| e.to_string())?
    };
    let nonce = decode_nonce(&record.nonce_hex).map_err(|e| e.to_string())?;

    FileCipher::from_key(&key)
        .decrypt_bound(ciphertext, &nonce, aad)
        .map_err(|e| e.to_string())
}

/// Map a store `NotFound` to a domain-specific not-found error.
pub(crate) fn not_found_as(e: StoreError, not_found: ServerError) -> ServerError {
    match e {
        StoreError::NotFound => not_found,
        other => ServerError::Store(other),
    }
}

/// Keep only the last path segment of a client-supplied filename.
fn clean_filename(raw: &str) -> Result<String, ServerError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(ServerError::InvalidInput("Filename required".into()));
    }
    if name.chars().any(char::is_control) {
        return Err(ServerError::InvalidInput(
            "Filename contains control characters".into(),
        ));
    }
    Ok(name.to_string())
}

fn clean_folder_name(raw: &str) -> Result<String, ServerError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServerError::InvalidInput("Folder name required".into()));
    }
    if name.len() > MAX_FOLDER_NAME_LEN {
        return Err(ServerError::InvalidInput(format!(
            "Folder name too long ({} bytes, max {MAX_FOLDER_NAME_LEN})",
            name.len()
        )));
    }
    if name.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(ServerError::InvalidInput(
            "Folder name contains invalid characters".into(),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::blob_store::FsBlobStore;

    pub(crate) async fn test_drive(kek: Option<DerivedKey>) -> (Drive, TempDir) {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path().join("blobs")).await.unwrap();
        let db = Database::open_in_memory().unwrap();
        let drive = Drive::new(
            Arc::new(Mutex::new(db)),
            Arc::new(blobs),
            kek,
            1024 * 1024,
        );
        (drive, dir)
    }

    pub(crate) fn alice() -> Identity {
        Identity::parse("alice").unwrap()
    }

    fn bob() -> Identity {
        Identity::parse("bob").unwrap()
    }

    const SECRET: &[u8] = b"This is a secret document content.";

    /// Blob backend that is down for writes.
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl BlobStore for UnavailableStore {
        async fn put(&self, _name: &str, _data: &[u8]) -> Result<(), ServerError> {
            Err(ServerError::BlobStorage("backend unavailable".into()))
        }

        async fn get(&self, name: &str) -> Result<Vec<u8>, ServerError> {
            Err(ServerError::BlobNotFound(name.to_string()))
        }

        async fn delete(&self, name: &str) -> Result<(), ServerError> {
            Err(ServerError::BlobNotFound(name.to_string()))
        }

        async fn list(&self) -> Result<Vec<crate::blob_store::BlobEntry>, ServerError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn upload_then_download_round_trip() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive
            .upload(&alice(), "report.pdf", None, SECRET.to_vec())
            .await
            .unwrap();

        assert_eq!(record.file_type, "pdf");
        assert_eq!(record.size_bytes, SECRET.len() as i64);
        assert_eq!(record.storage_path, format!("enc_{}", record.id.simple()));
        assert!(!record.key_wrapped);

        let stored = drive.blobs.get(&record.storage_path).await.unwrap();
        assert_ne!(stored.as_slice(), SECRET);

        let file = drive.download(&alice(), record.id).await.unwrap();
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.data, SECRET);
    }

    #[tokio::test]
    async fn wrapped_keys_round_trip() {
        let (drive, _dir) = test_drive(Some(DerivedKey::from_slice(&[0x42; 32]).unwrap())).await;
        let record = drive
            .upload(&alice(), "notes.txt", None, SECRET.to_vec())
            .await
            .unwrap();

        assert!(record.key_wrapped);
        assert!(DerivedKey::from_hex(&record.encryption_key).is_err());
        assert_eq!(drive.download(&alice(), record.id).await.unwrap().data, SECRET);
    }

    #[tokio::test]
    async fn same_content_gets_distinct_material() {
        let (drive, _dir) = test_drive(None).await;
        let a = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();
        let b = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();

        assert_ne!(a.storage_path, b.storage_path);
        assert_ne!(a.salt_hex, b.salt_hex);
        assert_ne!(a.encryption_key, b.encryption_key);
        assert_ne!(a.nonce_hex, b.nonce_hex);
    }

    #[tokio::test]
    async fn other_owner_cannot_download() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();

        assert!(matches!(
            drive.download(&bob(), record.id).await,
            Err(ServerError::NotOwner)
        ));
        assert!(matches!(
            drive.download(&alice(), Uuid::new_v4()).await,
            Err(ServerError::FileNotFound)
        ));
    }

    #[tokio::test]
    async fn externally_deleted_blob_is_reported() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();
        drive.blobs.delete(&record.storage_path).await.unwrap();

        assert!(matches!(
            drive.download(&alice(), record.id).await,
            Err(ServerError::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn tampered_blob_fails_decryption() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();

        let mut blob = drive.blobs.get(&record.storage_path).await.unwrap();
        blob[0] ^= 0x01;
        drive.blobs.put(&record.storage_path, &blob).await.unwrap();

        assert!(matches!(
            drive.download(&alice(), record.id).await,
            Err(ServerError::DecryptionFailed)
        ));
    }

    #[tokio::test]
    async fn swapped_blobs_fail_decryption() {
        let (drive, _dir) = test_drive(None).await;
        let a = drive.upload(&alice(), "a.txt", None, b"first".to_vec()).await.unwrap();
        let b = drive.upload(&alice(), "b.txt", None, b"second".to_vec()).await.unwrap();

        let blob_b = drive.blobs.get(&b.storage_path).await.unwrap();
        drive.blobs.put(&a.storage_path, &blob_b).await.unwrap();

        assert!(matches!(
            drive.download(&alice(), a.id).await,
            Err(ServerError::DecryptionFailed)
        ));
    }

    #[tokio::test]
    async fn oversized_upload_rejected_without_side_effects() {
        let (drive, _dir) = test_drive(None).await;
        let result = drive
            .upload(&alice(), "big.bin", None, vec![0u8; 1024 * 1024 + 1])
            .await;

        assert!(matches!(result, Err(ServerError::PayloadTooLarge { .. })));
        assert!(drive.blobs.list().await.unwrap().is_empty());
        assert!(drive.list(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_blob_write_leaves_no_metadata() {
        let drive = Drive::new(
            Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
            Arc::new(UnavailableStore),
            None,
            1024 * 1024,
        );

        let result = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await;
        assert!(matches!(result, Err(ServerError::BlobStorage(_))));
        assert!(drive.list(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_metadata_commit_removes_blob() {
        let (drive, _dir) = test_drive(None).await;
        drive
            .db()
            .lock()
            .await
            .conn()
            .execute_batch("DROP TABLE files;")
            .unwrap();

        let result = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await;
        assert!(matches!(result, Err(ServerError::Store(_))));
        assert!(drive.blobs.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_uploads_are_independent() {
        let (drive, _dir) = test_drive(None).await;
        let drive = Arc::new(drive);

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let drive = Arc::clone(&drive);
            tasks.spawn(async move {
                drive
                    .upload(&alice(), &format!("part-{i}.txt"), None, SECRET.to_vec())
                    .await
                    .unwrap()
                    .storage_path
            });
        }

        let mut paths = std::collections::HashSet::new();
        while let Some(path) = tasks.join_next().await {
            paths.insert(path.unwrap());
        }
        assert_eq!(paths.len(), 8);
        assert_eq!(drive.list(&alice()).await.unwrap().len(), 8);
        assert_eq!(drive.blobs.list().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn upload_into_foreign_folder_rejected() {
        let (drive, _dir) = test_drive(None).await;
        let folder = drive.create_folder(&bob(), "Private", None).await.unwrap();

        let result = drive
            .upload(&alice(), "a.txt", Some(folder.id), SECRET.to_vec())
            .await;
        assert!(matches!(result, Err(ServerError::FolderNotFound)));
        assert!(drive.blobs.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_metadata_and_blob() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();

        assert!(matches!(
            drive.delete(&bob(), record.id).await,
            Err(ServerError::FileNotFound)
        ));

        drive.delete(&alice(), record.id).await.unwrap();
        assert!(drive.list(&alice()).await.unwrap().is_empty());
        assert!(matches!(
            drive.blobs.get(&record.storage_path).await,
            Err(ServerError::BlobNotFound(_))
        ));
        assert!(matches!(
            drive.delete(&alice(), record.id).await,
            Err(ServerError::FileNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_blob() {
        let (drive, _dir) = test_drive(None).await;
        let record = drive.upload(&alice(), "a.txt", None, SECRET.to_vec()).await.unwrap();
        drive.blobs.delete(&record.storage_path).await.unwrap();

        drive.delete(&alice(), record.id).await.unwrap();
        assert!(drive.list(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn folder_hierarchy_and_content() {
        let (drive, _dir) = test_drive(None).await;
        let work = drive.create_folder(&alice(), "Work", None).await.unwrap();
        let reports = drive
            .create_folder(&alice(), "  Reports ", Some(work.id))
            .await
            .unwrap();
        assert_eq!(reports.name, "Reports");

        drive.upload(&alice(), "root.txt", None, b"r".to_vec()).await.unwrap();
        drive
            .upload(&alice(), "q1.xlsx", Some(reports.id), b"q".to_vec())
            .await
            .unwrap();

        let root = drive.folder_content(&alice(), None).await.unwrap();
        assert!(root.path.is_empty());
        assert_eq!(root.folders.len(), 1);
        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files[0].filename, "root.txt");

        let inner = drive.folder_content(&alice(), Some(reports.id)).await.unwrap();
        let crumbs: Vec<_> = inner.path.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(crumbs, ["Work", "Reports"]);
        assert!(inner.folders.is_empty());
        assert_eq!(inner.files[0].filename, "q1.xlsx");

        assert!(matches!(
            drive.folder_content(&bob(), Some(work.id)).await,
            Err(ServerError::FolderNotFound)
        ));
    }

    #[tokio::test]
    async fn folder_name_validation() {
        let (drive, _dir) = test_drive(None).await;
        for bad in ["", "   ", "a/b", "tab\there"] {
            assert!(matches!(
                drive.create_folder(&alice(), bad, None).await,
                Err(ServerError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            drive.create_folder(&alice(), "Child", Some(Uuid::new_v4())).await,
            Err(ServerError::FolderNotFound)
        ));
    }

    #[test]
    fn filenames_are_reduced_to_last_segment() {
        assert_eq!(clean_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(clean_filename("C:\\Users\\me\\cv.docx").unwrap(), "cv.docx");
        assert!(clean_filename("dir/").is_err());
        assert!(clean_filename("..").is_err());
    }
}
