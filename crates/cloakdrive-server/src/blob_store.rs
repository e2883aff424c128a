//! Object storage for encrypted file bodies.
//!
//! Orchestration code only sees the [`BlobStore`] trait and receives a
//! concrete store by injection. [`FsBlobStore`] keeps one file per object
//! under a base directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

/// Prefix of in-flight writes inside an [`FsBlobStore`] directory.
const TMP_PREFIX: &str = ".tmp-";

/// One stored object as seen by a listing.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub name: String,
    pub modified: SystemTime,
}

/// Durable named-object storage. Names are opaque to the store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name`, replacing any previous object.
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), ServerError>;

    /// Fetch an object. Missing objects are [`ServerError::BlobNotFound`].
    async fn get(&self, name: &str) -> Result<Vec<u8>, ServerError>;

    /// Remove an object. Missing objects are [`ServerError::BlobNotFound`].
    async fn delete(&self, name: &str) -> Result<(), ServerError>;

    /// Enumerate stored objects.
    async fn list(&self) -> Result<Vec<BlobEntry>, ServerError>;

    /// Remove leftovers of interrupted writes older than `grace` and return
    /// how many were removed. Stores with atomic writes have none.
    async fn purge_incomplete(&self, _grace: Duration) -> Result<usize, ServerError> {
        Ok(0)
    }
}

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    let mut resolved = base.to_path_buf();
    for component in target.strip_prefix(base).unwrap_or(target).components() {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(ServerError::InvalidInput(
                    "Path traversal detected".to_string(),
                ));
            }
            _ => {} // RootDir, CurDir, Prefix
        }
    }
    if !resolved.starts_with(base) {
        return Err(ServerError::InvalidInput(
            "Path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

/// Object names are single path segments of `[A-Za-z0-9._-]`, not starting
/// with a dot (dot-files are in-flight writes).
fn validate_name(name: &str) -> Result<(), ServerError> {
    let ok = !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if ok {
        Ok(())
    } else {
        Err(ServerError::InvalidInput(format!("Invalid blob name: {name:?}")))
    }
}

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
}

impl FsBlobStore {
    pub async fn new(base_path: PathBuf) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::BlobStorage(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        let base_path = base_path.canonicalize().unwrap_or(base_path);
        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self { base_path })
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf, ServerError> {
        validate_name(name)?;
        ensure_within(&self.base_path, &self.base_path.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<(), ServerError> {
        let path = self.blob_path(name)?;

        // Write to a hidden temp file and rename, so readers never observe a
        // partially written object under its real name.
        let tmp = self.base_path.join(format!("{TMP_PREFIX}{}", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServerError::BlobStorage(format!(
                "Failed to write blob {name}: {e}"
            )));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServerError::BlobStorage(format!(
                "Failed to commit blob {name}: {e}"
            )));
        }

        debug!(name, size = data.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.blob_path(name)?;

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServerError::BlobNotFound(name.to_string()),
            _ => ServerError::BlobStorage(format!("Failed to read blob {name}: {e}")),
        })?;

        debug!(name, size = data.len(), "Retrieved blob");
        Ok(data)
    }

    async fn delete(&self, name: &str) -> Result<(), ServerError> {
        let path = self.blob_path(name)?;

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServerError::BlobNotFound(name.to_string()),
            _ => ServerError::BlobStorage(format!("Failed to delete blob {name}: {e}")),
        })?;

        debug!(name, "Deleted blob");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<BlobEntry>, ServerError> {
        let mut blobs = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to list blobs: {}", e)))?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to read directory entry: {}", e))
        })? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_name(&name).is_err() {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            blobs.push(BlobEntry {
                name,
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        Ok(blobs)
    }

    async fn purge_incomplete(&self, grace: Duration) -> Result<usize, ServerError> {
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to list blobs: {}", e)))?;
        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to read directory entry: {}", e))
        })? {
            let is_tmp = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TMP_PREFIX));
            if !is_tmp {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if !meta.is_file() || now.duration_since(modified).unwrap_or_default() < grace {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                // Committed or cleaned up by its writer in the meantime.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ServerError::BlobStorage(format!(
                        "Failed to remove incomplete blob: {e}"
                    )))
                }
            }
        }

        if removed > 0 {
            debug!(removed, "Removed incomplete blob writes");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FsBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _dir) = test_store().await;
        store.put("enc_abc", b"encrypted-blob-data").await.unwrap();
        assert_eq!(store.get("enc_abc").await.unwrap(), b"encrypted-blob-data");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (store, _dir) = test_store().await;
        store.put("enc_abc", b"one").await.unwrap();
        store.put("enc_abc", b"two").await.unwrap();
        assert_eq!(store.get("enc_abc").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _dir) = test_store().await;
        store.put("enc_gone", b"delete-me").await.unwrap();

        store.delete("enc_gone").await.unwrap();
        assert!(matches!(
            store.get("enc_gone").await,
            Err(ServerError::BlobNotFound(_))
        ));
        assert!(matches!(
            store.delete("enc_gone").await,
            Err(ServerError::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_temp_files() {
        let (store, dir) = test_store().await;
        store.put("enc_1", b"blob-1").await.unwrap();
        store.put("enc_2", b"blob-2").await.unwrap();
        std::fs::write(dir.path().join(".tmp-inflight"), b"partial").unwrap();

        let mut names: Vec<_> = store.list().await.unwrap().into_iter().map(|b| b.name).collect();
        names.sort();
        assert_eq!(names, ["enc_1", "enc_2"]);
    }

    #[tokio::test]
    async fn test_purge_incomplete_respects_grace() {
        let (store, dir) = test_store().await;
        store.put("enc_1", b"blob-1").await.unwrap();
        std::fs::write(dir.path().join(".tmp-crashed"), b"partial").unwrap();

        assert_eq!(
            store.purge_incomplete(Duration::from_secs(3600)).await.unwrap(),
            0
        );
        assert!(dir.path().join(".tmp-crashed").exists());

        assert_eq!(store.purge_incomplete(Duration::ZERO).await.unwrap(), 1);
        assert!(!dir.path().join(".tmp-crashed").exists());
        assert_eq!(store.get("enc_1").await.unwrap(), b"blob-1");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.get("enc_missing").await,
            Err(ServerError::BlobNotFound(name)) if name == "enc_missing"
        ));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        for name in ["../escape", "a/b", "..", "", ".hidden", "a\\b"] {
            assert!(
                matches!(store.put(name, b"x").await, Err(ServerError::InvalidInput(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
