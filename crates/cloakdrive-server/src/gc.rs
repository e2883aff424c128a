//! Orphaned-blob collection.
//!
//! A crash or cancellation between the blob write and the metadata commit of
//! an upload, or a failed blob delete, leaves an object no row references;
//! a crash inside the blob store's own write leaves an incomplete object.
//! The sweep removes both once they are older than a grace period, so
//! uploads still in flight are never touched.

use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::drive::Drive;
use crate::error::ServerError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub incomplete_removed: usize,
}

pub async fn sweep_orphans(drive: &Drive, grace: Duration) -> Result<SweepReport, ServerError> {
    // List blobs before reading references: a blob written after the listing
    // is not considered, and one committed before the query is referenced.
    let blobs = drive.blobs().list().await?;
    let referenced = drive.with_db(|db| Ok(db.storage_paths()?)).await?;
    let now = SystemTime::now();

    let mut report = SweepReport {
        scanned: blobs.len(),
        ..SweepReport::default()
    };

    for blob in blobs {
        if referenced.contains(&blob.name) {
            continue;
        }
        let age = now.duration_since(blob.modified).unwrap_or_default();
        if age < grace {
            debug!(name = %blob.name, ?age, "Unreferenced blob inside grace period");
            continue;
        }

        match drive.blobs().delete(&blob.name).await {
            Ok(()) => report.removed += 1,
            Err(ServerError::BlobNotFound(_)) => {}
            Err(e) => warn!(name = %blob.name, error = %e, "Failed to remove orphaned blob"),
        }
    }

    report.incomplete_removed = drive.blobs().purge_incomplete(grace).await?;

    if report.removed > 0 || report.incomplete_removed > 0 {
        info!(
            scanned = report.scanned,
            removed = report.removed,
            incomplete_removed = report.incomplete_removed,
            "Orphaned blobs removed"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::tests::{alice, test_drive};

    #[tokio::test]
    async fn removes_only_unreferenced_blobs() {
        let (drive, _dir) = test_drive(None).await;
        let kept = drive
            .upload(&alice(), "kept.txt", None, b"kept".to_vec())
            .await
            .unwrap();
        drive.blobs().put("enc_orphan", b"leftover").await.unwrap();

        let report = sweep_orphans(&drive, Duration::ZERO).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                removed: 1,
                incomplete_removed: 0
            }
        );

        assert!(matches!(
            drive.blobs().get("enc_orphan").await,
            Err(ServerError::BlobNotFound(_))
        ));
        assert_eq!(
            drive.download(&alice(), kept.id).await.unwrap().data,
            b"kept"
        );
    }

    #[tokio::test]
    async fn grace_period_protects_fresh_blobs() {
        let (drive, _dir) = test_drive(None).await;
        drive.blobs().put("enc_inflight", b"partial").await.unwrap();

        let report = sweep_orphans(&drive, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(report.removed, 0);
        assert!(drive.blobs().get("enc_inflight").await.is_ok());
    }

    #[tokio::test]
    async fn interrupted_writes_are_collected() {
        let (drive, dir) = test_drive(None).await;
        let leftover = dir.path().join("blobs").join(".tmp-interrupted");
        std::fs::write(&leftover, b"half a ciphertext").unwrap();

        let report = sweep_orphans(&drive, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(report.incomplete_removed, 0);
        assert!(leftover.exists());

        let report = sweep_orphans(&drive, Duration::ZERO).await.unwrap();
        assert_eq!(report.incomplete_removed, 1);
        assert!(!leftover.exists());
    }
}
