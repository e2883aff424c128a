//! Per-owner storage usage.

use serde::Serialize;

use cloakdrive_shared::types::FileCategory;
use cloakdrive_store::FileRecord;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryUsage {
    pub name: &'static str,
    /// Megabytes, rounded to two decimals.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStats {
    pub total_used_mb: f64,
    pub file_count: usize,
    /// Only categories that hold at least one byte, in [`FileCategory::ALL`] order.
    pub chart_data: Vec<CategoryUsage>,
}

impl StorageStats {
    pub fn from_files(files: &[FileRecord]) -> Self {
        let mut per_category = [0u64; FileCategory::ALL.len()];
        let mut total: u64 = 0;

        for file in files {
            let size = u64::try_from(file.size_bytes).unwrap_or(0);
            let category = FileCategory::from_filename(&file.filename);
            if let Some(slot) = FileCategory::ALL.iter().position(|c| *c == category) {
                per_category[slot] += size;
            }
            total += size;
        }

        let chart_data = FileCategory::ALL
            .iter()
            .zip(per_category)
            .filter(|(_, bytes)| *bytes > 0)
            .map(|(category, bytes)| CategoryUsage {
                name: category.label(),
                value: to_mb(bytes),
            })
            .collect();

        Self {
            total_used_mb: to_mb(total),
            file_count: files.len(),
            chart_data,
        }
    }
}

fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn file(name: &str, size_bytes: i64) -> FileRecord {
        let id = Uuid::new_v4();
        FileRecord {
            id,
            filename: name.to_string(),
            file_type: String::new(),
            size_label: String::new(),
            size_bytes,
            owner: "alice".to_string(),
            folder_id: None,
            storage_path: format!("enc_{}", id.simple()),
            salt_hex: String::new(),
            encryption_key: String::new(),
            key_wrapped: false,
            nonce_hex: String::new(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty() {
        let stats = StorageStats::from_files(&[]);
        assert_eq!(stats.total_used_mb, 0.0);
        assert_eq!(stats.file_count, 0);
        assert!(stats.chart_data.is_empty());
    }

    #[test]
    fn test_categories() {
        let mb = 1024 * 1024;
        let stats = StorageStats::from_files(&[
            file("photo.JPG", 2 * mb),
            file("clip.mp4", 3 * mb),
            file("notes.txt", mb / 2),
            file("archive.zip", mb),
            file("README", mb),
        ]);

        assert_eq!(stats.file_count, 5);
        assert_eq!(stats.total_used_mb, 7.5);
        assert_eq!(
            stats.chart_data,
            vec![
                CategoryUsage { name: "Images", value: 2.0 },
                CategoryUsage { name: "Documents", value: 0.5 },
                CategoryUsage { name: "Videos", value: 3.0 },
                CategoryUsage { name: "Others", value: 2.0 },
            ]
        );
    }

    #[test]
    fn test_rounding() {
        let stats = StorageStats::from_files(&[file("a.png", 1536)]);
        assert_eq!(stats.total_used_mb, 0.0);
        assert_eq!(stats.chart_data[0].value, 0.0);

        let stats = StorageStats::from_files(&[file("a.png", 1_234_567)]);
        assert_eq!(stats.total_used_mb, 1.18);
    }
}
