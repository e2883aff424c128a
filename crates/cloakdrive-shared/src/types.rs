use serde::{Deserialize, Serialize};

use crate::constants::MAX_IDENTITY_LEN;
use crate::error::IdentityError;

/// Stable per-user identity handed to us by the identity provider. Used both
/// as the owner key in metadata and as the KDF input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        if trimmed.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong(trimmed.len()));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(IdentityError::ControlCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileCategory {
    Images,
    Documents,
    Videos,
    Audio,
    Others,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Images,
        FileCategory::Documents,
        FileCategory::Videos,
        FileCategory::Audio,
        FileCategory::Others,
    ];

    pub fn from_filename(filename: &str) -> Self {
        match file_extension(filename).as_deref() {
            Some("jpg" | "jpeg" | "png" | "gif" | "svg" | "webp") => Self::Images,
            Some("pdf" | "doc" | "docx" | "txt" | "xls" | "xlsx" | "ppt" | "pptx") => {
                Self::Documents
            }
            Some("mp4" | "mov" | "avi" | "mkv" | "webm") => Self::Videos,
            Some("mp3" | "wav" | "aac" | "ogg") => Self::Audio,
            _ => Self::Others,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Documents => "Documents",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Others => "Others",
        }
    }
}

/// Lowercased extension after the last dot, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File type column value: the extension, or `"unknown"`.
pub fn file_type(filename: &str) -> String {
    file_extension(filename).unwrap_or_else(|| "unknown".to_string())
}

/// Human-readable size: MB above one mebibyte, KB otherwise.
pub fn human_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb > 1.0 {
        format!("{mb:.2} MB")
    } else {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert_eq!(Identity::parse("  user-42 ").unwrap().as_str(), "user-42");
        assert_eq!(Identity::parse("   "), Err(IdentityError::Empty));
        assert_eq!(
            Identity::parse(&"a".repeat(MAX_IDENTITY_LEN + 1)),
            Err(IdentityError::TooLong(MAX_IDENTITY_LEN + 1))
        );
        assert_eq!(
            Identity::parse("user\n42"),
            Err(IdentityError::ControlCharacters)
        );
    }

    #[test]
    fn test_identity_serde() {
        let id: Identity = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(id.as_str(), "alice");
        assert!(serde_json::from_str::<Identity>("\"\"").is_err());
    }

    #[test]
    fn test_categories() {
        assert_eq!(FileCategory::from_filename("Photo.JPG"), FileCategory::Images);
        assert_eq!(FileCategory::from_filename("report.pdf"), FileCategory::Documents);
        assert_eq!(FileCategory::from_filename("clip.mkv"), FileCategory::Videos);
        assert_eq!(FileCategory::from_filename("song.ogg"), FileCategory::Audio);
        assert_eq!(FileCategory::from_filename("archive.tar.gz"), FileCategory::Others);
        assert_eq!(FileCategory::from_filename("README"), FileCategory::Others);
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("notes.TXT"), "txt");
        assert_eq!(file_type("Makefile"), "unknown");
        assert_eq!(file_type("trailing."), "unknown");
        assert_eq!(file_type(".bashrc"), "bashrc");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "0.50 KB");
        assert_eq!(human_size(1024 * 1024), "1024.00 KB");
        assert_eq!(human_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
    }
}
