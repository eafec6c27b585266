//! Moment file metadata model

use serde::{Deserialize, Serialize};

use super::diary_entry::UNSAVED_ID;

/// Metadata tracked for a stored moment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Storage-assigned identifier, `UNSAVED_ID` until first insert
    pub id: i64,
    /// File name as provided by the user
    pub original_file_name: String,
    /// Key of the raw bytes in the file manager
    pub file_path: String,
    /// Free-form tags, unordered
    pub tags: Vec<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl FileMetadata {
    /// Create an unsaved record for a file stored under `file_path`
    #[must_use]
    pub fn new(
        original_file_name: impl Into<String>,
        file_path: impl Into<String>,
        tags: Vec<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            original_file_name: original_file_name.into(),
            file_path: file_path.into(),
            tags,
            created_at,
        }
    }

    /// Whether storage has assigned this record an id
    pub const fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Check for a tag, ignoring ASCII case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata_new_is_unsaved() {
        let meta = FileMetadata::new("a.jpg", "a.jpg", vec!["trip".to_string()], 42);
        assert!(!meta.is_persisted());
        assert_eq!(meta.created_at, 42);
    }

    #[test]
    fn test_has_tag_ignores_case() {
        let meta = FileMetadata::new("a.jpg", "a.jpg", vec!["Trip".to_string()], 0);
        assert!(meta.has_tag("trip"));
        assert!(!meta.has_tag("beach"));
    }
}
