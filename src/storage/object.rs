use crate::types::{DabblebaseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One stored file, as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub key: String,
    pub path: String,
    pub size: u64,
    pub last_modified: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub files: Vec<StorageObject>,
}

/// File content to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads a file from disk, naming it after the last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                DabblebaseError::Config(format!("{} has no usable file name", path.display()))
            })?
            .to_string();

        let bytes = tokio::fs::read(path).await?;

        Ok(Self::new(file_name, bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_parses_files() {
        let response: ListResponse = serde_json::from_str(
            r#"{"files": [{"key": "k1", "path": "docs/a.txt", "size": 12, "last_modified": "2024-05-01T10:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(response.files.len(), 1);
        assert_eq!(response.files[0].path, "docs/a.txt");
        assert_eq!(response.files[0].size, 12);

        let empty: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.files.is_empty());
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let path = std::env::temp_dir().join("dabblebase-upload-test.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "dabblebase-upload-test.txt");
        assert_eq!(file.bytes, b"hello");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("dabblebase-no-such-file.txt");

        match UploadFile::from_path(&path).await {
            Err(DabblebaseError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
