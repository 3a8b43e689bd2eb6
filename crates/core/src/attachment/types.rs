//! Attachment types and data structures.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Bytes handed over by the host for one lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Temporary file written by the host.
    Path(PathBuf),
    /// In-memory buffer.
    Bytes(Bytes),
}

impl FileContent {
    /// Whether there is anything to read at all.
    #[must_use]
    pub fn is_retrievable(&self) -> bool {
        match self {
            Self::Path(path) => !path.as_os_str().is_empty(),
            Self::Bytes(bytes) => !bytes.is_empty(),
        }
    }

    /// Read the content into memory.
    pub async fn read(&self) -> io::Result<Bytes> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// Remove the temporary file backing this content, if any.
    pub async fn discard(self) {
        if let Self::Path(path) = self {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), error = %e, "Temporary upload not removed");
            }
        }
    }
}

/// An upload as received from the host. Lives for one lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Untrusted client-supplied filename.
    pub name: String,
    /// Uploaded bytes.
    pub content: FileContent,
    /// Size reported by the host, if known.
    pub declared_size: Option<u64>,
}

impl UploadRequest {
    /// Upload backed by a temporary file.
    #[must_use]
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Path(path.into()),
            declared_size: None,
        }
    }

    /// Upload backed by an in-memory buffer.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            declared_size: Some(bytes.len() as u64),
            content: FileContent::Bytes(bytes),
        }
    }

    /// Set the size reported by the host.
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// Reference to an object held by the remote image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Identifier assigned by the image service.
    pub remote_id: String,
    /// Content hash reported by the image service (MD5).
    pub content_hash: String,
}

/// Attachment record persisted by the host.
///
/// `remote` is populated exactly when the file was stored through the remote
/// image service; local records never carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Stored filename.
    pub name: String,
    /// Local path, or public URL for remote records.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Lower-cased extension.
    #[serde(rename = "type")]
    pub file_type: String,
    /// MIME type, when it could be determined.
    #[serde(default)]
    pub mime: Option<String>,
    /// Remote object reference.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteObject>,
}

impl AttachmentRecord {
    /// Whether the record points at the remote image service.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Identifier of the remote object, if any.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.remote_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_record_serializes_flat() {
        let record = AttachmentRecord {
            name: "x.png".to_string(),
            path: "https://img.lhl.one/x.png".to_string(),
            size: 10,
            file_type: "png".to_string(),
            mime: Some("image/png".to_string()),
            remote: Some(RemoteObject {
                remote_id: "42".to_string(),
                content_hash: "abc".to_string(),
            }),
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["type"], "png");
        assert_eq!(value["remote_id"], "42");
        assert_eq!(value["content_hash"], "abc");
    }

    #[test]
    fn test_local_record_has_no_remote_fields() {
        let value = json!({
            "name": "report.pdf",
            "path": "/srv/usr/uploads/2026/10/123.pdf",
            "size": 5,
            "type": "pdf",
            "mime": "application/pdf"
        });

        let record: AttachmentRecord = serde_json::from_value(value).expect("deserialize");
        assert!(!record.is_remote());
        assert_eq!(record.remote_id(), None);

        let back = serde_json::to_value(&record).expect("serialize");
        assert!(back.get("remote_id").is_none());
    }

    #[test]
    fn test_content_retrievable() {
        assert!(FileContent::Path(PathBuf::from("/tmp/php123")).is_retrievable());
        assert!(!FileContent::Path(PathBuf::new()).is_retrievable());
        assert!(FileContent::Bytes(Bytes::from_static(b"x")).is_retrievable());
        assert!(!FileContent::Bytes(Bytes::new()).is_retrievable());
    }

    #[test]
    fn test_from_bytes_declares_size() {
        let request = UploadRequest::from_bytes("a.txt", &b"hello"[..]);
        assert_eq!(request.declared_size, Some(5));
    }
}
