//! Wire types of the image service API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::attachment::{AttachmentRecord, RemoteObject};

/// Status value marking a successful API call.
pub(crate) const STATUS_SUCCESS: &str = "success";

/// A storage target offered by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTarget {
    /// Target identifier.
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}

/// `data` of the storage listing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StorageList {
    /// Absent and `null` both mean no targets.
    #[serde(default)]
    storages: Option<Vec<StorageTarget>>,
}

impl StorageList {
    pub fn into_targets(self) -> Vec<StorageTarget> {
        self.storages.unwrap_or_default()
    }
}

/// `data` of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    /// Remote identifier.
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    /// MD5 of the stored content.
    pub md5: String,
    /// Stored filename.
    pub filename: String,
    /// Absolute public URL.
    pub public_url: String,
    /// Size reported by the service.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: u64,
    /// Extension reported by the service.
    pub extension: String,
    /// MIME type reported by the service.
    #[serde(default)]
    pub mimetype: Option<String>,
}

impl UploadedImage {
    /// Map into the record shape persisted by the host.
    #[must_use]
    pub fn into_record(self) -> AttachmentRecord {
        AttachmentRecord {
            name: self.filename,
            path: self.public_url,
            size: self.size,
            file_type: self.extension.to_ascii_lowercase(),
            mime: self.mimetype,
            remote: Some(RemoteObject {
                remote_id: self.id,
                content_hash: self.md5,
            }),
        }
    }
}

/// Accept `42`, `42.0` or `"42"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
            .ok_or_else(|| D::Error::custom(format!("invalid number: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid number: {s:?}"))),
        Value::Null => Ok(0),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}

/// Accept numeric or string identifiers.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected id, got {other}"))),
    }
}
