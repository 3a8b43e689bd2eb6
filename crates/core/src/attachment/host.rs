//! Host-side collaborators: environment policy and the lifecycle contract.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use lhl_shared::config::UploadConfig;

use super::types::{AttachmentRecord, UploadRequest};

/// What the host content-management system provides to the adapter.
pub trait HostEnvironment: Send + Sync {
    /// Whether the host accepts uploads with this extension.
    fn is_allowed_type(&self, ext: &str) -> bool;

    /// Whether files may be written to the local filesystem.
    fn allows_direct_writes(&self) -> bool;

    /// Base directory for non-image uploads.
    fn upload_dir(&self) -> &Path;

    /// Public path under which the upload directory is served.
    fn public_prefix(&self) -> &str;

    /// Public site URL.
    fn site_url(&self) -> &str;
}

/// The four upload lifecycle callbacks a host registers.
///
/// Failures never escape: an absent record, `false` or an empty string tells
/// the host the operation did not happen.
pub trait AttachmentHandler: Send + Sync {
    /// Store a new upload.
    fn upload(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Option<AttachmentRecord>> + Send;

    /// Remove the file behind a record.
    fn delete(&self, record: &AttachmentRecord) -> impl Future<Output = bool> + Send;

    /// Replace the file behind a record.
    fn modify(
        &self,
        record: &AttachmentRecord,
        request: UploadRequest,
    ) -> impl Future<Output = Option<AttachmentRecord>> + Send;

    /// Public URL of a record.
    fn resolve_url(&self, record: &AttachmentRecord) -> String;
}

/// Configuration-backed host environment.
#[derive(Debug, Clone)]
pub struct HostPolicy {
    allowed_types: HashSet<String>,
    direct_writes: bool,
    upload_dir: PathBuf,
    public_prefix: String,
    site_url: String,
}

impl HostPolicy {
    /// Build a policy from the `upload` configuration section.
    #[must_use]
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            allowed_types: config
                .allowed_types
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
            direct_writes: config.direct_writes,
            upload_dir: config.base_dir.clone(),
            public_prefix: config.public_prefix.clone(),
            site_url: config.site_url.clone(),
        }
    }

    /// Set the upload directory.
    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Set the site URL.
    #[must_use]
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }

    /// Set the public path the upload directory is served under.
    #[must_use]
    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    /// Set whether direct filesystem writes are allowed.
    #[must_use]
    pub fn with_direct_writes(mut self, allowed: bool) -> Self {
        self.direct_writes = allowed;
        self
    }
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl HostEnvironment for HostPolicy {
    fn is_allowed_type(&self, ext: &str) -> bool {
        !ext.is_empty() && self.allowed_types.contains(&ext.to_ascii_lowercase())
    }

    fn allows_direct_writes(&self) -> bool {
        self.direct_writes
    }

    fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    fn site_url(&self) -> &str {
        &self.site_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types() {
        let policy = HostPolicy::default();
        assert!(policy.is_allowed_type("png"));
        assert!(policy.is_allowed_type("PDF"));
        assert!(!policy.is_allowed_type("exe"));
        assert!(!policy.is_allowed_type("php"));
        assert!(!policy.is_allowed_type(""));
    }

    #[test]
    fn test_from_config_normalizes_types() {
        let config = UploadConfig {
            allowed_types: vec![" TXT ".to_string()],
            ..UploadConfig::default()
        };
        let policy = HostPolicy::from_config(&config);
        assert!(policy.is_allowed_type("txt"));
        assert!(!policy.is_allowed_type("png"));
    }

    #[test]
    fn test_builders() {
        let policy = HostPolicy::default()
            .with_upload_dir("/srv/usr/uploads")
            .with_site_url("https://blog.example.com")
            .with_direct_writes(false);
        assert_eq!(policy.upload_dir(), Path::new("/srv/usr/uploads"));
        assert_eq!(policy.site_url(), "https://blog.example.com");
        assert!(!policy.allows_direct_writes());
        assert_eq!(policy.public_prefix(), "/usr/uploads");
    }
}
