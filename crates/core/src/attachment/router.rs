//! Upload routing over the host lifecycle events.
//!
//! Each call walks `Received → Classified → {LocalStored | RemoteStored} →
//! Returned`, or stops at `Rejected`. Nothing survives between calls.

use std::path::{Component, Path};
use std::sync::Arc;

use lhl_shared::PluginSettings;
use tracing::{error, info, warn};

use super::error::AttachmentError;
use super::host::{AttachmentHandler, HostEnvironment, HostPolicy};
use super::types::{AttachmentRecord, UploadRequest};
use crate::local::LocalPathAllocator;
use crate::naming::{self, SafeName};
use crate::remote::{RemoteFile, RemoteStorage};

/// Where a file of a given extension is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRoute {
    /// Remote image service.
    Remote,
    /// Local upload directory.
    Local,
}

impl StorageRoute {
    /// Route for an extension: images go remote, everything else stays local.
    #[must_use]
    pub fn for_extension(ext: &str) -> Self {
        if naming::is_image(ext) {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// Dispatches lifecycle events to local or remote storage.
pub struct UploadRouter<R: RemoteStorage, H: HostEnvironment = HostPolicy> {
    remote: Arc<R>,
    host: Arc<H>,
    local: LocalPathAllocator,
    settings: PluginSettings,
}

impl<R: RemoteStorage, H: HostEnvironment> UploadRouter<R, H> {
    /// Create a router for one set of plugin settings.
    #[must_use]
    pub fn new(remote: Arc<R>, host: Arc<H>, settings: PluginSettings) -> Self {
        let local = LocalPathAllocator::new(host.upload_dir());
        Self {
            remote,
            host,
            local,
            settings,
        }
    }

    /// Settings this router was built with.
    #[must_use]
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// Store a new upload.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The filename is empty or its extension is not allowed by the host
    /// - The host forbids direct filesystem writes
    /// - The selected storage fails
    pub async fn try_upload(
        &self,
        request: UploadRequest,
    ) -> Result<AttachmentRecord, AttachmentError> {
        if request.name.is_empty() {
            return Err(AttachmentError::invalid_input("empty filename"));
        }

        let file = SafeName::parse(&request.name);
        if !self.host.is_allowed_type(&file.extension) {
            return Err(AttachmentError::invalid_input(format!(
                "extension {:?} is not allowed",
                file.extension
            )));
        }
        if !self.host.allows_direct_writes() {
            return Err(AttachmentError::ReadOnlyHost);
        }

        self.store(&file, request).await
    }

    /// Remove the file behind a record.
    ///
    /// A local file that is already gone counts as a failure. Local paths
    /// outside the upload directory are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote delete is rejected, the image record
    /// carries no remote id, the local path lies outside the upload
    /// directory, or the local file cannot be removed.
    pub async fn try_delete(&self, record: &AttachmentRecord) -> Result<(), AttachmentError> {
        match StorageRoute::for_extension(&record.file_type) {
            StorageRoute::Remote => {
                let remote_id = record
                    .remote_id()
                    .ok_or_else(|| AttachmentError::invalid_input("image record has no remote id"))?;
                self.remote.delete(&self.settings.token, remote_id).await?;
            }
            StorageRoute::Local => {
                let path = Path::new(&record.path);
                if !self.local.contains(path).await {
                    return Err(AttachmentError::invalid_input(format!(
                        "{} is outside the upload directory",
                        record.path
                    )));
                }
                self.local.remove(path).await?;
            }
        }
        Ok(())
    }

    /// Replace the file behind a record with new content of the same type.
    ///
    /// For images the old remote object is deleted before the new one is
    /// uploaded. The two steps are not atomic: if the upload fails the record
    /// is left pointing at a deleted object.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The new filename is empty or its extension differs from the record's
    /// - The host forbids direct filesystem writes
    /// - The new content is not retrievable
    /// - The selected storage fails
    pub async fn try_modify(
        &self,
        record: &AttachmentRecord,
        request: UploadRequest,
    ) -> Result<AttachmentRecord, AttachmentError> {
        if request.name.is_empty() {
            return Err(AttachmentError::invalid_input("empty filename"));
        }

        let file = SafeName::parse(&request.name);
        if file.extension != record.file_type {
            return Err(AttachmentError::invalid_input(format!(
                "extension {:?} does not match existing type {:?}",
                file.extension, record.file_type
            )));
        }
        if !self.host.allows_direct_writes() {
            return Err(AttachmentError::ReadOnlyHost);
        }
        if !request.content.is_retrievable() {
            return Err(AttachmentError::invalid_input("upload content is not retrievable"));
        }

        if StorageRoute::for_extension(&file.extension) == StorageRoute::Remote {
            if let Err(e) = self.try_delete(record).await {
                warn!(error = %e, path = %record.path, "Old image not deleted before replacement");
            }
        }

        self.store(&file, request).await
    }

    /// Public URL of a record.
    ///
    /// Image records already hold an absolute URL. Local records are mapped
    /// from the upload directory onto the site URL; anything that cannot be
    /// mapped yields an empty string.
    pub fn resolve_url(&self, record: &AttachmentRecord) -> String {
        let ext = record
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();

        if naming::is_image(ext) {
            return record.path.clone();
        }

        self.local_url(&record.path).unwrap_or_default()
    }

    async fn store(
        &self,
        file: &SafeName,
        request: UploadRequest,
    ) -> Result<AttachmentRecord, AttachmentError> {
        match StorageRoute::for_extension(&file.extension) {
            StorageRoute::Remote => self.upload_image(file, request).await,
            StorageRoute::Local => Ok(self.local.store(file, request).await?),
        }
    }

    async fn upload_image(
        &self,
        file: &SafeName,
        request: UploadRequest,
    ) -> Result<AttachmentRecord, AttachmentError> {
        let content = request
            .content
            .read()
            .await
            .map_err(AttachmentError::Unreadable)?;

        let file_name = if file.file_name.is_empty() {
            format!("upload.{}", file.extension)
        } else {
            file.file_name.clone()
        };

        let result = self
            .remote
            .upload(
                &self.settings.token,
                &self.settings.storage_id,
                RemoteFile { file_name, content },
            )
            .await;

        request.content.discard().await;
        Ok(result?)
    }

    fn local_url(&self, path: &str) -> Option<String> {
        let prefix = self.host.public_prefix().trim_end_matches('/');
        if path.is_empty() || prefix.is_empty() {
            return None;
        }

        let relative = match Path::new(path).strip_prefix(self.host.upload_dir()) {
            Ok(rel) => to_url_path(rel)?,
            // records written under a different root still carry the marker,
            // which must end at a path separator
            Err(_) => {
                let (_, rest) = path.split_once(&format!("{prefix}/"))?;
                to_url_path(Path::new(rest))?
            }
        };

        if relative.is_empty() {
            return None;
        }

        Some(join_url(self.host.site_url(), &format!("{prefix}/{relative}")))
    }
}

/// Forward-slash form of a relative path; `None` if it escapes upward.
fn to_url_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl<R: RemoteStorage, H: HostEnvironment> AttachmentHandler for UploadRouter<R, H> {
    async fn upload(&self, request: UploadRequest) -> Option<AttachmentRecord> {
        let name = request.name.clone();
        match self.try_upload(request).await {
            Ok(record) => {
                info!(name = %name, path = %record.path, "Upload stored");
                Some(record)
            }
            Err(e) => {
                error!(name = %name, kind = e.kind().as_str(), error = %e, "Upload failed");
                None
            }
        }
    }

    async fn delete(&self, record: &AttachmentRecord) -> bool {
        match self.try_delete(record).await {
            Ok(()) => true,
            Err(e) => {
                error!(path = %record.path, kind = e.kind().as_str(), error = %e, "Delete failed");
                false
            }
        }
    }

    async fn modify(
        &self,
        record: &AttachmentRecord,
        request: UploadRequest,
    ) -> Option<AttachmentRecord> {
        match self.try_modify(record, request).await {
            Ok(updated) => Some(updated),
            Err(e) => {
                error!(path = %record.path, kind = e.kind().as_str(), error = %e, "Modify failed");
                None
            }
        }
    }

    fn resolve_url(&self, record: &AttachmentRecord) -> String {
        UploadRouter::resolve_url(self, record)
    }
}
