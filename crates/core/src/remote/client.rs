//! HTTP client for the image service.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use lhl_shared::config::RemoteConfig;
use lhl_shared::settings::parse_storage_target;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{error, info, warn};

use super::error::RemoteError;
use super::types::{Envelope, StorageList, StorageTarget, UploadedImage};
use crate::attachment::AttachmentRecord;
use crate::diagnostics::DiagnosticsLog;

const GROUP_PATH: &str = "/api/v2/group";
const UPLOAD_PATH: &str = "/api/v2/upload";
const IMAGES_PATH: &str = "/api/v2/images";

/// A file about to be sent to the image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Filename presented in the multipart body.
    pub file_name: String,
    /// File bytes.
    pub content: Bytes,
}

/// Remote image storage operations.
///
/// Implemented by [`RemoteStorageClient`]; tests substitute recording doubles.
pub trait RemoteStorage: Send + Sync {
    /// List the storage targets available to `token`.
    fn list_storages(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<StorageTarget>, RemoteError>> + Send;

    /// Upload a file into the storage target `storage_id`.
    ///
    /// `storage_id` is the raw configured value; it must be a positive integer.
    fn upload(
        &self,
        token: &str,
        storage_id: &str,
        file: RemoteFile,
    ) -> impl Future<Output = Result<AttachmentRecord, RemoteError>> + Send;

    /// Delete the remote object `remote_id`.
    fn delete(
        &self,
        token: &str,
        remote_id: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// reqwest-backed image service client.
///
/// Certificate verification follows `RemoteConfig::accept_invalid_certs`,
/// which is on by default for compatibility with existing deployments.
#[derive(Debug, Clone)]
pub struct RemoteStorageClient {
    http: Client,
    base_url: String,
    diagnostics: DiagnosticsLog,
}

impl RemoteStorageClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig, diagnostics: DiagnosticsLog) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if config.accept_invalid_certs {
            warn!(base_url = %config.base_url, "TLS certificate verification is disabled");
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            diagnostics,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Pull `data` out of a successful upload response.
    fn parse_upload(body: &str) -> Result<UploadedImage, RemoteError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| RemoteError::decode(e.to_string()))?;
        if !envelope.is_success() {
            return Err(RemoteError::rejected(envelope.status, body));
        }
        let data = envelope
            .data
            .ok_or_else(|| RemoteError::decode("missing data"))?;
        serde_json::from_value(data).map_err(|e| RemoteError::decode(e.to_string()))
    }
}

impl RemoteStorage for RemoteStorageClient {
    #[tracing::instrument(skip_all)]
    async fn list_storages(&self, token: &str) -> Result<Vec<StorageTarget>, RemoteError> {
        let response = self
            .http
            .get(self.endpoint(GROUP_PATH))
            .bearer_auth(token)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Storage listing got no response"))?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Storage listing returned unexpected HTTP status");
            return Err(RemoteError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Storage listing returned malformed body");
            RemoteError::decode(e.to_string())
        })?;

        if !envelope.is_success() {
            error!(
                status = envelope.status.as_deref().unwrap_or("unknown"),
                "Storage listing rejected"
            );
            return Err(RemoteError::rejected(envelope.status, body));
        }

        let storages = match envelope.data {
            Some(data) if !data.is_null() => serde_json::from_value::<StorageList>(data)
                .map_err(|e| RemoteError::decode(e.to_string()))?
                .into_targets(),
            _ => Vec::new(),
        };

        info!(count = storages.len(), "Fetched storage targets");
        Ok(storages)
    }

    #[tracing::instrument(skip(self, token, file), fields(file_name = %file.file_name))]
    async fn upload(
        &self,
        token: &str,
        storage_id: &str,
        file: RemoteFile,
    ) -> Result<AttachmentRecord, RemoteError> {
        let Some(storage_id) = parse_storage_target(storage_id) else {
            warn!("Refusing image upload without a storage target");
            self.diagnostics.record_missing_storage_target().await;
            return Err(RemoteError::MissingStorageTarget);
        };

        let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
        let part = Part::bytes(file.content.to_vec())
            .file_name(file.file_name)
            .mime_str(mime.essence_str())?;
        let form = Form::new()
            .part("file", part)
            .text("storage_id", storage_id.to_string());

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Image upload got no response"))?;

        let status = response.status();
        let body = response.text().await?;

        match Self::parse_upload(&body) {
            Ok(image) => {
                info!(remote_id = %image.id, url = %image.public_url, "Image uploaded");
                Ok(image.into_record())
            }
            Err(e) => {
                error!(status = status.as_u16(), error = %e, "Image upload failed");
                self.diagnostics.record_upload_failure(&body).await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, token))]
    async fn delete(&self, token: &str, remote_id: &str) -> Result<(), RemoteError> {
        let id: u64 = remote_id
            .trim()
            .parse()
            .map_err(|_| RemoteError::InvalidRemoteId(remote_id.to_string()))?;

        let response = self
            .http
            .delete(format!("{}/{id}", self.endpoint(IMAGES_PATH)))
            .bearer_auth(token)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Image delete got no response"))?;

        let body = response.text().await?;
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| RemoteError::decode(e.to_string()))?;

        if envelope.is_success() {
            info!(remote_id = id, "Remote image deleted");
            Ok(())
        } else {
            warn!(
                remote_id = id,
                status = envelope.status.as_deref().unwrap_or("unknown"),
                "Remote image delete rejected"
            );
            Err(RemoteError::rejected(envelope.status, body))
        }
    }
}
