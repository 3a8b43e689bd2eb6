//! Storage target discovery for the administrator.
//!
//! Runs outside the upload lifecycle: given a token, list the targets the
//! image service offers so one can be bound into the plugin settings.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::remote::{RemoteStorage, StorageTarget};

/// Message returned when no token was supplied.
pub const EMPTY_TOKEN_MESSAGE: &str = "Token 不能为空";

/// Message returned when the image service could not be queried.
pub const FETCH_FAILED_MESSAGE: &str = "获取存储策略失败，请检查 Token 是否正确";

/// Result of a discovery request, as sent to the configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// Whether the listing succeeded.
    pub success: bool,
    /// Available storage targets on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storages: Option<Vec<StorageTarget>>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DiscoveryResponse {
    /// Successful listing.
    #[must_use]
    pub fn found(storages: Vec<StorageTarget>) -> Self {
        Self {
            success: true,
            storages: Some(storages),
            message: None,
        }
    }

    /// Failed listing.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            storages: None,
            message: Some(message.into()),
        }
    }
}

/// List the storage targets available to `token`.
///
/// Never fails: problems are logged and reported in the response.
pub async fn discover_storages<R: RemoteStorage>(remote: &R, token: &str) -> DiscoveryResponse {
    if token.trim().is_empty() {
        return DiscoveryResponse::failed(EMPTY_TOKEN_MESSAGE);
    }

    match remote.list_storages(token).await {
        Ok(storages) => {
            info!(count = storages.len(), "Storage targets discovered");
            DiscoveryResponse::found(storages)
        }
        Err(e) => {
            error!(error = %e, "Storage discovery failed");
            DiscoveryResponse::failed(FETCH_FAILED_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentRecord;
    use crate::remote::{RemoteError, RemoteFile};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Remote double returning a fixed listing and counting calls.
    struct StaticRemote {
        storages: Option<Vec<StorageTarget>>,
        calls: AtomicUsize,
    }

    impl StaticRemote {
        fn new(storages: Option<Vec<StorageTarget>>) -> Self {
            Self {
                storages,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RemoteStorage for StaticRemote {
        async fn list_storages(&self, _token: &str) -> Result<Vec<StorageTarget>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.storages
                .clone()
                .ok_or(RemoteError::HttpStatus { status: 401 })
        }

        async fn upload(
            &self,
            _token: &str,
            _storage_id: &str,
            _file: RemoteFile,
        ) -> Result<AttachmentRecord, RemoteError> {
            unreachable!("discovery never uploads")
        }

        async fn delete(&self, _token: &str, _remote_id: &str) -> Result<(), RemoteError> {
            unreachable!("discovery never deletes")
        }
    }

    #[tokio::test]
    async fn test_empty_token_makes_no_call() {
        let remote = StaticRemote::new(Some(Vec::new()));
        let response = discover_storages(&remote, "  ").await;

        assert_eq!(response, DiscoveryResponse::failed("Token 不能为空"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success() {
        let remote = StaticRemote::new(Some(vec![StorageTarget {
            id: 1,
            name: "Default".to_string(),
        }]));
        let response = discover_storages(&remote, "1|token").await;

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({"success": true, "storages": [{"id": 1, "name": "Default"}]})
        );
    }

    #[tokio::test]
    async fn test_failure_is_structured() {
        let remote = StaticRemote::new(None);
        let response = discover_storages(&remote, "bad").await;

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({"success": false, "message": FETCH_FAILED_MESSAGE})
        );
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }
}
