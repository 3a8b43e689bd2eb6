//! Attachment operation errors.

use std::io;

use thiserror::Error;

use crate::local::LocalStorageError;
use crate::remote::RemoteError;

/// Failure classes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or forbidden filename, extension mismatch, read-only host.
    InvalidInput,
    /// No storage target configured.
    MissingStorageTarget,
    /// No response from the image service.
    NetworkFailure,
    /// Non-success answer from the image service.
    RemoteRejected,
    /// Directory creation, file move or file delete failed.
    LocalIoFailure,
}

impl ErrorKind {
    /// Stable identifier for API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingStorageTarget => "missing_storage_target",
            Self::NetworkFailure => "network_failure",
            Self::RemoteRejected => "remote_rejected",
            Self::LocalIoFailure => "local_io_failure",
        }
    }
}

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Request rejected before any storage call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Host environment forbids direct filesystem writes.
    #[error("host environment forbids direct filesystem writes")]
    ReadOnlyHost,

    /// Upload content could not be read.
    #[error("failed to read upload content: {0}")]
    Unreadable(#[source] io::Error),

    /// Local storage failed.
    #[error(transparent)]
    Local(#[from] LocalStorageError),

    /// Remote storage failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl AttachmentError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::ReadOnlyHost => ErrorKind::InvalidInput,
            Self::Unreadable(_) | Self::Local(_) => ErrorKind::LocalIoFailure,
            Self::Remote(remote) => match remote {
                RemoteError::MissingStorageTarget => ErrorKind::MissingStorageTarget,
                RemoteError::InvalidRemoteId(_) => ErrorKind::InvalidInput,
                RemoteError::Network(_) | RemoteError::Client(_) => ErrorKind::NetworkFailure,
                RemoteError::HttpStatus { .. }
                | RemoteError::Rejected { .. }
                | RemoteError::Decode(_) => ErrorKind::RemoteRejected,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AttachmentError::invalid_input("empty").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(AttachmentError::ReadOnlyHost.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            AttachmentError::from(RemoteError::MissingStorageTarget).kind(),
            ErrorKind::MissingStorageTarget
        );
        assert_eq!(
            AttachmentError::from(RemoteError::rejected(Some("error".into()), "{}")).kind(),
            ErrorKind::RemoteRejected
        );
        assert_eq!(
            AttachmentError::from(RemoteError::HttpStatus { status: 500 }).kind(),
            ErrorKind::RemoteRejected
        );
        assert_eq!(
            AttachmentError::from(LocalStorageError::write_failed(
                "/tmp/x",
                io::Error::from(io::ErrorKind::PermissionDenied)
            ))
            .kind(),
            ErrorKind::LocalIoFailure
        );
    }

    #[test]
    fn test_kind_identifiers() {
        assert_eq!(ErrorKind::InvalidInput.as_str(), "invalid_input");
        assert_eq!(
            ErrorKind::MissingStorageTarget.as_str(),
            "missing_storage_target"
        );
        assert_eq!(ErrorKind::NetworkFailure.as_str(), "network_failure");
        assert_eq!(ErrorKind::RemoteRejected.as_str(), "remote_rejected");
        assert_eq!(ErrorKind::LocalIoFailure.as_str(), "local_io_failure");
    }
}
