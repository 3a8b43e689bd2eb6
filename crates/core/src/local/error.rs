//! Local storage error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Local storage operation errors.
#[derive(Debug, Error)]
pub enum LocalStorageError {
    /// Upload directory could not be created.
    #[error("upload directory unavailable: {}", path.display())]
    StorageUnavailable {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Upload content could not be moved or written into place.
    #[error("failed to write upload to {}", path.display())]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Stored file could not be removed.
    #[error("failed to delete {}", path.display())]
    DeleteFailed {
        /// Path of the stored file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl LocalStorageError {
    /// Create a storage unavailable error.
    #[must_use]
    pub fn storage_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a write failed error.
    #[must_use]
    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a delete failed error.
    #[must_use]
    pub fn delete_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DeleteFailed {
            path: path.into(),
            source,
        }
    }
}
