//! Attachment lifecycle handling.
//!
//! This module provides the host-facing side of the adapter:
//! - Upload, delete, modify and URL resolution for attachments
//! - Routing between local disk and the remote image service
//! - The callback contract a host registers
//! - Migration of records written by the old plugin

mod error;
mod host;
pub mod legacy;
mod router;
mod types;

pub use error::{AttachmentError, ErrorKind};
pub use host::{AttachmentHandler, HostEnvironment, HostPolicy};
pub use router::{StorageRoute, UploadRouter};
pub use types::{AttachmentRecord, FileContent, RemoteObject, UploadRequest};
