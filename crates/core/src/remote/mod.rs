//! Client for the remote image storage service.
//!
//! Three calls against a fixed base URL, each carrying a bearer token and
//! `Accept: application/json`:
//!
//! ```text
//! GET    /api/v2/group        → {status, data: {storages: [{id, name}]}}
//! POST   /api/v2/upload       → {status, data: {id, md5, filename, public_url, ...}}
//! DELETE /api/v2/images/{id}  → {status}
//! ```
//!
//! Every call is a single attempt bounded by the configured timeout.

mod client;
mod error;
mod types;

pub use client::{RemoteFile, RemoteStorage, RemoteStorageClient};
pub use error::RemoteError;
pub use types::{StorageTarget, UploadedImage};
