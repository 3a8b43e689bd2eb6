//! Local disk storage for non-image uploads.
//!
//! Files land in a year/month bucket under the host's upload directory:
//!
//! ```text
//! {base_dir}/
//! └── 2026/
//!     └── 10/
//!         ├── 3141592653.pdf
//!         └── 2718281828.zip
//! ```
//!
//! Filenames are the CRC-32 of a fresh UUID, so concurrent uploads never need
//! to coordinate.

mod allocator;
mod error;

pub use allocator::LocalPathAllocator;
pub use error::LocalStorageError;
