//! Upload routing and remote image storage for LHL Images.
//!
//! This crate intercepts a host CMS's attachment lifecycle. Images are sent to
//! the remote image service, everything else is stored on local disk. It has
//! ZERO web framework dependencies; the HTTP surface lives in `lhl-api`.
//!
//! # Modules
//!
//! - `naming` - Untrusted filename sanitising and image classification
//! - `local` - Year/month bucketed local storage for non-images
//! - `remote` - Image service client (list targets, upload, delete)
//! - `diagnostics` - Append-only log of failed remote uploads
//! - `attachment` - Lifecycle router and the host callback contract
//! - `discovery` - Storage target discovery for the administrator

pub mod attachment;
pub mod diagnostics;
pub mod discovery;
pub mod local;
pub mod naming;
pub mod remote;
