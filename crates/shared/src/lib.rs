//! Shared configuration, plugin settings, and errors for LHL Images.
//!
//! This crate provides common types used across all other crates:
//! - Layered application configuration
//! - Plugin settings owned by the host (API token and storage target)
//! - Application-wide error types for the HTTP boundary

pub mod config;
pub mod error;
pub mod settings;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use settings::PluginSettings;
