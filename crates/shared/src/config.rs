//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::settings::PluginSettings;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote image storage configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Upload routing and local storage configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Host-owned plugin settings.
    #[serde(default)]
    pub plugin: PluginSettings,
    /// Diagnostics log configuration.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Browser origins allowed to call the API cross-origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

/// Remote image storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the image service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Skip certificate verification for the image service.
    ///
    /// Defaults to `true` to stay compatible with deployments behind
    /// self-signed or misconfigured certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl RemoteConfig {
    /// Default image service.
    pub const DEFAULT_BASE_URL: &'static str = "https://img.lhl.one";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str = "LHLImagesUpload/2.0.0";

    /// Create a config pointing at `base_url` with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

fn default_base_url() -> String {
    RemoteConfig::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    RemoteConfig::DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    RemoteConfig::DEFAULT_USER_AGENT.to_string()
}

fn default_accept_invalid_certs() -> bool {
    true
}

/// Upload routing and local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Base directory for non-image uploads.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Public path under which `base_dir` is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Public site URL used to build attachment URLs.
    #[serde(default)]
    pub site_url: String,
    /// Extensions the host accepts for upload.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    /// Whether the host environment permits direct filesystem writes.
    #[serde(default = "default_direct_writes")]
    pub direct_writes: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            public_prefix: default_public_prefix(),
            site_url: String::new(),
            allowed_types: default_allowed_types(),
            direct_writes: default_direct_writes(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./usr/uploads")
}

fn default_public_prefix() -> String {
    "/usr/uploads".to_string()
}

fn default_allowed_types() -> Vec<String> {
    [
        // Images
        "gif", "jpg", "jpeg", "png", "bmp", "ico", "webp", "svg", "tiff", "avif",
        // Media
        "mp3", "mp4", "mov", "wmv", "avi", "flv",
        // Documents
        "txt", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        // Archives
        "zip", "rar", "7z", "gz",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_direct_writes() -> bool {
    true
}

/// Diagnostics log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    /// Append-only file receiving remote upload failures.
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            error_log: default_error_log(),
        }
    }
}

fn default_error_log() -> PathBuf {
    PathBuf::from("./error.log")
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LHL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
