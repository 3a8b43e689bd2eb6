//! Append-only failure log for remote uploads.
//!
//! Each entry is rendered in full and written with a single append, so
//! overlapping requests interleave whole entries and never truncate the file.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-backed diagnostics log.
#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    path: PathBuf,
}

impl DiagnosticsLog {
    /// Create a log writing to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a rejected upload together with the full response body.
    pub async fn record_upload_failure(&self, body: &str) {
        let entry = format!(
            "{} Upload Error:\n{}\n\n",
            timestamp(),
            render_body(body)
        );
        self.append(&entry).await;
    }

    /// Record an upload attempted without a storage target.
    pub async fn record_missing_storage_target(&self) {
        let entry = format!("{} Storage ID 不能为空，无法上传图片\n", timestamp());
        self.append(&entry).await;
    }

    async fn append(&self, entry: &str) {
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(entry.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to write diagnostics log");
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Pretty-print JSON bodies; anything else is logged verbatim.
fn render_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}
