//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod admin;
pub mod attachments;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(admin::routes())
        .merge(attachments::routes())
}

#[cfg(test)]
pub(crate) mod test_support {
    use http_body_util::BodyExt;
    use lhl_core::attachment::HostPolicy;
    use lhl_core::diagnostics::DiagnosticsLog;
    use lhl_core::remote::RemoteStorageClient;
    use lhl_shared::PluginSettings;
    use lhl_shared::config::RemoteConfig;
    use tempfile::TempDir;

    use crate::AppState;

    /// State pointing at `base_url` with uploads rooted in `root`.
    pub fn state(base_url: &str, root: &TempDir, storage_id: &str) -> AppState {
        let remote = RemoteStorageClient::new(
            &RemoteConfig::new(base_url),
            DiagnosticsLog::new(root.path().join("error.log")),
        )
        .expect("client");
        let host = HostPolicy::default()
            .with_upload_dir(root.path().join("uploads"))
            .with_site_url("https://blog.example.com");

        AppState::new(remote, host, PluginSettings::new("1|token", storage_id))
    }

    pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }
}
