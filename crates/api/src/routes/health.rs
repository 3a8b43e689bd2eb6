//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` when image uploads can proceed, `degraded` otherwise.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether a bearer token is configured.
    pub token_configured: bool,
    /// Configured storage target, if it is a usable id.
    pub storage_id: Option<u64>,
}

/// Reports whether image uploads have what they need.
///
/// Non-image uploads go to local disk and work either way, so a missing
/// storage target only degrades the service.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = state.uploads.settings();
    let token_configured = !settings.token.trim().is_empty();
    let storage_id = settings.storage_target_id();

    Json(HealthResponse {
        status: if token_configured && storage_id.is_some() {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        token_configured,
        storage_id,
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rstest::rstest;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::routes;
    use crate::routes::test_support::{json_body, state};

    #[rstest]
    #[case("1", "healthy", serde_json::json!(1))]
    #[case(" 7 ", "healthy", serde_json::json!(7))]
    #[case("", "degraded", serde_json::Value::Null)]
    #[case("abc", "degraded", serde_json::Value::Null)]
    #[tokio::test]
    async fn test_health_reports_storage_target(
        #[case] storage_id: &str,
        #[case] status: &str,
        #[case] expected_id: serde_json::Value,
    ) {
        let root = TempDir::new().expect("tempdir");
        let app = routes().with_state(state("http://127.0.0.1:9", &root, storage_id));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], status);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["token_configured"], true);
        assert_eq!(body["storage_id"], expected_id);
    }
}
