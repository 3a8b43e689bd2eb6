//! Admin routes backing the plugin settings screen.

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::post,
};
use lhl_core::discovery::{self, DiscoveryResponse};
use serde::Deserialize;

use crate::AppState;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/storages", post(list_storages))
}

/// Token submitted by the settings screen.
#[derive(Debug, Default, Deserialize)]
pub struct StorageListRequest {
    /// API token to try.
    #[serde(default)]
    pub token: String,
}

/// POST `/admin/storages`
///
/// Accepts the token as a form field or a JSON body. Always answers 200;
/// failures are reported in the body.
async fn list_storages(State(state): State<AppState>, request: Request) -> Response {
    let body = match read_request(request).await {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let response: DiscoveryResponse =
        discovery::discover_storages(state.remote.as_ref(), &body.token).await;
    Json(response).into_response()
}

async fn read_request(request: Request) -> Result<StorageListRequest, Response> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        Json::<StorageListRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(IntoResponse::into_response)
    } else {
        Form::<StorageListRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(IntoResponse::into_response)
    }
}
