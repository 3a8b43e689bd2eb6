//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Attachment lifecycle routes backed by `UploadRouter`
//! - The storage discovery handshake for the admin screen
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use lhl_core::attachment::{HostPolicy, UploadRouter};
use lhl_core::remote::RemoteStorageClient;
use lhl_shared::PluginSettings;
use lhl_shared::config::ServerConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client for the remote image service.
    pub remote: Arc<RemoteStorageClient>,
    /// Upload router bound to the configured plugin settings.
    pub uploads: Arc<UploadRouter<RemoteStorageClient>>,
}

impl AppState {
    /// Build state from its parts.
    #[must_use]
    pub fn new(remote: RemoteStorageClient, host: HostPolicy, settings: PluginSettings) -> Self {
        let remote = Arc::new(remote);
        let uploads = Arc::new(UploadRouter::new(
            Arc::clone(&remote),
            Arc::new(host),
            settings,
        ));
        Self { remote, uploads }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

/// CORS policy admitting only the configured origins.
///
/// With no origins configured, cross-origin browser requests are refused.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
