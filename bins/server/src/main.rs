//! LHL Images server
//!
//! Runs the upload adapter behind a small HTTP API.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lhl_api::{AppState, create_router};
use lhl_core::attachment::HostPolicy;
use lhl_core::diagnostics::DiagnosticsLog;
use lhl_core::remote::RemoteStorageClient;
use lhl_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lhl=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let diagnostics = DiagnosticsLog::new(&config.diagnostics.error_log);
    let remote = RemoteStorageClient::new(&config.remote, diagnostics)?;
    info!(
        base_url = %config.remote.base_url,
        error_log = %config.diagnostics.error_log.display(),
        "Remote image storage configured"
    );

    let host = HostPolicy::from_config(&config.upload);
    info!(
        upload_dir = %config.upload.base_dir.display(),
        direct_writes = config.upload.direct_writes,
        "Local upload storage configured"
    );

    if config.plugin.storage_target_id().is_none() {
        warn!("No storage target configured; image uploads will be rejected");
    }

    if config.server.cors_origins.is_empty() {
        info!("No CORS origins configured; cross-origin requests are refused");
    }

    let state = AppState::new(remote, host, config.plugin.clone());
    let app = create_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
