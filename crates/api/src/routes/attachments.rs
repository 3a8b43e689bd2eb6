//! Attachment lifecycle routes.
//!
//! Each route maps one host lifecycle event onto `UploadRouter`. Upload
//! bodies are multipart and buffered in memory before routing.

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use lhl_core::attachment::legacy::parse_legacy_record;
use lhl_core::attachment::{AttachmentHandler, AttachmentRecord, UploadRequest};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attachments", post(upload_attachment))
        .route("/attachments/modify", post(modify_attachment))
        .route("/attachments/delete", post(delete_attachment))
        .route("/attachments/url", post(attachment_url))
        .route("/attachments/migrate", post(migrate_attachment))
}

/// Response for a delete request.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether the backing file was removed.
    pub deleted: bool,
}

/// Response for a URL request.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Public URL, empty if it cannot be resolved.
    pub url: String,
}

/// Record text written by the old plugin.
#[derive(Debug, Deserialize)]
pub struct MigrateRequest {
    /// PHP-serialized attachment array.
    pub text: String,
}

/// Typed replacement for a legacy record.
#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    /// Record to store in place of the legacy text.
    pub record: AttachmentRecord,
    /// Public URL of the record, empty if it cannot be resolved.
    pub url: String,
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadRequest>,
    record: Option<AttachmentRecord>,
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::validation(format!("invalid multipart body: {err}"))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                form.file = Some(UploadRequest::from_bytes(name, data));
            }
            "record" => {
                let text = field.text().await.map_err(bad_multipart)?;
                let record = serde_json::from_str(&text)
                    .map_err(|e| ApiError::validation(format!("invalid record: {e}")))?;
                form.record = Some(record);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST `/attachments`
async fn upload_attachment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentRecord>), ApiError> {
    let form = read_form(multipart).await?;
    let request = form
        .file
        .ok_or_else(|| ApiError::validation("missing file field"))?;

    let record = state
        .uploads
        .try_upload(request)
        .await
        .inspect_err(|e| warn!(error = %e, kind = e.kind().as_str(), "Upload rejected"))?;

    info!(name = %record.name, remote = record.is_remote(), "Attachment uploaded");
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST `/attachments/modify`
async fn modify_attachment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AttachmentRecord>, ApiError> {
    let form = read_form(multipart).await?;
    let record = form
        .record
        .ok_or_else(|| ApiError::validation("missing record field"))?;
    let request = form
        .file
        .ok_or_else(|| ApiError::validation("missing file field"))?;

    let updated = state
        .uploads
        .try_modify(&record, request)
        .await
        .inspect_err(|e| warn!(error = %e, kind = e.kind().as_str(), "Modify rejected"))?;

    info!(name = %updated.name, remote = updated.is_remote(), "Attachment replaced");
    Ok(Json(updated))
}

/// POST `/attachments/delete`
async fn delete_attachment(
    State(state): State<AppState>,
    Json(record): Json<AttachmentRecord>,
) -> Json<DeleteResponse> {
    let deleted = state.uploads.delete(&record).await;
    Json(DeleteResponse { deleted })
}

/// POST `/attachments/url`
async fn attachment_url(
    State(state): State<AppState>,
    Json(record): Json<AttachmentRecord>,
) -> Json<UrlResponse> {
    Json(UrlResponse {
        url: state.uploads.resolve_url(&record),
    })
}

/// POST `/attachments/migrate`
async fn migrate_attachment(
    State(state): State<AppState>,
    Json(body): Json<MigrateRequest>,
) -> Result<Json<MigrateResponse>, ApiError> {
    let record = parse_legacy_record(&body.text)
        .ok_or_else(|| ApiError::unprocessable("not a legacy attachment record"))?;
    let url = state.uploads.resolve_url(&record);

    info!(name = %record.name, remote = record.is_remote(), "Legacy record migrated");
    Ok(Json(MigrateResponse { record, url }))
}
