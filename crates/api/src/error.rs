//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lhl_core::attachment::{AttachmentError, ErrorKind};
use lhl_shared::AppError;
use serde_json::json;

/// Error returned by API handlers, rendered as `{error, message}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Malformed request.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// Well-formed request that cannot be acted on.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self(AppError::Unprocessable(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        let message = err.to_string();
        Self(match err.kind() {
            ErrorKind::InvalidInput => AppError::Unprocessable(message),
            ErrorKind::MissingStorageTarget => AppError::NotConfigured(message),
            ErrorKind::NetworkFailure | ErrorKind::RemoteRejected => {
                AppError::ExternalService(message)
            }
            ErrorKind::LocalIoFailure => AppError::Internal(message),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self.0 {
            AppError::Validation(m)
            | AppError::Unprocessable(m)
            | AppError::NotConfigured(m)
            | AppError::ExternalService(m)
            | AppError::Internal(m) => m.clone(),
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lhl_core::remote::RemoteError;

    #[test]
    fn test_invalid_input_is_unprocessable() {
        let err = ApiError::from(AttachmentError::invalid_input("empty filename"));
        assert_eq!(err.0.status_code(), 422);
    }

    #[test]
    fn test_missing_storage_target_is_not_configured() {
        let err = ApiError::from(AttachmentError::from(RemoteError::MissingStorageTarget));
        assert_eq!(err.0.status_code(), 503);
    }

    #[test]
    fn test_rejection_is_external() {
        let err = ApiError::from(AttachmentError::from(RemoteError::HttpStatus { status: 500 }));
        assert_eq!(err.0.status_code(), 502);
    }

    #[test]
    fn test_response_body_shape() {
        let response = ApiError::validation("missing file field").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
