//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use mistguard_domain::error::MistguardError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`MistguardError`] to an HTTP response with appropriate status code.
pub struct ApiError(MistguardError);

impl<E: Into<MistguardError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MistguardError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            MistguardError::InvalidInput(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            MistguardError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            MistguardError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            MistguardError::Platform(err) => {
                tracing::error!(error = %err, "platform error");
                (StatusCode::BAD_GATEWAY, "platform unavailable".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
