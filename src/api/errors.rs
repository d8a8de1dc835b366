use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::schemas::{ApplicationResponse, ErrorPayload};
use crate::services::grading::StoreError;
use crate::services::spreadsheet::SheetError;

/// Errors surfaced to clients through the response envelope. Unknown update
/// targets deliberately map to 400 rather than 404; the upstream contract
/// never distinguished a not-found path.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    Validation(Vec<String>),
    NotFound(String),
    Decoding(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal`
    /// variant carrying only the context string.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn from_store(err: StoreError, not_found: String, context: &str) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound(not_found),
            StoreError::Backend(err) => Self::internal(err, context),
        }
    }

    pub(crate) fn from_sheet(err: SheetError) -> Self {
        match err {
            SheetError::Decode(err) => Self::Decoding(format!("payload is not valid base64: {err}")),
            SheetError::Malformed(message) => Self::BadRequest(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorPayload { message, details: None })
            }
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorPayload {
                    message: "invalid request parameters".to_string(),
                    details: Some(details),
                },
            ),
            ApiError::NotFound(message) => {
                (StatusCode::BAD_REQUEST, ErrorPayload { message, details: None })
            }
            ApiError::Decoding(message) => {
                (StatusCode::BAD_REQUEST, ErrorPayload { message, details: None })
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorPayload { message, details: None })
            }
        };

        let body: ApplicationResponse<serde_json::Value> =
            ApplicationResponse { data: None, error: Some(payload) };
        (status, Json(body)).into_response()
    }
}
