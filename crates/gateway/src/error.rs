//! Mapping from relay errors to HTTP responses.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docrelay_core::error::{DocumentError, Error, ErrorKind, ProviderError};
use serde::Serialize;
use tracing::{error, warn};

/// Error body returned by every `/api` route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    /// The provider's own error body, parsed as JSON when possible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A relay error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<DocumentError> for ApiError {
    fn from(error: DocumentError) -> Self {
        Self(Error::Document(error))
    }
}

/// HTTP status for an error. Provider errors keep the provider's status.
pub fn status_for(error: &Error) -> StatusCode {
    if let Error::Provider(ProviderError::ApiError { status_code, .. }) = error {
        return StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    }

    match error.kind() {
        ErrorKind::Validation | ErrorKind::Credential => StatusCode::BAD_REQUEST,
        ErrorKind::Resolution => StatusCode::NOT_FOUND,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Provider | ErrorKind::Normalization => StatusCode::BAD_GATEWAY,
        ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ContextOverflow => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::Config | ErrorKind::Storage | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let kind = self.0.kind();

        if status.is_server_error() {
            error!(kind = kind.as_str(), error = %self.0, "Request failed");
        } else {
            warn!(kind = kind.as_str(), error = %self.0, "Request rejected");
        }

        let details = match &self.0 {
            Error::Provider(ProviderError::ApiError { body, .. }) => Some(
                serde_json::from_str(body)
                    .unwrap_or_else(|_| serde_json::Value::String(body.clone())),
            ),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.0.to_string(),
            kind,
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the [`ErrorResponse`] shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(BodyRejection))]
pub struct ApiJson<T>(pub T);

/// A request body that could not be read or deserialized.
#[derive(Debug)]
pub struct BodyRejection(JsonRejection);

impl From<JsonRejection> for BodyRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection)
    }
}

impl BodyRejection {
    /// 413 for an oversized body, 400 for everything else.
    pub fn status(&self) -> StatusCode {
        if self.0.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.0.body_text();
        warn!(status = status.as_u16(), error = %reason, "Request body rejected");

        let body = ErrorResponse {
            error: format!("Invalid request body: {reason}"),
            kind: ErrorKind::Validation,
            details: None,
        };
        (status, Json(body)).into_response()
    }
}
