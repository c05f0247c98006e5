//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sesam_core::error::SesamError;
use serde::Serialize;
use tracing::error;

/// Error payload returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub enum ApiError {
    /// No session token was presented at all.
    MissingToken,
    /// A token was presented but resolves to no live session.
    Unauthorized,
    Service(SesamError),
}

impl From<SesamError> for ApiError {
    fn from(err: SesamError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingToken => {
                (StatusCode::FORBIDDEN, "missing session token".to_string())
            }
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "session is not valid".to_string())
            }
            ApiError::Service(err) => match &err {
                SesamError::InvalidCredentials => (StatusCode::BAD_REQUEST, err.to_string()),
                SesamError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                SesamError::AlreadyExists { .. } => (StatusCode::CONFLICT, err.to_string()),
                SesamError::InvalidExpiry { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                SesamError::CryptoFailure(_)
                | SesamError::StoreUnavailable(_)
                | SesamError::Internal(_) => {
                    // Details stay in the log; the body stays generic.
                    error!(error = %err, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
