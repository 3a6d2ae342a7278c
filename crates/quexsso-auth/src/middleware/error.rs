//! Error response handling.
//!
//! Token failures answer with a JSON body `{ "error": <message> }`; every
//! other failure answers with a plain-text message. Server-side failures
//! never leak their details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

const INTERNAL_MESSAGE: &str = "Internal server error.";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_code(&self);

        match self {
            AuthError::InvalidToken { message } | AuthError::WrongTokenType { message } => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            AuthError::Storage { .. }
            | AuthError::Configuration { .. }
            | AuthError::Internal { .. } => {
                tracing::error!(category = %self.category(), error = %self, "Request failed");
                (status, INTERNAL_MESSAGE).into_response()
            }
            AuthError::Unauthenticated { message }
            | AuthError::Forbidden { message }
            | AuthError::NotFound { message }
            | AuthError::Conflict { message }
            | AuthError::InvalidRequest { message } => (status, message).into_response(),
        }
    }
}

/// HTTP status for an error.
#[must_use]
pub fn status_code(error: &AuthError) -> StatusCode {
    match error {
        AuthError::Unauthenticated { .. }
        | AuthError::Forbidden { .. }
        | AuthError::InvalidToken { .. }
        | AuthError::WrongTokenType { .. } => StatusCode::FORBIDDEN,
        AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::Conflict { .. } => StatusCode::CONFLICT,
        AuthError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::Storage { .. }
        | AuthError::Configuration { .. }
        | AuthError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
