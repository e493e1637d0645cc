//! The error taxonomy every handler maps into

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::quote::policy::PolicyError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No token on the request.
    #[error("Unauthorized")]
    Unauthenticated,
    /// A token was presented but failed verification.
    #[error("Invalid token")]
    InvalidToken,
    /// Ownership denial. Kept at 401 rather than 403 for compatibility with
    /// the historical behavior of this API.
    #[error("Unauthorized")]
    NotOwner,
    #[error("Access denied")]
    AdminRequired,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    /// Store or signing failure. The cause is logged, never sent to the
    /// client.
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidToken | ApiError::NotOwner => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::AdminRequired => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::NotOwner => ApiError::NotOwner,
            PolicyError::AdminRequired => ApiError::AdminRequired,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("Request failed: {:#}", err);
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
