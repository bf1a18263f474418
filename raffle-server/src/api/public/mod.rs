//! Public API handlers. No credential is required.

use axum::{Json, http::StatusCode, response::IntoResponse};
use raffle_core::repository::RepositoryError;
use raffle_sdk::objects::ErrorResponse;

pub mod events;
pub mod state;
pub mod winners;
pub mod ws;

/// Errors that can occur in public API handlers.
#[derive(Debug)]
pub enum PublicApiError {
    InvalidQuery(String),
    Storage(RepositoryError),
}

impl From<RepositoryError> for PublicApiError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl IntoResponse for PublicApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PublicApiError::InvalidQuery(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            PublicApiError::Storage(e) => {
                tracing::error!(error = %e, "Public API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
