//! Admin API handlers.
//!
//! Both endpoints go through [`AdminAuth`](crate::api::extractors::AdminAuth)
//! and then call into the coordinator, which broadcasts the outcome to every
//! live subscriber.

use axum::{Json, http::StatusCode, response::IntoResponse};
use raffle_core::coordinator::DrawError;
use raffle_sdk::objects::ErrorResponse;

pub mod draw;
pub mod register_award;

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub enum AdminApiError {
    /// The request body could not be parsed.
    BadRequest(String),
    Draw(DrawError),
}

impl From<DrawError> for AdminApiError {
    fn from(value: DrawError) -> Self {
        Self::Draw(value)
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            AdminApiError::Draw(e) if e.is_conflict() => (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response(),
            AdminApiError::Draw(e) => {
                tracing::error!(error = %e, "Admin API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

/// Parse an optional JSON body. An empty body yields `T::default()`.
pub(crate) fn parse_optional_json<T>(body: &[u8]) -> Result<T, AdminApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AdminApiError::BadRequest(format!("invalid JSON body: {e}")))
}
