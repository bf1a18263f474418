//! Custom Axum extractors for request authentication.
//!
//! Provides `AdminAuth`, which checks the bearer token issued by
//! `POST /api/auth/login` against the active admin session. Header parsing
//! is delegated to [`raffle_sdk::auth`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use raffle_sdk::auth::parse_bearer;

use crate::state::AppState;

/// Proof that the request carried the active admin token.
///
/// Rejection happens before the handler body runs, so a rejected request
/// never reaches the coordinator.
pub struct AdminAuth;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid Authorization header format")]
    InvalidHeader,
    #[error("invalid or expired admin token")]
    InvalidToken,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AdminAuthError::MissingHeader => "missing Authorization header",
            AdminAuthError::InvalidHeader => "invalid Authorization header format",
            AdminAuthError::InvalidToken => "invalid or expired admin token",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?;

        let token = parse_bearer(value).ok_or(AdminAuthError::InvalidHeader)?;

        if !state.session.validate(token).await {
            tracing::debug!("Rejected admin request with unknown token");
            return Err(AdminAuthError::InvalidToken);
        }
        Ok(AdminAuth)
    }
}
