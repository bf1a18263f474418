use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use raffle_core::auth::LoginError;
use raffle_sdk::objects::{ErrorResponse, LoginRequest, LoginResponse};

use crate::state::AppState;

/// `POST /api/auth/login` – exchange the admin secret for a session token.
///
/// A successful login replaces any previously issued token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, LoginApiError> {
    let admin = state.config.admin().await;
    let token = state.session.login(&admin, &body.password).await?;
    drop(admin);
    Ok(Json(LoginResponse { token }))
}

#[derive(Debug)]
pub struct LoginApiError(LoginError);

impl From<LoginError> for LoginApiError {
    fn from(value: LoginError) -> Self {
        Self(value)
    }
}

impl IntoResponse for LoginApiError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            LoginError::InvalidSecret => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "invalid credentials".to_string(),
                }),
            )
                .into_response(),
            LoginError::Rng => {
                tracing::error!("Failed to generate admin token");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
