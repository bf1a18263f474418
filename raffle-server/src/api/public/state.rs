use axum::{Json, extract::State};
use raffle_sdk::objects::RaffleState;

use super::PublicApiError;
use crate::state::AppState;

/// `GET /api/state` – current pools and recent winners.
pub async fn get_state(State(state): State<AppState>) -> Result<Json<RaffleState>, PublicApiError> {
    Ok(Json(state.coordinator.state().await?))
}
