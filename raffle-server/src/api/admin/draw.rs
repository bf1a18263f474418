use axum::{Json, body::Bytes, extract::State};
use raffle_sdk::objects::{DrawRequest, WinnerRecord};

use super::{AdminApiError, parse_optional_json};
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /api/draw` – run a draw.
///
/// Body is optional. `prizeId` targets a prize, `participantId` draws
/// against a chosen participant; either may be omitted to pick at random.
pub async fn draw(
    State(state): State<AppState>,
    _auth: AdminAuth,
    body: Bytes,
) -> Result<Json<WinnerRecord>, AdminApiError> {
    let request: DrawRequest = parse_optional_json(&body)?;

    let winner = match request.participant_id {
        Some(participant) => {
            state
                .coordinator
                .draw_for(participant, request.prize_id)
                .await?
        }
        None => state.coordinator.draw(request.prize_id).await?,
    };
    Ok(Json(winner))
}
