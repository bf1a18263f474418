use axum::{Json, body::Bytes, extract::State};
use raffle_sdk::objects::{RegisterAwardRequest, WinnerRecord};

use super::{AdminApiError, parse_optional_json};
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /api/awards` – record an award decided outside the wheel.
///
/// Both `participantId` and `prizeId` are required; a missing one is a
/// conflict, not a malformed request.
pub async fn register_award(
    State(state): State<AppState>,
    _auth: AdminAuth,
    body: Bytes,
) -> Result<Json<WinnerRecord>, AdminApiError> {
    let request: RegisterAwardRequest = parse_optional_json(&body)?;
    let winner = state
        .coordinator
        .register_award(request.participant_id, request.prize_id)
        .await?;
    Ok(Json(winner))
}
