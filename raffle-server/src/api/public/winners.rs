use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use raffle_sdk::objects::{WinnerRecord, WinnersQuery};

use super::PublicApiError;
use crate::config::MAX_RECENT_WINNERS;
use crate::state::AppState;

/// `GET /api/winners?limit=N` – most recent awards, newest first.
///
/// `limit` defaults to the configured recent winners window and must be
/// within `1..=100`.
pub async fn list_winners(
    State(state): State<AppState>,
    query: Result<Query<WinnersQuery>, QueryRejection>,
) -> Result<Json<Vec<WinnerRecord>>, PublicApiError> {
    let Query(query) = query.map_err(|e| PublicApiError::InvalidQuery(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or_else(|| state.coordinator.recent_winners_limit());
    if !(1..=MAX_RECENT_WINNERS).contains(&limit) {
        return Err(PublicApiError::InvalidQuery(format!(
            "limit must be between 1 and {MAX_RECENT_WINNERS}"
        )));
    }

    Ok(Json(state.coordinator.recent_winners(limit).await?))
}
