//! Admin API request and response types.

use serde::{Deserialize, Deserializer, Serialize};

use super::raffle::{ParticipantId, PrizeId};

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Response of `POST /api/auth/login`.
///
/// The token stays valid until the next login, an admin secret reload, or a
/// server restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// Body of `POST /api/draw`.
///
/// Both fields are optional; an empty body draws a random participant for a
/// random prize. An id of `0` or below also counts as absent, which is how
/// the wheel front end posts "no selection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequest {
    /// Award this prize instead of a random one.
    #[serde(
        default,
        deserialize_with = "positive_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub prize_id: Option<PrizeId>,
    /// Award this participant instead of a random one.
    #[serde(
        default,
        deserialize_with = "positive_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub participant_id: Option<ParticipantId>,
}

/// Body of `POST /api/awards`: manually register an award chosen outside
/// the server (for example by the wheel front end).
///
/// Both ids are required. They are optional here so that a missing id is
/// reported as a raffle conflict rather than a JSON error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAwardRequest {
    #[serde(default, deserialize_with = "positive_id")]
    pub participant_id: Option<ParticipantId>,
    #[serde(default, deserialize_with = "positive_id")]
    pub prize_id: Option<PrizeId>,
}

/// Ids are positive; `null`, `0` and negatives all read as `None`.
fn positive_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    let id = Option::<i64>::deserialize(deserializer)?;
    Ok(id.filter(|id| *id > 0).map(T::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_request_fields_are_optional() {
        let empty: DrawRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, DrawRequest::default());

        let targeted: DrawRequest = serde_json::from_str(r#"{"prizeId": 3}"#).unwrap();
        assert_eq!(targeted.prize_id, Some(PrizeId(3)));
        assert_eq!(targeted.participant_id, None);

        let json = serde_json::to_string(&DrawRequest::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_register_award_accepts_partial_body() {
        let partial: RegisterAwardRequest =
            serde_json::from_str(r#"{"participantId": 9}"#).unwrap();
        assert_eq!(partial.participant_id, Some(ParticipantId(9)));
        assert_eq!(partial.prize_id, None);
    }

    #[test]
    fn test_non_positive_ids_mean_no_selection() {
        let zero: DrawRequest =
            serde_json::from_str(r#"{"prizeId": 0, "participantId": -1}"#).unwrap();
        assert_eq!(zero, DrawRequest::default());

        let null: DrawRequest = serde_json::from_str(r#"{"prizeId": null}"#).unwrap();
        assert_eq!(null.prize_id, None);

        let award: RegisterAwardRequest =
            serde_json::from_str(r#"{"participantId": 4, "prizeId": 0}"#).unwrap();
        assert_eq!(award.participant_id, Some(ParticipantId(4)));
        assert_eq!(award.prize_id, None);
    }
}
