//! Raffle domain objects as they appear on the wire.
//!
//! Field names are camelCase to match the browser front end.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a [`Participant`].
    ParticipantId
);
id_type!(
    /// Identifier of a [`Prize`].
    PrizeId
);
id_type!(
    /// Identifier of a [`WinnerRecord`], assigned in increasing order.
    WinnerId
);

/// A person taking part in the raffle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
}

/// A prize that can be awarded once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub id: PrizeId,
    pub name: String,
    pub description: String,
}

/// The record of one completed award. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRecord {
    pub id: WinnerId,
    pub person: Participant,
    pub prize: Prize,
    /// UTC time of the award, RFC 3339 on the wire.
    #[serde(with = "time::serde::rfc3339")]
    pub awarded_at: OffsetDateTime,
}

/// Read-only projection of the raffle returned by `GET /api/state` and
/// pushed as the `state` live event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleState {
    pub remaining_people: usize,
    pub remaining_prizes: usize,
    /// Most recent first, bounded by the server's configured window.
    pub recent_winners: Vec<WinnerRecord>,
    pub upcoming_prizes: Vec<Prize>,
    pub waiting_people: Vec<Participant>,
}

impl RaffleState {
    /// Build a state projection from the eligible pools and a recent
    /// winners window.
    pub fn new(
        waiting_people: Vec<Participant>,
        upcoming_prizes: Vec<Prize>,
        recent_winners: Vec<WinnerRecord>,
    ) -> Self {
        Self {
            remaining_people: waiting_people.len(),
            remaining_prizes: upcoming_prizes.len(),
            recent_winners,
            upcoming_prizes,
            waiting_people,
        }
    }
}

/// Query string of `GET /api/winners`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WinnersQuery {
    /// How many records to return, most recent first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn winner() -> WinnerRecord {
        WinnerRecord {
            id: WinnerId(3),
            person: Participant {
                id: ParticipantId(7),
                name: "Elena".into(),
                email: "elena@example.com".into(),
            },
            prize: Prize {
                id: PrizeId(2),
                name: "Winter Coffee".into(),
                description: "Spiced coffee kit".into(),
            },
            awarded_at: datetime!(2024-12-24 18:30:00 UTC),
        }
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = RaffleState::new(vec![], vec![], vec![winner()]);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["remainingPeople"], 0);
        assert_eq!(json["remainingPrizes"], 0);
        assert_eq!(json["recentWinners"][0]["id"], 3);
        assert_eq!(json["recentWinners"][0]["person"]["id"], 7);
        assert_eq!(
            json["recentWinners"][0]["awardedAt"],
            "2024-12-24T18:30:00Z"
        );
        assert!(json["upcomingPrizes"].as_array().unwrap().is_empty());
        assert!(json["waitingPeople"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_state_counts_follow_pools() {
        let people = vec![winner().person];
        let prizes = vec![winner().prize, winner().prize];
        let state = RaffleState::new(people, prizes, vec![]);
        assert_eq!(state.remaining_people, 1);
        assert_eq!(state.remaining_prizes, 2);
    }

    #[test]
    fn test_winner_parses_from_wire() {
        let json = r#"{
            "id": 3,
            "person": {"id": 7, "name": "Elena", "email": "elena@example.com"},
            "prize": {"id": 2, "name": "Winter Coffee", "description": "Spiced coffee kit"},
            "awardedAt": "2024-12-24T18:30:00Z"
        }"#;
        let parsed: WinnerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, winner());
    }
}
