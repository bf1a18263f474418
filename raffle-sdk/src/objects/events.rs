//! Live-update event types.
//!
//! `GET /events` streams these as Server-Sent Events (event name plus JSON
//! data) and `GET /ws` sends them as JSON text frames.
//!
//! # Protocol
//!
//! 1. The first event on every new stream is `state` (or `error` if the
//!    server could not read the current state).
//! 2. Each draw produces `spin-start`, then either `spin-complete` followed
//!    by `state`, or `error`.
//! 3. Events may be dropped for a slow consumer. Every `state` event is a
//!    full snapshot, so a client resynchronises on the next one.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::raffle::{Participant, Prize, RaffleState, WinnerRecord};

/// A live-update event.
///
/// Serialized as an adjacently-tagged JSON object:
///
/// ```json
/// {"type":"spin-start","data":{ ... }}
/// {"type":"error","data":{"kind":"conflict","message":"no prizes available"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum RaffleEvent {
    /// Full raffle snapshot.
    State(RaffleState),
    /// A draw has picked its candidates and is about to commit.
    SpinStart(SpinEnvelope),
    /// A draw committed and produced this award.
    SpinComplete(WinnerRecord),
    /// A draw (or the initial snapshot) failed.
    Error(EventError),
}

impl RaffleEvent {
    pub const STATE: &'static str = "state";
    pub const SPIN_START: &'static str = "spin-start";
    pub const SPIN_COMPLETE: &'static str = "spin-complete";
    pub const ERROR: &'static str = "error";

    /// The event name used as the SSE `event:` field and the JSON `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            RaffleEvent::State(_) => Self::STATE,
            RaffleEvent::SpinStart(_) => Self::SPIN_START,
            RaffleEvent::SpinComplete(_) => Self::SPIN_COMPLETE,
            RaffleEvent::Error(_) => Self::ERROR,
        }
    }

    /// Serialize only the payload (the `data` part) as JSON.
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            RaffleEvent::State(state) => serde_json::to_string(state),
            RaffleEvent::SpinStart(spin) => serde_json::to_string(spin),
            RaffleEvent::SpinComplete(winner) => serde_json::to_string(winner),
            RaffleEvent::Error(error) => serde_json::to_string(error),
        }
    }
}

/// Payload of `spin-start`: the wheel animation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinEnvelope {
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// The prize the wheel will land on.
    pub target_prize: Prize,
    /// The participant selected for the prize.
    pub participant: Participant,
    /// Every eligible prize at the moment of the draw, in wheel order.
    pub segments: Vec<Prize>,
    pub remaining_people: usize,
    pub remaining_prizes: usize,
}

/// Whether an error was caused by the raffle's state or by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventErrorKind {
    /// The request conflicts with the current pools (nothing left, prize
    /// already awarded, ...). Retrying without a change will fail again.
    Conflict,
    /// Storage or other internal failure.
    Internal,
}

/// Payload of `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventError {
    pub kind: EventErrorKind,
    pub message: String,
}

impl EventError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: EventErrorKind::Conflict,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: EventErrorKind::Internal,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::raffle::{ParticipantId, PrizeId};
    use time::macros::datetime;

    fn spin() -> SpinEnvelope {
        let prize = Prize {
            id: PrizeId(1),
            name: "Surprise Box".into(),
            description: "Wrapped in red".into(),
        };
        SpinEnvelope {
            started_at: datetime!(2024-12-24 20:00:00 UTC),
            target_prize: prize.clone(),
            participant: Participant {
                id: ParticipantId(4),
                name: "Mateo".into(),
                email: "mateo@example.com".into(),
            },
            segments: vec![prize],
            remaining_people: 5,
            remaining_prizes: 1,
        }
    }

    #[test]
    fn test_event_is_adjacently_tagged() {
        let json = serde_json::to_value(RaffleEvent::SpinStart(spin())).unwrap();
        assert_eq!(json["type"], "spin-start");
        assert_eq!(json["data"]["targetPrize"]["id"], 1);
        assert_eq!(json["data"]["participant"]["id"], 4);
        assert_eq!(json["data"]["startedAt"], "2024-12-24T20:00:00Z");
        assert_eq!(json["data"]["remainingPeople"], 5);

        let json =
            serde_json::to_value(RaffleEvent::Error(EventError::conflict("no prizes available")))
                .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["kind"], "conflict");
        assert_eq!(json["data"]["message"], "no prizes available");
    }

    #[test]
    fn test_names_match_tags() {
        let events = [
            RaffleEvent::State(RaffleState::default()),
            RaffleEvent::SpinStart(spin()),
            RaffleEvent::Error(EventError::internal("boom")),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_payload_json_is_the_data_field() {
        let event = RaffleEvent::SpinStart(spin());
        let payload: serde_json::Value =
            serde_json::from_str(&event.payload_json().unwrap()).unwrap();
        let tagged = serde_json::to_value(&event).unwrap();
        assert_eq!(payload, tagged["data"]);
    }
}
