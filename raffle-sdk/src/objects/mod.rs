pub mod admin;
pub mod events;
pub mod raffle;

pub use admin::{DrawRequest, LoginRequest, LoginResponse, RegisterAwardRequest};
pub use events::{EventError, EventErrorKind, RaffleEvent, SpinEnvelope};
pub use raffle::{
    ErrorResponse, Participant, ParticipantId, Prize, PrizeId, RaffleState, WinnerId,
    WinnerRecord, WinnersQuery,
};
