//! The raffle coordinator.
//!
//! Owns the single draw section. Every mutating operation (automatic draw,
//! draw against a chosen participant, manual award registration) runs the
//! whole read, decide, commit and broadcast sequence while holding it, so
//! at most one mutation is in flight per process. Reads and subscription
//! registration never take the section.
//!
//! The section also guards this instance's random source, which is seeded
//! once at construction and never shared with other coordinators.

use crate::events::{EventBus, Subscription};
use crate::repository::{RaffleRepository, RepositoryError};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use raffle_sdk::objects::{
    EventError, Participant, ParticipantId, PrizeId, RaffleEvent, RaffleState, SpinEnvelope,
    WinnerRecord,
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Default size of the recent winners window in [`RaffleState`].
pub const DEFAULT_RECENT_WINNERS: usize = 5;

/// How many times [`RaffleCoordinator::subscribe`] re-reads the snapshot
/// when a newer `state` was published while it was reading.
const SNAPSHOT_ATTEMPTS: usize = 3;

/// Message of the `error` event sent for storage failures.
const INTERNAL_ERROR_MESSAGE: &str = "internal storage error";

/// A failed draw or award registration.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("no participants available")]
    NoParticipants,

    #[error("no prizes available")]
    NoPrizes,

    #[error("prize {0} is not available")]
    PrizeUnavailable(PrizeId),

    #[error("participant {0} is not available")]
    ParticipantUnavailable(ParticipantId),

    /// A manual award was requested without a participant or a prize.
    #[error("both a participant and a prize are required to register an award")]
    NothingToRegister,

    #[error("storage error: {0}")]
    Storage(RepositoryError),
}

impl DrawError {
    /// Whether the error comes from the current pools rather than from the
    /// server. Conflicts are safe to show to the caller verbatim.
    pub fn is_conflict(&self) -> bool {
        !matches!(self, DrawError::Storage(_))
    }

    /// The payload broadcast to subscribers for this failure.
    ///
    /// Storage details are never exposed.
    pub fn to_event_error(&self) -> EventError {
        if self.is_conflict() {
            EventError::conflict(self.to_string())
        } else {
            EventError::internal(INTERNAL_ERROR_MESSAGE)
        }
    }
}

impl From<RepositoryError> for DrawError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::ParticipantUnavailable(id) => DrawError::ParticipantUnavailable(id),
            RepositoryError::PrizeUnavailable(id) => DrawError::PrizeUnavailable(id),
            other => DrawError::Storage(other),
        }
    }
}

type DrawRng = Box<dyn RngCore + Send>;

pub struct RaffleCoordinator {
    repository: Arc<dyn RaffleRepository>,
    bus: EventBus,
    recent_winners: usize,
    draw_section: Mutex<DrawRng>,
}

impl RaffleCoordinator {
    /// Create a coordinator with a freshly seeded random source.
    pub fn new(repository: Arc<dyn RaffleRepository>, recent_winners: usize) -> Self {
        Self::with_rng(repository, recent_winners, StdRng::from_os_rng())
    }

    /// Create a coordinator drawing from the given random source.
    pub fn with_rng(
        repository: Arc<dyn RaffleRepository>,
        recent_winners: usize,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            repository,
            bus: EventBus::new(),
            recent_winners: recent_winners.max(1),
            draw_section: Mutex::new(Box::new(rng)),
        }
    }

    /// Create a coordinator whose random source is seeded from `seed`.
    pub fn with_seed(repository: Arc<dyn RaffleRepository>, recent_winners: usize, seed: u64) -> Self {
        Self::with_rng(repository, recent_winners, StdRng::seed_from_u64(seed))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn recent_winners_limit(&self) -> usize {
        self.recent_winners
    }

    /// Current raffle state. Never takes the draw section.
    pub async fn state(&self) -> Result<RaffleState, RepositoryError> {
        let snapshot = self.repository.snapshot(self.recent_winners).await?;
        Ok(RaffleState::new(
            snapshot.participants,
            snapshot.prizes,
            snapshot.recent_winners,
        ))
    }

    /// The `limit` most recent awards, newest first.
    pub async fn recent_winners(&self, limit: usize) -> Result<Vec<WinnerRecord>, RepositoryError> {
        self.repository.recent_winners(limit).await
    }

    async fn state_event(&self) -> RaffleEvent {
        match self.state().await {
            Ok(state) => RaffleEvent::State(state),
            Err(e) => {
                error!(error = %e, "Failed to read raffle state");
                RaffleEvent::Error(EventError::internal(INTERNAL_ERROR_MESSAGE))
            }
        }
    }

    /// Register a live-update listener.
    ///
    /// The first item of the returned stream is the current state, or an
    /// `error` event if it could not be read. If a draw publishes a newer
    /// state while the snapshot is being read, the snapshot is re-read so
    /// the listener does not start from an outdated one.
    pub async fn subscribe(&self) -> Subscription {
        let mut attempt = 1;
        loop {
            let generation = self.bus.generation();
            let first = self.state_event().await;
            if attempt >= SNAPSHOT_ATTEMPTS {
                return self.bus.register(first);
            }
            match self.bus.register_at(generation, first) {
                Ok(subscription) => return subscription,
                Err(_) => {
                    debug!(attempt, "State changed during subscription snapshot, retrying");
                    attempt += 1;
                }
            }
        }
    }

    /// Draw a random participant for `prize`, or for a random prize.
    pub async fn draw(&self, prize: Option<PrizeId>) -> Result<WinnerRecord, DrawError> {
        self.run_draw(None, prize).await
    }

    /// Draw against a chosen participant.
    pub async fn draw_for(
        &self,
        participant: ParticipantId,
        prize: Option<PrizeId>,
    ) -> Result<WinnerRecord, DrawError> {
        self.run_draw(Some(participant), prize).await
    }

    /// Record an award decided outside the wheel.
    ///
    /// No `spin-start` is sent. Subscribers receive `spin-complete` and
    /// `state` on success, `error` otherwise.
    pub async fn register_award(
        &self,
        participant: Option<ParticipantId>,
        prize: Option<PrizeId>,
    ) -> Result<WinnerRecord, DrawError> {
        let _section = self.draw_section.lock().await;
        let result = match (participant, prize) {
            (Some(participant), Some(prize)) => self.commit_and_publish(participant, prize).await,
            _ => Err(DrawError::NothingToRegister),
        };
        if let Err(e) = &result {
            self.publish_failure(e);
        }
        result
    }

    async fn run_draw(
        &self,
        participant: Option<ParticipantId>,
        prize: Option<PrizeId>,
    ) -> Result<WinnerRecord, DrawError> {
        let mut rng = self.draw_section.lock().await;
        let result = self.draw_locked(&mut **rng, participant, prize).await;
        if let Err(e) = &result {
            self.publish_failure(e);
        }
        result
    }

    async fn draw_locked(
        &self,
        rng: &mut (dyn RngCore + Send),
        participant: Option<ParticipantId>,
        prize: Option<PrizeId>,
    ) -> Result<WinnerRecord, DrawError> {
        let participants = self.repository.eligible_participants().await?;
        let prizes = self.repository.eligible_prizes().await?;
        if participants.is_empty() {
            return Err(DrawError::NoParticipants);
        }
        if prizes.is_empty() {
            return Err(DrawError::NoPrizes);
        }

        let target_prize = match prize {
            Some(id) => prizes
                .iter()
                .find(|p| p.id == id)
                .ok_or(DrawError::PrizeUnavailable(id))?,
            None => pick(rng, &prizes).ok_or(DrawError::NoPrizes)?,
        }
        .clone();
        let chosen: Participant = match participant {
            Some(id) => participants
                .iter()
                .find(|p| p.id == id)
                .ok_or(DrawError::ParticipantUnavailable(id))?,
            None => pick(rng, &participants).ok_or(DrawError::NoParticipants)?,
        }
        .clone();

        let (participant_id, prize_id) = (chosen.id, target_prize.id);
        self.bus.broadcast(RaffleEvent::SpinStart(SpinEnvelope {
            started_at: OffsetDateTime::now_utc(),
            target_prize,
            participant: chosen,
            remaining_people: participants.len(),
            remaining_prizes: prizes.len(),
            segments: prizes,
        }));

        self.commit_and_publish(participant_id, prize_id).await
    }

    async fn commit_and_publish(
        &self,
        participant: ParticipantId,
        prize: PrizeId,
    ) -> Result<WinnerRecord, DrawError> {
        let winner = self.repository.commit_draw(participant, prize).await?;
        info!(
            winner_id = %winner.id,
            participant_id = %participant,
            prize_id = %prize,
            "Award committed"
        );
        self.bus.broadcast(RaffleEvent::SpinComplete(winner.clone()));
        let state = self.state_event().await;
        self.bus.broadcast(state);
        Ok(winner)
    }

    fn publish_failure(&self, e: &DrawError) {
        if e.is_conflict() {
            warn!(error = %e, "Draw rejected");
        } else {
            error!(error = %e, "Draw failed");
        }
        self.bus.broadcast(RaffleEvent::Error(e.to_event_error()));
    }
}

/// Uniform choice over `items`. A single item is returned without
/// consuming randomness.
fn pick<'a, T>(rng: &mut (dyn RngCore + Send), items: &'a [T]) -> Option<&'a T> {
    match items.len() {
        0 => None,
        1 => items.first(),
        len => items.get(rng.random_range(0..len)),
    }
}
