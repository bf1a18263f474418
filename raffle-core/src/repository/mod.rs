//! Storage contract for participants, prizes and awards.
//!
//! The coordinator only relies on two guarantees from a backend:
//!
//! - [`RaffleRepository::commit_draw`] is all-or-nothing, and
//! - reads issued after a successful commit observe it.
//!
//! Two backends ship with the crate: [`InMemoryRepository`] for demos and
//! tests, and [`PgRepository`] for durable storage.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use async_trait::async_trait;
use raffle_sdk::objects::{Participant, ParticipantId, Prize, PrizeId, WinnerRecord};
use thiserror::Error;

/// Errors returned by a [`RaffleRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The participant does not exist or has already been awarded.
    #[error("participant {0} is not available")]
    ParticipantUnavailable(ParticipantId),

    /// The prize does not exist or has already been awarded.
    #[error("prize {0} is not available")]
    PrizeUnavailable(PrizeId),

    /// A recent-winners window of zero was requested.
    #[error("recent winners limit must be at least 1")]
    InvalidRecentLimit,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The eligible pools plus a window of recent awards, read together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub participants: Vec<Participant>,
    pub prizes: Vec<Prize>,
    pub recent_winners: Vec<WinnerRecord>,
}

/// Durable or in-memory store of the raffle pools and award history.
#[async_trait]
pub trait RaffleRepository: Send + Sync {
    /// Participants not yet drawn, ordered by id.
    async fn eligible_participants(&self) -> Result<Vec<Participant>, RepositoryError>;

    /// Prizes not yet awarded, ordered by id.
    async fn eligible_prizes(&self) -> Result<Vec<Prize>, RepositoryError>;

    /// The `limit` most recent awards, newest first.
    ///
    /// Fails with [`RepositoryError::InvalidRecentLimit`] when `limit` is 0.
    async fn recent_winners(&self, limit: usize) -> Result<Vec<WinnerRecord>, RepositoryError>;

    /// Read both pools and the recent winners window.
    ///
    /// Backends that can read all three consistently should override this.
    async fn snapshot(&self, recent_limit: usize) -> Result<PoolSnapshot, RepositoryError> {
        let participants = self.eligible_participants().await?;
        let prizes = self.eligible_prizes().await?;
        let recent_winners = self.recent_winners(recent_limit).await?;
        Ok(PoolSnapshot {
            participants,
            prizes,
            recent_winners,
        })
    }

    /// Atomically remove `participant` and `prize` from the eligible pools
    /// and append a new award for them.
    ///
    /// Nothing is modified unless both are still eligible.
    async fn commit_draw(
        &self,
        participant: ParticipantId,
        prize: PrizeId,
    ) -> Result<WinnerRecord, RepositoryError>;
}

pub(crate) fn check_recent_limit(limit: usize) -> Result<(), RepositoryError> {
    if limit == 0 {
        return Err(RepositoryError::InvalidRecentLimit);
    }
    Ok(())
}
