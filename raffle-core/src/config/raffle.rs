//! Draw settings and initial pools.

use crate::coordinator::DEFAULT_RECENT_WINNERS;
use raffle_sdk::objects::{Participant, Prize};
use serde::{Deserialize, Serialize};

/// Where participants, prizes and awards are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory. State is lost on restart.
    #[default]
    Memory,
    /// PostgreSQL at `DATABASE_URL`.
    Postgres,
}

#[derive(Debug, Clone)]
pub struct RaffleConfig {
    /// Size of the recent winners window in state snapshots.
    pub recent_winners: usize,
    pub storage: StorageBackend,
    /// Initial participant pool. Loaded into memory, or inserted into the
    /// database when seeding.
    pub participants: Vec<Participant>,
    /// Initial prize pool.
    pub prizes: Vec<Prize>,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            recent_winners: DEFAULT_RECENT_WINNERS,
            storage: StorageBackend::default(),
            participants: Vec::new(),
            prizes: Vec::new(),
        }
    }
}
