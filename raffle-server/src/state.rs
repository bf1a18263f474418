//! Application state shared across all request handlers.

use raffle_core::auth::AdminSession;
use raffle_core::config::SharedConfig;
use raffle_core::coordinator::RaffleCoordinator;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RaffleCoordinator>,
    /// The single active admin token.
    pub session: Arc<AdminSession>,
    /// Runtime configuration (admin section can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(coordinator: RaffleCoordinator, session: AdminSession, config: SharedConfig) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            session: Arc::new(session),
            config,
        }
    }
}
