//! Runtime configuration types.
//!
//! These are the validated values the server runs with. Loading and
//! parsing the config file is handled by the server crate.

mod admin;
mod raffle;
mod server;

pub use admin::{AdminConfig, hash_secret};
pub use raffle::{RaffleConfig, StorageBackend};
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Configuration the running server reads after startup.
///
/// Listen address and CORS origins are consumed when the router is built, so
/// they are not kept here.
#[derive(Clone)]
pub struct SharedConfig {
    /// Admin secret. Replaced on reload.
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Draw settings and seed pools. Only read at startup.
    pub raffle: Arc<RaffleConfig>,
}

impl SharedConfig {
    pub fn new(admin: AdminConfig, raffle: RaffleConfig) -> Self {
        Self {
            admin: Arc::new(RwLock::new(admin)),
            raffle: Arc::new(raffle),
        }
    }

    pub async fn admin(&self) -> RwLockReadGuard<'_, AdminConfig> {
        self.admin.read().await
    }

    /// Replace the admin configuration.
    pub async fn update_admin(&self, config: AdminConfig) {
        let mut admin = self.admin.write().await;
        *admin = config;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_admin_is_seen_by_clones() {
        let config = SharedConfig::new(
            AdminConfig::from_plaintext("before").unwrap(),
            RaffleConfig::default(),
        );
        let handle = config.clone();

        config
            .update_admin(AdminConfig::from_plaintext("after").unwrap())
            .await;

        let admin = handle.admin().await;
        assert!(admin.verify_secret("after"));
        assert!(!admin.verify_secret("before"));
    }
}
