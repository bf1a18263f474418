//! Signal handling for graceful shutdown and config reload.

use crate::config::{ConfigLoader, LoadedConfig};
use crate::state::AppState;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). If a handler cannot be
/// installed, falls back to Ctrl+C only.
pub async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Failed to install signal handlers, using Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// A reload replaces the admin secret and revokes the active admin token.
/// Pools and storage settings are only read at startup.
///
/// Returns a Notify that can be used to signal when shutdown is complete.
pub fn spawn_config_reload_handler(state: AppState, config_loader: Arc<ConfigLoader>) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler, config reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            apply_reload(&state, loaded_config).await;
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}

/// Install a reloaded admin secret and end the current admin session.
///
/// The server section is ignored; listen address and origins need a restart.
async fn apply_reload(state: &AppState, loaded_config: LoadedConfig) {
    state.config.update_admin(loaded_config.admin).await;
    state.session.revoke().await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use raffle_core::auth::AdminSession;
    use raffle_core::config::{AdminConfig, RaffleConfig, ServerConfig, SharedConfig};
    use raffle_core::coordinator::RaffleCoordinator;
    use raffle_core::repository::InMemoryRepository;
    use raffle_sdk::objects::{Participant, Prize};

    #[tokio::test]
    async fn test_reload_swaps_secret_and_revokes_token() {
        let config = SharedConfig::new(
            AdminConfig::from_plaintext("old-secret").unwrap(),
            RaffleConfig::default(),
        );
        let coordinator = RaffleCoordinator::with_seed(
            Arc::new(InMemoryRepository::new(Vec::<Participant>::new(), Vec::<Prize>::new())),
            5,
            1,
        );
        let state = AppState::new(coordinator, AdminSession::new().unwrap(), config);
        let token = state
            .session
            .login(&*state.config.admin().await, "old-secret")
            .await
            .unwrap();

        let reloaded = LoadedConfig {
            server: ServerConfig {
                listen: "127.0.0.1:4000".parse().unwrap(),
                allowed_origins: vec!["https://wheel.example".to_string()],
            },
            admin: AdminConfig::from_plaintext("new-secret").unwrap(),
            raffle: RaffleConfig::default(),
        };
        apply_reload(&state, reloaded).await;

        assert!(!state.session.validate(&token).await);
        let admin = state.config.admin().await;
        assert!(admin.verify_secret("new-secret"));
        assert!(!admin.verify_secret("old-secret"));
    }
}
