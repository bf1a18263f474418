//! Raffle Server
//!
//! Coordinates a live prize raffle and streams every draw to connected
//! screens in real time.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, Overrides, get_database_url};
use raffle_core::auth::AdminSession;
use raffle_core::config::{RaffleConfig, StorageBackend};
use raffle_core::coordinator::RaffleCoordinator;
use raffle_core::repository::{InMemoryRepository, PgRepository, RaffleRepository};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Raffle Server - live prize draw coordination
#[derive(Parser, Debug)]
#[command(name = "raffle-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "RAFFLE_CONFIG", default_value = "./raffle-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long, env = "RAFFLE_LISTEN")]
    listen: Option<SocketAddr>,

    /// Admin secret; takes precedence over the config file and is never
    /// written back to it
    #[arg(long, env = "RAFFLE_ADMIN_SECRET", hide_env_values = true)]
    admin_secret: Option<String>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Insert the configured participants and prizes into the database
    #[arg(long, default_value = "false")]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting raffle-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let overrides = Overrides {
        listen: args.listen,
        admin_secret: args.admin_secret.clone(),
    };
    let config_loader = Arc::new(ConfigLoader::new(&args.config, overrides));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let allowed_origins = loaded_config.server.allowed_origins.clone();
    tracing::info!("Configuration loaded from {:?}", args.config);

    let shared_config = loaded_config.into_shared();
    let raffle = shared_config.raffle.clone();

    let (repository, db_pool) = open_repository(&raffle, &args).await?;

    let coordinator = RaffleCoordinator::new(repository, raffle.recent_winners);
    let session = AdminSession::new()
        .map_err(|_| anyhow::anyhow!("failed to initialise the admin session key"))?;
    let state = AppState::new(coordinator, session, shared_config);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state, &allowed_origins);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    if let Some(db_pool) = db_pool {
        tracing::info!("Closing database connections...");
        db_pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Build the configured storage backend.
///
/// Returns the pool as well for the Postgres backend so it can be closed on
/// shutdown.
async fn open_repository(
    raffle: &RaffleConfig,
    args: &Args,
) -> anyhow::Result<(Arc<dyn RaffleRepository>, Option<PgPool>)> {
    match raffle.storage {
        StorageBackend::Memory => {
            tracing::info!(
                participants = raffle.participants.len(),
                prizes = raffle.prizes.len(),
                "Using in-memory storage"
            );
            if args.migrate || args.seed {
                tracing::warn!("--migrate and --seed only apply to postgres storage");
            }
            let repository: Arc<dyn RaffleRepository> = Arc::new(InMemoryRepository::new(
                raffle.participants.clone(),
                raffle.prizes.clone(),
            ));
            Ok((repository, None))
        }
        StorageBackend::Postgres => {
            let database_url = get_database_url().map_err(|e| {
                tracing::error!("DATABASE_URL environment variable not set");
                e
            })?;

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&database_url)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to database: {}", e);
                    e
                })?;
            tracing::info!("Database connection established");

            if args.migrate {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("../migrations")
                    .run(&db_pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to run migrations: {}", e);
                        e
                    })?;
                tracing::info!("Migrations completed successfully");
            }

            let repository = PgRepository::new(db_pool.clone());
            if args.seed {
                repository
                    .seed(raffle.participants.clone(), raffle.prizes.clone())
                    .await?;
            }
            let repository: Arc<dyn RaffleRepository> = Arc::new(repository);
            Ok((repository, Some(db_pool)))
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
