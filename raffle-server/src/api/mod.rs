//! HTTP API.
//!
//! # Endpoints
//!
//! Public:
//! - `GET  /api/state`        – current raffle state
//! - `GET  /api/winners`      – recent awards, `?limit=N`
//! - `POST /api/auth/login`   – exchange the admin secret for a token
//! - `GET  /events`           – live updates as Server-Sent Events
//! - `GET  /ws`               – live updates over WebSocket
//!
//! Admin (`Authorization: Bearer {token}`):
//! - `POST /api/draw`         – run a draw
//! - `POST /api/awards`       – register an award manually

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod extractors;
pub mod public;

/// Routes mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(public::state::get_state))
        .route("/winners", get(public::winners::list_winners))
        .route("/auth/login", post(auth::login))
        .route("/draw", post(admin::draw::draw))
        .route("/awards", post(admin::register_award::register_award))
}

/// Live-update routes mounted at the root.
pub fn live_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(public::events::event_stream))
        .route("/ws", get(public::ws::event_socket))
}
