use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use raffle_sdk::objects::RaffleEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;

use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /events` – live updates as Server-Sent Events.
///
/// The event name is the event type and the data is its JSON payload. The
/// subscription is released when the client disconnects and axum drops the
/// stream.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.coordinator.subscribe().await;
    tracing::debug!(subscriber = %subscription.id(), "SSE client connected");

    let stream = subscription.filter_map(|event| to_sse(&event).map(Ok));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

fn to_sse(event: &RaffleEvent) -> Option<Event> {
    match event.payload_json() {
        Ok(data) => Some(Event::default().event(event.name()).data(data)),
        Err(e) => {
            tracing::error!(error = %e, event = event.name(), "Failed to serialize SSE event");
            None
        }
    }
}
