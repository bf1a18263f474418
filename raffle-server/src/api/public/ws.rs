use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use raffle_core::events::Subscription;

use crate::state::AppState;

/// `GET /ws` – live updates over WebSocket.
///
/// Every event is a JSON text frame `{"type": ..., "data": ...}`. Frames
/// sent by the client are ignored.
pub async fn event_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let subscription = state.coordinator.subscribe().await;
        handle_socket(socket, subscription).await;
    })
}

/// Drives one WebSocket connection until either side goes away.
///
/// Returning drops `subscription`, which unregisters it from the bus.
async fn handle_socket(mut socket: WebSocket, mut subscription: Subscription) {
    let subscriber = subscription.id();
    tracing::debug!(%subscriber, "WS client connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    break;
                };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, %subscriber, "WS: failed to serialize event");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(%subscriber, "WS client disconnected");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, %subscriber, "WS: receive error");
                        return;
                    }
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}
