//! Live-update WebSocket client.

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::ClientError;
use crate::objects::RaffleEvent;

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An open `GET /ws` connection yielding [`RaffleEvent`]s.
pub struct LiveStream {
    socket: Socket,
}

impl LiveStream {
    pub(crate) async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _response) = connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` once the server closes the stream. Non-text
    /// frames are skipped.
    pub async fn next_event(&mut self) -> Result<Option<RaffleEvent>, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Send a close frame and wait for the server to acknowledge it.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}
