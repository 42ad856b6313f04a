//! WebSocket client for the relay.
//!
//! Used by the `client` subcommand and by the end-to-end tests. Every frame
//! the relay sends is a JSON array of messages, so the client only exposes
//! batches.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Message;
use crate::transport::HistoryRequest;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct ChatClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ChatClient {
    /// Connects to a relay WebSocket endpoint, e.g.
    /// `ws://127.0.0.1:14222/chatapp/websocket`.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _response) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Ask the relay for a history range.
    pub async fn request_history(&mut self, request: HistoryRequest) -> Result<(), ClientError> {
        let json = serde_json::to_string(&request)?;
        self.send_text(json).await
    }

    /// Sends a raw text frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        self.ws.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }

    /// Waits for the next batch of messages. `None` once the relay closes
    /// the connection.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Message>>, ClientError> {
        while let Some(frame) = self.ws.next().await {
            match frame? {
                WsMessage::Text(text) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                WsMessage::Binary(bytes) => return Ok(Some(serde_json::from_slice(&bytes)?)),
                WsMessage::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Send a Close frame to the relay.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws.close(None).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient").finish_non_exhaustive()
    }
}
