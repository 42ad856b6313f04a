//! Per-connection session
//!
//! A session subscribes to the broker before reading anything from the
//! socket, then runs two duties until either one stops:
//! - replay: answer `HistoryRequest` frames from the store
//! - live: forward broker messages as single-element arrays
//!
//! Both duties share one task via `tokio::select!`. When one returns the other
//! is dropped with it, which also drops the subscription (unsubscribing it)
//! and the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::broker::message::encode_batch;
use crate::broker::{Broker, Subscription};
use crate::store::ChatLog;
use crate::transport::message::HistoryRequest;

/// Replies waiting for the writer. The reader blocks once this is full.
const REPLY_QUEUE: usize = 16;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    ClientClosed,
    ReadFailed(String),
    WriteFailed(String),
    WriteTimedOut,
    /// The broker dropped this session as a slow consumer.
    DroppedByBroker,
}

/// Frame encoding to answer a request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
}

#[derive(Debug, Clone)]
pub struct Session {
    log: Arc<RwLock<ChatLog>>,
    broker: Broker,
    write_timeout: Duration,
    peer: SocketAddr,
}

impl Session {
    pub fn new(
        log: Arc<RwLock<ChatLog>>,
        broker: Broker,
        write_timeout: Duration,
        peer: SocketAddr,
    ) -> Self {
        Self {
            log,
            broker,
            write_timeout,
            peer,
        }
    }

    /// Serve `socket` until either duty ends, then unsubscribe and close.
    pub async fn run(self, socket: WebSocket) -> SessionEnd {
        let subscription = self.broker.subscribe();
        let subscriber = subscription.id();
        info!("{} connected as subscriber {subscriber}", self.peer);

        let (sink, stream) = socket.split();
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_QUEUE);

        let end = tokio::select! {
            end = self.replay_duty(stream, reply_tx) => end,
            end = self.live_duty(sink, subscription, reply_rx) => end,
        };

        info!("{} disconnected: {end:?}", self.peer);
        end
    }

    async fn replay_duty(
        &self,
        mut stream: SplitStream<WebSocket>,
        replies: mpsc::Sender<WsMessage>,
    ) -> SessionEnd {
        loop {
            let (parsed, kind) = match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => (
                    serde_json::from_str::<HistoryRequest>(text.as_str()),
                    FrameKind::Text,
                ),
                Some(Ok(WsMessage::Binary(bytes))) => (
                    serde_json::from_slice::<HistoryRequest>(&bytes),
                    FrameKind::Binary,
                ),
                Some(Ok(WsMessage::Close(_))) | None => return SessionEnd::ClientClosed,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return SessionEnd::ReadFailed(e.to_string()),
            };

            let request = match parsed {
                Ok(request) => request,
                Err(e) => {
                    warn!("malformed history request from {}: {e}", self.peer);
                    continue;
                }
            };
            info!("request for messages received from {}", self.peer);

            let Some(reply) = self.replay(request).await else {
                continue;
            };
            let frame = match kind {
                FrameKind::Text => WsMessage::Text(reply.into()),
                FrameKind::Binary => WsMessage::Binary(reply.into_bytes().into()),
            };
            if replies.send(frame).await.is_err() {
                // writer is gone; select! is about to finish with its reason
                return SessionEnd::WriteFailed("writer closed".into());
            }
        }
    }

    async fn live_duty(
        &self,
        mut sink: SplitSink<WebSocket, WsMessage>,
        mut subscription: Subscription,
        mut replies: mpsc::Receiver<WsMessage>,
    ) -> SessionEnd {
        loop {
            let frame = tokio::select! {
                live = subscription.recv() => {
                    let Some(msg) = live else {
                        return SessionEnd::DroppedByBroker;
                    };
                    match encode_batch(std::slice::from_ref(&*msg)) {
                        Ok(json) => WsMessage::Text(json.into()),
                        Err(e) => {
                            warn!("failed to encode message {}: {e}", msg.id);
                            continue;
                        }
                    }
                }
                reply = replies.recv() => {
                    let Some(frame) = reply else {
                        return SessionEnd::ClientClosed;
                    };
                    frame
                }
            };

            match tokio::time::timeout(self.write_timeout, sink.send(frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return SessionEnd::WriteFailed(e.to_string()),
                Err(_) => return SessionEnd::WriteTimedOut,
            }
        }
    }

    /// Reads the range `request` asks for and encodes it, or `None` when the
    /// request resolves to nothing.
    pub async fn replay(&self, request: HistoryRequest) -> Option<String> {
        let messages = {
            let log = self.log.read().await;
            let range = request.resolve(log.len());
            debug!(
                "{} asked for {request:?} with {} stored, resolved to {range:?}",
                self.peer,
                log.len()
            );
            let range = range?;
            log.range(range.start, range.end)
        };

        match encode_batch(&messages) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("failed to encode history reply: {e}");
                None
            }
        }
    }
}
