//! The `client` module provides a small WebSocket client that speaks the
//! relay's history/live protocol.

pub mod chat_client;
pub use chat_client::{ChatClient, ClientError};
