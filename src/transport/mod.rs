//! The `transport` module handles network communication with clients: the
//! HTTP submission endpoint, the WebSocket endpoint and the per-connection
//! session that serves it.

pub mod message;
pub mod server;
pub mod session;

pub use message::HistoryRequest;
pub use server::{AppState, SEND_PATH, WEBSOCKET_PATH, router, serve, start_server};
pub use session::{Session, SessionEnd};
