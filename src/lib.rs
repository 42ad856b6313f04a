//! # chatrelay
//!
//! `chatrelay` is a minimal real-time chat relay. Clients POST messages over
//! HTTP and follow the conversation over a WebSocket, on which they can also
//! ask for any range of the stored history.
//!
//! ## Core Modules
//!
//! - `store`: the append-only message log and its id allocator.
//! - `broker`: fan-out of new messages to every connected session.
//! - `ingress`: validation, escaping and storage of submitted messages.
//! - `transport`: the HTTP/WebSocket server and per-connection sessions.
//! - `persistence`: optional `sled` backing for the message log.
//! - `client`: a WebSocket client for the relay protocol.
//! - `config`: server configuration.
//! - `utils`: error type and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod ingress;
pub mod persistence;
pub mod store;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
