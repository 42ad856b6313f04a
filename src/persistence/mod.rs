//! The `persistence` module provides the optional durable backing of the
//! message store.
//!
//! Without it the chat history lives only in process memory. With it, every
//! appended message is written through to an embedded `sled` database and the
//! history is reloaded on the next start.

pub mod sled_store;

pub use sled_store::Persistence;
