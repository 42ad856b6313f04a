//! Append-only message log.
//!
//! Position `i` always holds the message with id `i + 1`. The in-memory copy
//! serves every range read; the optional `Persistence` is written through on
//! append and only read at startup.

use tracing::{error, info};

use crate::broker::message::Message;
use crate::persistence::Persistence;
use crate::utils::{RelayError, Result};

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    persistence: Option<Persistence>,
}

impl MessageStore {
    /// An empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store backed by `persistence`, preloaded with everything on disk.
    pub fn with_persistence(persistence: Persistence) -> Result<Self> {
        let messages = persistence.load_messages()?;
        info!("restored {} messages from disk", messages.len());
        Ok(Self {
            messages,
            persistence: Some(persistence),
        })
    }

    /// Append `msg`, which must carry the id following the last stored one.
    ///
    /// With a durable backing the message is written through before it is
    /// added in memory. The caller flushes that write; see
    /// [`MessageStore::persistence`].
    pub fn append(&mut self, msg: Message) -> Result<()> {
        let expected = self.messages.len() as i64 + 1;
        if msg.id != expected {
            return Err(RelayError::IdMismatch {
                expected,
                got: msg.id,
            });
        }

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.store_message(&msg) {
                error!("failed to persist message {}: {e}", msg.id);
                return Err(e);
            }
        }

        self.messages.push(msg);
        Ok(())
    }

    /// Messages at positions `[first, last)`. `last` is clamped to the
    /// current length; an empty or inverted range yields an empty vec.
    pub fn range(&self, first: usize, last: usize) -> Vec<Message> {
        let last = last.min(self.messages.len());
        if first >= last {
            return Vec::new();
        }
        self.messages[first..last].to_vec()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The durable backing, if any.
    pub fn persistence(&self) -> Option<&Persistence> {
        self.persistence.as_ref()
    }
}
