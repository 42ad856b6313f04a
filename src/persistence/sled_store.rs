//! Persistence layer backed by `sled`
//!
//! Messages are stored JSON-encoded in a single `messages` tree. Keys are the
//! big-endian message id, so a tree scan yields the log in append order.

use sled::{Db, Tree};
use tracing::debug;

use crate::broker::message::Message;
use crate::utils::{RelayError, Result};

const MESSAGES_TREE: &str = "messages";

#[derive(Clone)]
pub struct Persistence {
    db: Db,
    messages: Tree,
}

impl Persistence {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let messages = db.open_tree(MESSAGES_TREE)?;
        debug!("opened message log at {path} ({} entries)", messages.len());
        Ok(Self { db, messages })
    }

    /// Write one message. It is durable once a following [`flush`] returns.
    ///
    /// [`flush`]: Persistence::flush
    pub fn store_message(&self, msg: &Message) -> Result<()> {
        let serialized = serde_json::to_vec(msg)?;
        self.messages.insert(key(msg.id), serialized)?;
        Ok(())
    }

    /// Flush every write made so far to disk without blocking the runtime.
    pub async fn flush(&self) -> Result<()> {
        let bytes = self.db.flush_async().await?;
        debug!("flushed {bytes} bytes of message log");
        Ok(())
    }

    /// Load every stored message in id order.
    ///
    /// Fails if the ids on disk are not exactly `1..=n`.
    pub fn load_messages(&self) -> Result<Vec<Message>> {
        let mut out = Vec::with_capacity(self.messages.len());
        for entry in self.messages.iter() {
            let (_, value) = entry?;
            let msg: Message = serde_json::from_slice(&value)?;
            let expected = out.len() as i64 + 1;
            if msg.id != expected {
                return Err(RelayError::Corrupt(format!(
                    "expected id {expected}, found {}",
                    msg.id
                )));
            }
            out.push(msg);
        }
        Ok(out)
    }

    /// Number of messages on disk.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn key(id: i64) -> [u8; 8] {
    (id as u64).to_be_bytes()
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("db", &"sled::Db")
            .field("messages", &self.messages.len())
            .finish()
    }
}
