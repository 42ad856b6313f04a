//! The `store` module holds the chat history and hands out message ids.
//!
//! `ChatLog` pairs the [`IdAllocator`] with the [`MessageStore`] so that an
//! id is only ever issued by the same call that appends it. Callers keep the
//! log behind a single lock; holding that lock across allocate, append and
//! publish is what keeps store order, publish order and id order identical.

pub mod allocator;
pub mod message_store;

pub use allocator::IdAllocator;
pub use message_store::MessageStore;

use crate::broker::message::{Draft, Message};
use crate::persistence::Persistence;
use crate::utils::Result;

#[derive(Debug, Default)]
pub struct ChatLog {
    allocator: IdAllocator,
    store: MessageStore,
}

impl ChatLog {
    /// Wrap `store`; the next id issued follows the last stored message.
    pub fn new(store: MessageStore) -> Self {
        Self {
            allocator: IdAllocator::starting_at(store.len() as i64),
            store,
        }
    }

    /// Assign the next id to `draft` and append it.
    ///
    /// A failed append rewinds the allocator, so the id sequence never has a
    /// gap relative to the store.
    pub fn append(&mut self, draft: Draft) -> Result<Message> {
        let id = self.allocator.next();
        let msg = draft.into_message(id);
        if let Err(e) = self.store.append(msg.clone()) {
            self.allocator.rewind_to(self.store.len() as i64);
            return Err(e);
        }
        Ok(msg)
    }

    /// Messages at positions `[first, last)`, see [`MessageStore::range`].
    pub fn range(&self, first: usize, last: usize) -> Vec<Message> {
        self.store.range(first, last)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The id of the most recently appended message, `0` when empty.
    pub fn last_id(&self) -> i64 {
        self.allocator.current()
    }

    /// A handle for flushing appended messages to disk, when durable.
    pub fn durable(&self) -> Option<Persistence> {
        self.store.persistence().cloned()
    }
}

#[cfg(test)]
mod tests;
