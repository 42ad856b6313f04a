//! Broker engine
//!
//! An in-memory fan-out of newly appended messages to every connected
//! session. Each subscriber owns a bounded queue; `publish` never waits on
//! one. A subscriber whose queue is full is dropped from the registry, which
//! closes its queue and ends the session reading from it.
//!
//! The broker only delivers what is published while a subscriber is
//! registered. History replay is served by the store, not by the broker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broker::message::Message;
use crate::broker::subscription::Subscription;

pub type SubscriberId = Uuid;

/// Cloneable handle to the shared subscriber registry.
#[derive(Debug, Clone)]
pub struct Broker {
    clients: Arc<Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<Message>>>>>,
    buffer: usize,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUFFER)
    }
}

impl Broker {
    /// Queue depth used by [`Broker::default`].
    pub const DEFAULT_BUFFER: usize = 64;

    /// Creates a broker whose subscribers can each hold `buffer` undelivered
    /// messages before being dropped.
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Arc<Message>>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new subscriber. It receives every message published from
    /// now until the returned handle is dropped or the broker drops it.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.clients().insert(id, tx);
        debug!("subscriber {id} registered");
        Subscription::new(id, rx, self.clone())
    }

    /// Removes a subscriber. Returns `false` if it was already gone, which
    /// happens after the broker dropped it as a slow consumer.
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        let removed = self.clients().remove(id).is_some();
        if removed {
            debug!("subscriber {id} removed");
        }
        removed
    }

    /// Delivers `msg` to every current subscriber and returns how many
    /// received it.
    ///
    /// Subscribers with a full queue are disconnected; subscribers whose
    /// receiving side is gone are cleaned up.
    pub fn publish(&self, msg: Message) -> usize {
        let msg = Arc::new(msg);
        let mut delivered = 0;

        self.clients()
            .retain(|id, sender| match sender.try_send(msg.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!("subscriber {id} is not keeping up, dropping it");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("subscriber {id} already closed");
                    false
                }
            });

        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.clients().len()
    }

    /// Whether `id` is still registered.
    pub fn is_subscribed(&self, id: &SubscriberId) -> bool {
        self.clients().contains_key(id)
    }
}
