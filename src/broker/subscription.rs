use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use crate::broker::engine::{Broker, SubscriberId};
use crate::broker::message::Message;

/// A live feed of published messages.
///
/// The feed ends (yields `None`) once the broker drops this subscriber.
/// Dropping the handle unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<Message>>,
    broker: Broker,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        receiver: mpsc::Receiver<Arc<Message>>,
        broker: Broker,
    ) -> Self {
        Self {
            id,
            receiver,
            broker,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next published message.
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = Arc<Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.unsubscribe(&self.id);
    }
}
