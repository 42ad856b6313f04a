//! The broker delivers each newly stored message to every connected session.

pub mod engine;
pub mod message;
pub mod subscription;

pub use engine::{Broker, SubscriberId};
pub use message::{Draft, Message};
pub use subscription::Subscription;

#[cfg(test)]
mod tests;
