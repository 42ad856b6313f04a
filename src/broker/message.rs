//! Message definitions for the relay
//!
//! `Message` is both the stored record and the wire representation. On the
//! wire messages always travel in JSON arrays: a history reply is an array of
//! the requested range, a live update is an array holding one message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub date: String,
    pub topic: String,
    pub content: String,
}

/// Encode a batch of messages as the JSON array clients expect.
pub fn encode_batch(messages: &[Message]) -> serde_json::Result<String> {
    serde_json::to_string(messages)
}

/// A sanitized message that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub date: String,
    pub topic: String,
    pub content: String,
}

impl Draft {
    pub fn into_message(self, id: i64) -> Message {
        Message {
            id,
            name: self.name,
            email: self.email,
            date: self.date,
            topic: self.topic,
            content: self.content,
        }
    }
}
