//! Write path: submission → sanitized draft → id + append → broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::broker::{Broker, Draft, Message};
use crate::ingress::escape::escape_html;
use crate::store::ChatLog;
use crate::utils::{RelayError, Result};

/// `asctime`-style layout, e.g. `Mon Jan  2 15:04:05 2006`.
pub const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

const FIELDS: [&str; 4] = ["name", "email", "topic", "content"];

/// Raw, untrusted form fields of a new message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub topic: String,
    pub content: String,
}

impl Submission {
    /// Builds a submission from named form fields. Every field must be
    /// present; unknown fields are ignored.
    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self> {
        let mut take = |name: &str| {
            fields
                .remove(name)
                .ok_or_else(|| RelayError::InvalidSubmission(format!("missing field `{name}`")))
        };

        Ok(Self {
            name: take(FIELDS[0])?,
            email: take(FIELDS[1])?,
            topic: take(FIELDS[2])?,
            content: take(FIELDS[3])?,
        })
    }

    pub fn is_known_field(name: &str) -> bool {
        FIELDS.contains(&name)
    }

    /// Escapes every field and stamps the draft with `now`.
    pub fn sanitize(&self, now: DateTime<Local>) -> Draft {
        Draft {
            name: escape_html(&self.name),
            email: escape_html(&self.email),
            date: escape_html(&now.format(DATE_FORMAT).to_string()),
            topic: escape_html(&self.topic),
            content: escape_html(&self.content),
        }
    }
}

/// Accepts new messages, stores them and broadcasts them.
#[derive(Debug, Clone)]
pub struct Ingress {
    log: Arc<RwLock<ChatLog>>,
    broker: Broker,
}

impl Ingress {
    /// An ingress appending to `log` and publishing on `broker`.
    pub fn new(log: Arc<RwLock<ChatLog>>, broker: Broker) -> Self {
        Self { log, broker }
    }

    /// Stores and publishes `submission`, returning the stored message.
    ///
    /// The log's write lock is held from id allocation through publish, so
    /// concurrent submissions are appended and broadcast in id order. The
    /// disk flush runs after the lock is released; the call returns only once
    /// the message is durable.
    pub async fn submit(&self, submission: &Submission) -> Result<Message> {
        let draft = submission.sanitize(Local::now());

        let mut log = self.log.write().await;
        let msg = log.append(draft)?;
        let delivered = self.broker.publish(msg.clone());
        let durable = log.durable();
        drop(log);

        if let Some(persistence) = durable {
            if let Err(e) = persistence.flush().await {
                error!("message {} stored but not flushed: {e}", msg.id);
                return Err(e);
            }
        }

        info!(
            "stored message {} from {} ({delivered} live subscribers)",
            msg.id, msg.name
        );
        Ok(msg)
    }
}
