//! Chat message records produced by the router.
//!
//! A `Message` is built once per send request, formatted for delivery
//! and (for broadcasts) logging, then dropped.

use std::fmt;

use chrono::{DateTime, Local};

use crate::types::ClientId;

/// Timestamp layout used in message lines and log entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a message is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Delivered to every registered member.
    Broadcast,
    /// Delivered to one named recipient.
    Direct,
}

/// Immutable chat message.
#[derive(Debug, Clone)]
pub struct Message {
    sender: ClientId,
    recipient: Option<ClientId>,
    kind: MessageKind,
    content: String,
    created_at: DateTime<Local>,
}

impl Message {
    /// Create a broadcast message stamped with the current time.
    pub fn broadcast(sender: ClientId, content: impl Into<String>) -> Self {
        Self {
            sender,
            recipient: None,
            kind: MessageKind::Broadcast,
            content: content.into(),
            created_at: Local::now(),
        }
    }

    /// Create a direct message stamped with the current time.
    pub fn direct(sender: ClientId, recipient: ClientId, content: impl Into<String>) -> Self {
        Self {
            sender,
            recipient: Some(recipient),
            kind: MessageKind::Direct,
            content: content.into(),
            created_at: Local::now(),
        }
    }

    /// Entry written to the message log: the formatted message prefixed
    /// with the time it was logged.
    pub fn log_entry(&self) -> String {
        format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self.created_at.format(TIMESTAMP_FORMAT);
        match (&self.kind, &self.recipient) {
            (MessageKind::Direct, Some(recipient)) => write!(
                f,
                "[{stamp}] Private from {} to {}: {}",
                self.sender, recipient, self.content
            ),
            _ => write!(f, "[{stamp}] {}: {}", self.sender, self.content),
        }
    }
}
