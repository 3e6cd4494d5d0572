//! Message router: turns send requests into deliveries.
//!
//! Builds a [`Message`] per request and hands the formatted line to the
//! registry's delivery primitives. Broadcasts are logged; direct messages
//! are not, and the sender of a direct message gets no echo.

use std::sync::Arc;

use tracing::debug;

use crate::message::Message;
use crate::registry::{notice, Registry};
use crate::types::ClientId;

/// Header line of a member listing.
pub const LIST_HEADER: &str = "Active Members:";

/// Outcome of [`Router::direct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectOutcome {
    /// Delivered to the recipient.
    Delivered,
    /// Recipient unknown; the sender was told.
    RecipientNotFound,
}

#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Send `content` from `sender` to every current member, the sender
    /// included. Returns how many members were reached.
    pub fn broadcast(&self, sender: &ClientId, content: &str) -> usize {
        let message = Message::broadcast(sender.clone(), content);
        let line = message.to_string();
        let reached = self.registry.log_and_fan_out(message.log_entry(), &line);

        self.registry.counters().broadcasts.inc();
        debug!(from = %sender, reached, "broadcast delivered");
        reached
    }

    /// Send `content` from `sender` to `recipient` only.
    ///
    /// An unknown (or blank) recipient produces a single notice back to the
    /// sender and nothing else.
    pub fn direct(&self, sender: &ClientId, recipient: &str, content: &str) -> DirectOutcome {
        let delivered = match ClientId::new(recipient) {
            Ok(to) => {
                let message = Message::direct(sender.clone(), to.clone(), content);
                self.registry.deliver_to(to.as_str(), &message.to_string())
            }
            Err(_) => false,
        };

        if delivered {
            self.registry.counters().directs.inc();
            debug!(from = %sender, to = recipient, "direct message delivered");
            DirectOutcome::Delivered
        } else {
            self.registry.counters().unknown_recipients.inc();
            self.registry
                .deliver_to(sender.as_str(), &notice::user_not_found(recipient.trim()));
            debug!(from = %sender, to = recipient, "direct message: recipient not found");
            DirectOutcome::RecipientNotFound
        }
    }

    /// Send the member listing to `requester` and return it.
    ///
    /// One line per member in admission order: `id (origin)`, with
    /// ` [Coordinator]` appended for the coordinator.
    pub fn list_members(&self, requester: &ClientId) -> Vec<String> {
        let mut lines = vec![LIST_HEADER.to_string()];
        lines.extend(self.registry.roster().into_iter().map(|entry| {
            if entry.is_coordinator {
                format!("{} ({}) [Coordinator]", entry.id, entry.origin)
            } else {
                format!("{} ({})", entry.id, entry.origin)
            }
        }));

        self.registry.deliver_all_to(requester.as_str(), &lines);
        lines
    }
}
