//! Sessions: one registered client bound to its connection endpoint.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::ClientId;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A live connection as seen by the hub.
///
/// Implemented by the network layer. `send_line` must never block: the hub
/// calls it while holding the registry lock, so implementations enqueue the
/// line and return. A failed write shows up later as `is_alive() == false`.
pub trait Endpoint: Send + Sync {
    /// Whether the peer is still connected.
    fn is_alive(&self) -> bool;

    /// Queue one line of text for the peer (fire-and-forget).
    fn send_line(&self, line: &str);

    /// Human-readable origin of the connection, e.g. `"10.0.0.7:51234"`.
    fn origin(&self) -> String;

    /// Tear down the connection. Idempotent.
    fn close(&self);
}

/// A registered client.
///
/// Cloning is cheap and yields a handle to the same endpoint; the serial
/// number identifies this particular registration even if the identifier
/// is later reused by another connection.
#[derive(Clone)]
pub struct Session {
    id: ClientId,
    serial: u64,
    endpoint: Arc<dyn Endpoint>,
}

impl Session {
    pub fn new(id: ClientId, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            id,
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            endpoint,
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_alive(&self) -> bool {
        self.endpoint.is_alive()
    }

    /// Deliver one line to this client.
    pub fn deliver(&self, line: &str) {
        self.endpoint.send_line(line);
    }

    pub fn origin(&self) -> String {
        self.endpoint.origin()
    }

    pub(crate) fn close(&self) {
        self.endpoint.close();
    }

    /// True if both handles refer to the same registration.
    pub fn same_registration(&self, other: &Session) -> bool {
        self.serial == other.serial
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .field("alive", &self.is_alive())
            .finish()
    }
}
