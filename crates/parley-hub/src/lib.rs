//! Parley hub core.
//!
//! Tracks registered chat members, elects a coordinator, evicts dead
//! connections on a fixed cadence and routes broadcast/direct messages.
//!
//! The network side lives in `parley-server`; this crate only sees
//! connections through the [`Endpoint`] trait.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use parley_hub::{ClientId, Registry, Router, Session};
//! # use parley_hub::Endpoint;
//! # struct Null;
//! # impl Endpoint for Null {
//! #     fn is_alive(&self) -> bool { true }
//! #     fn send_line(&self, _line: &str) {}
//! #     fn origin(&self) -> String { "127.0.0.1:9".into() }
//! #     fn close(&self) {}
//! # }
//!
//! let registry = Arc::new(Registry::new());
//! let alice = ClientId::new("alice").unwrap();
//! registry.admit(Session::new(alice.clone(), Arc::new(Null))).unwrap();
//! assert_eq!(registry.coordinator(), Some(alice.clone()));
//!
//! let router = Router::new(Arc::clone(&registry));
//! router.broadcast(&alice, "hello");
//! ```

pub mod config;
pub mod error;
mod log;
pub mod message;
pub mod registry;
pub mod router;
pub mod session;
pub mod stats;
pub mod sweeper;
pub mod types;

pub use config::HubConfig;
pub use error::HubError;
pub use message::{Message, MessageKind};
pub use registry::{notice, Registry, RosterEntry};
pub use router::{DirectOutcome, Router};
pub use session::{Endpoint, Session};
pub use stats::{Counter, HubStats, StatsSnapshot};
pub use sweeper::Sweeper;
pub use types::ClientId;
