//! Parley TCP server.
//!
//! Accepts plain TCP connections, negotiates a client identifier over a
//! line-based protocol, then feeds each client's commands into the
//! [`parley_hub`] router. One tokio task per connection plus the hub's
//! sweeper task.
//!
//! ```rust,no_run
//! use parley_server::{HubServer, ServerConfig};
//!
//! # async fn example() -> Result<(), parley_server::ServerError> {
//! let server = HubServer::bind(ServerConfig::default()).await?;
//! println!("listening on {}", server.local_addr()?);
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod endpoint;
mod error;
pub mod protocol;
mod server;

pub use config::{ServerConfig, DEFAULT_MAX_LINE_LENGTH, DEFAULT_OUTBOUND_BUFFER, DEFAULT_PORT};
pub use connection::{handle_connection, ConnectionLimits};
pub use endpoint::TcpEndpoint;
pub use error::ServerError;
pub use server::HubServer;
