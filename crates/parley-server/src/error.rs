use std::net::SocketAddr;

use parley_hub::HubError;
use tokio_util::codec::LinesCodecError;

/// Errors returned by the Parley server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Hub(#[from] HubError),
}
