//! Per-connection worker.
//!
//! Drives one client through identifier negotiation, then translates its
//! command lines into router calls until it quits, disconnects, or is
//! evicted by the sweeper.

use std::sync::Arc;

use futures_lite::StreamExt;
use parley_hub::{ClientId, Endpoint, HubError, Registry, Router, Session};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info};

use crate::endpoint::TcpEndpoint;
use crate::error::ServerError;
use crate::protocol::{self, Command};

type Lines = FramedRead<OwnedReadHalf, LinesCodec>;

/// Per-connection limits, taken from [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Longest accepted request line, in bytes.
    pub max_line_length: usize,
    /// Lines that may wait for a slow peer before it is treated as dead.
    pub outbound_buffer: usize,
}

/// Serve one accepted connection to completion.
///
/// The member (if it got admitted) is removed on the way out, unless the
/// sweeper already evicted it.
pub async fn handle_connection(
    stream: TcpStream,
    router: Router,
    limits: ConnectionLimits,
) -> Result<(), ServerError> {
    let peer = stream.peer_addr()?;
    let (reader, writer) = stream.into_split();
    let endpoint = Arc::new(TcpEndpoint::spawn(peer, writer, limits.outbound_buffer));
    let mut lines = FramedRead::new(
        reader,
        LinesCodec::new_with_max_length(limits.max_line_length),
    );

    let result = serve(&mut lines, &endpoint, &router).await;
    endpoint.close();
    result
}

async fn serve(
    lines: &mut Lines,
    endpoint: &Arc<TcpEndpoint>,
    router: &Router,
) -> Result<(), ServerError> {
    let Some(session) = register(lines, endpoint, router.registry()).await? else {
        debug!(peer = %endpoint.peer(), "disconnected before registering");
        return Ok(());
    };

    let id = session.id().clone();
    info!(id = %id, peer = %endpoint.peer(), "client registered");

    let result = command_loop(lines, endpoint, router, &id).await;
    if router.registry().leave(&session) {
        info!(id = %id, "client disconnected");
    }
    result
}

/// Prompt until an identifier is admitted. `None` if the client went away.
///
/// The greeting goes out as part of the admission, ahead of any notice
/// about later membership changes.
async fn register(
    lines: &mut Lines,
    endpoint: &Arc<TcpEndpoint>,
    registry: &Registry,
) -> Result<Option<Session>, ServerError> {
    loop {
        endpoint.send_line(protocol::ID_PROMPT);
        let Some(raw) = next_line(lines, endpoint).await? else {
            return Ok(None);
        };
        let Ok(id) = ClientId::new(&raw) else {
            continue;
        };

        let session = Session::new(id.clone(), endpoint.clone());
        let welcome = |coordinator: &ClientId| Some(protocol::greeting(&id, coordinator));
        match registry.admit_with(session.clone(), welcome) {
            Ok(_) => return Ok(Some(session)),
            Err(HubError::DuplicateIdentifier { .. }) => {
                endpoint.send_line(protocol::DUPLICATE_ID);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn command_loop(
    lines: &mut Lines,
    endpoint: &TcpEndpoint,
    router: &Router,
    id: &ClientId,
) -> Result<(), ServerError> {
    while let Some(line) = next_line(lines, endpoint).await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Broadcast => {
                let Some(content) = next_line(lines, endpoint).await? else {
                    break;
                };
                router.broadcast(id, &content);
            }
            Command::Direct => {
                let Some(recipient) = next_line(lines, endpoint).await? else {
                    break;
                };
                let Some(content) = next_line(lines, endpoint).await? else {
                    break;
                };
                router.direct(id, &recipient, &content);
            }
            Command::List => {
                router.list_members(id);
            }
            Command::Unknown(word) => {
                debug!(id = %id, command = %word, "ignoring unknown command");
            }
        }
    }
    Ok(())
}

/// Next line from the client, or `None` on EOF or once the endpoint is
/// closed (e.g. evicted by a sweep).
async fn next_line(
    lines: &mut Lines,
    endpoint: &TcpEndpoint,
) -> Result<Option<String>, ServerError> {
    tokio::select! {
        _ = endpoint.closed() => Ok(None),
        item = lines.next() => match item {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        },
    }
}
