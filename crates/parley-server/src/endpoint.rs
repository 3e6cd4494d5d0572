//! TCP-backed hub endpoint.
//!
//! The hub enqueues lines on a bounded channel; a writer task owns the
//! socket's write half and drains it. Enqueueing never waits on the
//! network. A peer that falls a whole queue behind, or whose socket
//! fails, reads as dead from then on and is left for the sweeper.

use std::net::SocketAddr;
use std::time::Duration;

use parley_hub::Endpoint;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long queued lines may take to reach the peer once the endpoint is
/// closed.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TcpEndpoint {
    peer: SocketAddr,
    outbound: mpsc::Sender<String>,
    /// Closed by the hub or the connection worker.
    closed: CancellationToken,
    /// Set when the outbound queue overflowed or a write failed.
    broken: CancellationToken,
}

impl TcpEndpoint {
    /// Create the endpoint and spawn its writer task. At most
    /// `outbound_buffer` lines wait for the peer at any time.
    pub fn spawn(peer: SocketAddr, writer: OwnedWriteHalf, outbound_buffer: usize) -> Self {
        let (outbound, rx) = mpsc::channel(outbound_buffer.max(1));
        let closed = CancellationToken::new();
        let broken = CancellationToken::new();
        tokio::spawn(writer_loop(peer, writer, rx, closed.clone(), broken.clone()));
        Self {
            peer,
            outbound,
            closed,
            broken,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Resolves once the endpoint has been closed, by either side.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

impl Endpoint for TcpEndpoint {
    fn is_alive(&self) -> bool {
        !self.closed.is_cancelled() && !self.broken.is_cancelled() && !self.outbound.is_closed()
    }

    fn send_line(&self, line: &str) {
        if self.closed.is_cancelled() || self.broken.is_cancelled() {
            return;
        }
        match self.outbound.try_send(line.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(peer = %self.peer, "outbound queue full, peer not reading");
                self.broken.cancel();
            }
            // Writer task is gone: the socket failed
            Err(TrySendError::Closed(_)) => self.broken.cancel(),
        }
    }

    fn origin(&self) -> String {
        self.peer.to_string()
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

async fn writer_loop(
    peer: SocketAddr,
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<String>,
    closed: CancellationToken,
    broken: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = broken.cancelled() => break,
            line = rx.recv() => {
                let Some(line) = line else { break };
                let written = tokio::select! {
                    result = write_line(&mut writer, &line) => result,
                    _ = broken.cancelled() => break,
                    _ = flush_deadline(&closed) => break,
                };
                if let Err(e) = written {
                    warn!(%peer, "write failed: {e}");
                    broken.cancel();
                    break;
                }
            }
            _ = closed.cancelled() => {
                // Flush what was queued before the close, then stop
                rx.close();
                let flush = async {
                    while let Some(line) = rx.recv().await {
                        write_line(&mut writer, &line).await?;
                    }
                    Ok::<_, std::io::Error>(())
                };
                if !matches!(tokio::time::timeout(FLUSH_TIMEOUT, flush).await, Ok(Ok(()))) {
                    debug!(%peer, "dropped unflushed lines on close");
                }
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
    debug!(%peer, "writer stopped");
}

/// Resolves `FLUSH_TIMEOUT` after `closed` fires.
async fn flush_deadline(closed: &CancellationToken) {
    closed.cancelled().await;
    tokio::time::sleep(FLUSH_TIMEOUT).await;
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}
