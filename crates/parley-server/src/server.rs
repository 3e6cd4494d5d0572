//! Accept loop.
//!
//! Owns the listener and the shared [`Registry`]. Every accepted socket
//! gets its own worker task; the sweeper runs alongside until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use parley_hub::{Registry, Router, Sweeper};
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::error::ServerError;

pub struct HubServer {
    config: ServerConfig,
    listener: TcpListener,
    registry: Arc<Registry>,
}

impl HubServer {
    /// Validate the config and bind the listening socket.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind,
                source,
            })?;
        info!(addr = %config.bind, "listening");

        Ok(Self {
            config,
            listener,
            registry: Arc::new(Registry::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry, for inspection while the server runs.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Serve until `shutdown` resolves.
    ///
    /// On shutdown the listener stops accepting and the sweeper is stopped;
    /// connection workers already running are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let hub_config = self.config.hub_config();
        let sweeper = Sweeper::spawn(Arc::clone(&self.registry), &hub_config)?;
        let router = Router::new(Arc::clone(&self.registry));
        let limits = self.config.limits();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!("accept failed: {e}");
                            continue;
                        }
                    };
                    debug!(%peer, "accepted connection");

                    let router = router.clone();
                    tokio::spawn(
                        async move {
                            if let Err(e) = handle_connection(stream, router, limits).await {
                                warn!("connection ended with error: {e}");
                            }
                        }
                        .instrument(info_span!("conn", %peer)),
                    );
                }
            }
        }

        sweeper.shutdown().await;
        let stats = self.registry.stats();
        info!(
            members = self.registry.len(),
            admitted = stats.admitted,
            evicted = stats.evicted,
            broadcasts = stats.broadcasts,
            logged = self.registry.log_len(),
            "server stopped"
        );
        Ok(())
    }
}
