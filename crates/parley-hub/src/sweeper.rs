//! Liveness sweeper: periodic eviction of dead members.
//!
//! A single tokio task ticks every `sweep_interval`, starting one interval
//! after spawn, and calls [`Registry::sweep`]. Ticks are handled in order
//! by that one task, so two sweeps never overlap; ticks missed while a
//! sweep runs long are skipped rather than bunched up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HubConfig;
use crate::error::HubError;
use crate::registry::Registry;

pub struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep task on the current tokio runtime.
    pub fn spawn(registry: Arc<Registry>, config: &HubConfig) -> Result<Self, HubError> {
        config.validate()?;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sweep_loop(
            registry,
            config.sweep_interval,
            cancel.clone(),
        ));
        Ok(Self { cancel, handle })
    }

    /// Stop ticking and wait for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn sweep_loop(registry: Arc<Registry>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = registry.sweep();
                if !evicted.is_empty() {
                    info!(count = evicted.len(), "sweep evicted dead members");
                }
                let active: Vec<String> = registry
                    .snapshot()
                    .keys()
                    .map(ToString::to_string)
                    .collect();
                if !active.is_empty() {
                    debug!(members = ?active, "active members");
                }
            }
        }
    }
    debug!("sweeper stopped");
}
