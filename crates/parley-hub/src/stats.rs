//! Hub activity counters.
//!
//! [`Counter`] is a relaxed atomic tally; [`HubStats`] groups the counters
//! the registry and router bump, and [`StatsSnapshot`] is the plain
//! serialisable view handed to callers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A monotonically increasing counter backed by [`AtomicU64`].
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Counter").field(&self.get()).finish()
    }
}

/// Live counters owned by a [`Registry`](crate::Registry).
#[derive(Debug, Default)]
pub struct HubStats {
    pub admitted: Counter,
    pub rejected: Counter,
    pub departed: Counter,
    pub evicted: Counter,
    pub elections: Counter,
    pub broadcasts: Counter,
    pub directs: Counter,
    pub unknown_recipients: Counter,
}

impl HubStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.admitted.get(),
            rejected: self.rejected.get(),
            departed: self.departed.get(),
            evicted: self.evicted.get(),
            elections: self.elections.get(),
            broadcasts: self.broadcasts.get(),
            directs: self.directs.get(),
            unknown_recipients: self.unknown_recipients.get(),
        }
    }
}

/// Point-in-time copy of [`HubStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub admitted: u64,
    pub rejected: u64,
    /// Members removed for any reason (voluntary or evicted).
    pub departed: u64,
    /// Subset of `departed` removed by a sweep.
    pub evicted: u64,
    pub elections: u64,
    pub broadcasts: u64,
    pub directs: u64,
    pub unknown_recipients: u64,
}
