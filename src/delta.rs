// Reduces cumulative network counters to per-tick deltas.
// A counter that went backwards is skipped for that tick, then resynced.

use crate::models::{NetworkCounters, NetworkDelta};

#[derive(Debug, Clone)]
pub struct DeltaTracker {
    previous: NetworkCounters,
}

impl DeltaTracker {
    /// Starts from one initial reading taken at startup.
    pub fn new(initial: NetworkCounters) -> Self {
        Self { previous: initial }
    }

    pub fn previous(&self) -> NetworkCounters {
        self.previous
    }

    /// Computes the delta from the last reading and always advances to `current`.
    pub fn advance(&mut self, current: NetworkCounters) -> NetworkDelta {
        let delta = NetworkDelta::between(self.previous, current);
        self.previous = current;
        delta
    }
}
