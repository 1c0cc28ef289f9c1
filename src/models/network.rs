// Cumulative network counters and per-tick deltas

/// Cumulative byte counters summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

impl NetworkCounters {
    pub fn new(bytes_sent: u64, bytes_recv: u64) -> Self {
        Self {
            bytes_sent,
            bytes_recv,
        }
    }
}

/// Change of one cumulative counter between two readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDelta {
    Increased(u64),
    Unchanged,
    /// Counter went backwards (interface restart, wrap). Nothing is reported.
    Decreased { previous: u64, current: u64 },
}

impl CounterDelta {
    pub fn between(previous: u64, current: u64) -> Self {
        match current.checked_sub(previous) {
            Some(0) => CounterDelta::Unchanged,
            Some(d) => CounterDelta::Increased(d),
            None => CounterDelta::Decreased { previous, current },
        }
    }

    /// Strictly positive increment to add to a counter, if any.
    pub fn increment(&self) -> Option<u64> {
        match *self {
            CounterDelta::Increased(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_decrease(&self) -> bool {
        matches!(self, CounterDelta::Decreased { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkDelta {
    pub bytes_sent: CounterDelta,
    pub bytes_recv: CounterDelta,
}

impl NetworkDelta {
    pub fn between(previous: NetworkCounters, current: NetworkCounters) -> Self {
        Self {
            bytes_sent: CounterDelta::between(previous.bytes_sent, current.bytes_sent),
            bytes_recv: CounterDelta::between(previous.bytes_recv, current.bytes_recv),
        }
    }
}
