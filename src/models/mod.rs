// Domain models: resource samples, network counters, host identity

mod host;
mod network;
mod system;

pub use host::HostInfo;
pub use network::{CounterDelta, NetworkCounters, NetworkDelta};
pub use system::{ResourceSample, clamp_percent, percent_of};
