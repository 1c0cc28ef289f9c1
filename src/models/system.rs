// Point-in-time resource sample

use super::NetworkCounters;

/// Immutable snapshot of host resource usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub process_count: u32,
    /// None where the platform has no load average (non-Unix).
    pub load_avg_1m: Option<f64>,
    pub network: NetworkCounters,
}

/// Clamp a percentage into [0, 100]; NaN becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// `part / total * 100`, or 0 when total is 0.
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        clamp_percent((part as f64 / total as f64) * 100.0)
    } else {
        0.0
    }
}
