// Instrument catalog: names, units and descriptions of everything the agent emits

pub const CPU_USAGE_PERCENT: &str = "system_cpu_usage_percent";
pub const MEMORY_USAGE_BYTES: &str = "system_memory_usage_bytes";
pub const MEMORY_USAGE_PERCENT: &str = "system_memory_usage_percent";
pub const DISK_USAGE_PERCENT: &str = "system_disk_usage_percent";
pub const NETWORK_BYTES_SENT: &str = "system_network_bytes_sent_total";
pub const NETWORK_BYTES_RECEIVED: &str = "system_network_bytes_received_total";
pub const PROCESS_COUNT: &str = "system_process_count";
pub const LOAD_AVERAGE_1M: &str = "system_load_average_1m";

pub const UNIT_PERCENT: &str = "%";
pub const UNIT_BYTES: &str = "bytes";
/// Dimensionless instruments carry no unit.
pub const UNIT_NONE: &str = "";

pub const HEALTH_CHECK_SPAN: &str = "system_health_check";
pub const HEALTH_CHECK_EVENT: &str = "Health check completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Gauge,
    Counter,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrumentSpec {
    pub name: &'static str,
    pub kind: InstrumentKind,
    pub unit: &'static str,
    pub description: &'static str,
}

pub const CATALOG: &[InstrumentSpec] = &[
    InstrumentSpec {
        name: CPU_USAGE_PERCENT,
        kind: InstrumentKind::Gauge,
        unit: UNIT_PERCENT,
        description: "Current CPU usage percentage",
    },
    InstrumentSpec {
        name: MEMORY_USAGE_BYTES,
        kind: InstrumentKind::Gauge,
        unit: UNIT_BYTES,
        description: "Current memory usage in bytes",
    },
    InstrumentSpec {
        name: MEMORY_USAGE_PERCENT,
        kind: InstrumentKind::Gauge,
        unit: UNIT_PERCENT,
        description: "Current memory usage percentage",
    },
    InstrumentSpec {
        name: DISK_USAGE_PERCENT,
        kind: InstrumentKind::Gauge,
        unit: UNIT_PERCENT,
        description: "Current disk usage percentage",
    },
    InstrumentSpec {
        name: NETWORK_BYTES_SENT,
        kind: InstrumentKind::Counter,
        unit: UNIT_BYTES,
        description: "Total bytes sent over network",
    },
    InstrumentSpec {
        name: NETWORK_BYTES_RECEIVED,
        kind: InstrumentKind::Counter,
        unit: UNIT_BYTES,
        description: "Total bytes received over network",
    },
    InstrumentSpec {
        name: PROCESS_COUNT,
        kind: InstrumentKind::Gauge,
        unit: UNIT_NONE,
        description: "Number of running processes",
    },
    InstrumentSpec {
        name: LOAD_AVERAGE_1M,
        kind: InstrumentKind::Gauge,
        unit: UNIT_NONE,
        description: "System load average over 1 minute",
    },
];

pub fn lookup(name: &str) -> Option<&'static InstrumentSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}
