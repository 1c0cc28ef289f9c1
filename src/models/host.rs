// Static host identity, read once at startup

#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub host_name: String,
    /// Lowercase OS family, e.g. "linux".
    pub os_type: String,
    pub os_version: String,
    /// Distribution name when the OS exposes one (e.g. PRETTY_NAME).
    pub os_description: Option<String>,
    pub cpu_count: u32,
    pub total_memory_bytes: u64,
}
