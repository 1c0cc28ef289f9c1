// Resource counters via sysinfo

mod linux;

use crate::config::MonitoringConfig;
use crate::error::{MonitorError, Result};
use crate::models::{HostInfo, NetworkCounters, ResourceSample, clamp_percent, percent_of};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};
use tracing::instrument;

/// Point-in-time readings of host resources.
pub trait CounterSource: Send + Sync + 'static {
    /// Fails with `SourceUnavailable` when the OS refuses a query.
    fn sample(&self) -> impl Future<Output = Result<ResourceSample>> + Send;

    fn host_info(&self) -> impl Future<Output = Result<HostInfo>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    cpu_sample_window: Duration,
    disk_path: PathBuf,
}

impl SysinfoRepo {
    pub fn new(cpu_sample_window: Duration, disk_path: impl Into<PathBuf>) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(disks)),
            networks: Arc::new(Mutex::new(networks)),
            cpu_sample_window: cpu_sample_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
            disk_path: disk_path.into(),
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.cpu_sample_window(), config.disk_path.clone())
    }

    /// Global CPU usage measured over the sample window; blocks for that long.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu_usage"))]
    pub async fn get_cpu_usage(&self) -> Result<f64> {
        let sys = self.sys.clone();
        let window = self.cpu_sample_window;
        blocking("get_cpu_usage", move || {
            let mut sys = lock(&sys, "get_cpu_usage")?;
            sys.refresh_cpu_all();
            std::thread::sleep(window);
            sys.refresh_cpu_all();
            Ok(clamp_percent(sys.global_cpu_usage() as f64))
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_memory_usage"))]
    pub async fn get_memory_usage(&self) -> Result<MemoryUsage> {
        let sys = self.sys.clone();
        blocking("get_memory_usage", move || {
            let mut sys = lock(&sys, "get_memory_usage")?;
            sys.refresh_memory();
            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            Ok(MemoryUsage {
                used_bytes: used,
                total_bytes: total,
                percent: percent_of(used, total),
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disk_usage"))]
    pub async fn get_disk_usage_percent(&self) -> Result<f64> {
        let disks = self.disks.clone();
        let target = self.disk_path.clone();
        blocking("get_disk_usage", move || {
            let mut disks = lock(&disks, "get_disk_usage")?;
            disks.refresh(true);
            let mounts: Vec<DiskSpace> = disks
                .list()
                .iter()
                .map(|d| DiskSpace {
                    mount_point: d.mount_point().to_path_buf(),
                    total: d.total_space(),
                    available: d.available_space(),
                })
                .collect();
            disk_usage_for_path(&mounts, &target).ok_or_else(|| {
                MonitorError::source_unavailable(
                    "get_disk_usage",
                    format!("no mounted filesystem holds {}", target.display()),
                )
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_process_count"))]
    pub async fn get_process_count(&self) -> Result<u32> {
        let sys = self.sys.clone();
        blocking("get_process_count", move || {
            let mut sys = lock(&sys, "get_process_count")?;
            sys.refresh_processes(ProcessesToUpdate::All, true);
            Ok(sys.processes().len().min(u32::MAX as usize) as u32)
        })
        .await
    }

    /// Cumulative bytes sent/received, summed over every interface.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_network_counters"))]
    pub async fn get_network_counters(&self) -> Result<NetworkCounters> {
        let networks = self.networks.clone();
        blocking("get_network_counters", move || {
            let mut networks = lock(&networks, "get_network_counters")?;
            networks.refresh(true);
            let (sent, recv) = networks.list().values().fold((0u64, 0u64), |(s, r), data| {
                (
                    s.saturating_add(data.total_transmitted()),
                    r.saturating_add(data.total_received()),
                )
            });
            Ok(NetworkCounters::new(sent, recv))
        })
        .await
    }

    /// 1-minute load average. `Unsupported` where the OS has no such concept.
    pub fn get_load_average_1m() -> Result<f64> {
        #[cfg(unix)]
        {
            Ok(System::load_average().one)
        }
        #[cfg(not(unix))]
        {
            Err(MonitorError::Unsupported("load average"))
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_host_info"))]
    pub async fn get_host_info(&self) -> Result<HostInfo> {
        let sys = self.sys.clone();
        blocking("get_host_info", move || {
            let mut sys = lock(&sys, "get_host_info")?;
            sys.refresh_memory();
            let os_version = System::os_version()
                .or_else(System::kernel_version)
                .unwrap_or_default();
            Ok(HostInfo {
                host_name: System::host_name().unwrap_or_else(|| "unknown".into()),
                os_type: std::env::consts::OS.into(),
                os_version,
                os_description: linux::read_os_pretty_name().or_else(System::long_os_version),
                cpu_count: sys.cpus().len() as u32,
                total_memory_bytes: sys.total_memory(),
            })
        })
        .await
    }
}

impl CounterSource for SysinfoRepo {
    async fn sample(&self) -> Result<ResourceSample> {
        let cpu_percent = self.get_cpu_usage().await?;
        let memory = self.get_memory_usage().await?;
        let disk_percent = self.get_disk_usage_percent().await?;
        let network = self.get_network_counters().await?;
        let process_count = self.get_process_count().await?;
        let load_avg_1m = match Self::get_load_average_1m() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, metric = "system_load_average_1m", "omitting metric");
                None
            }
        };
        Ok(ResourceSample {
            cpu_percent,
            memory_used_bytes: memory.used_bytes,
            memory_percent: memory.percent,
            disk_percent,
            process_count,
            load_avg_1m,
            network,
        })
    }

    async fn host_info(&self) -> Result<HostInfo> {
        self.get_host_info().await
    }
}

#[derive(Debug, Clone)]
struct DiskSpace {
    mount_point: PathBuf,
    total: u64,
    available: u64,
}

/// Usage percent of the filesystem whose mount point is the longest prefix of `target`.
/// sysinfo exposes only available space, so blocks reserved for root count as used.
fn disk_usage_for_path(disks: &[DiskSpace], target: &Path) -> Option<f64> {
    disks
        .iter()
        .filter(|d| target.starts_with(&d.mount_point))
        .max_by_key(|d| d.mount_point.components().count())
        .map(|d| percent_of(d.total.saturating_sub(d.available), d.total))
}

async fn blocking<T, F>(operation: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MonitorError::source_unavailable(operation, format!("sysinfo task join: {}", e)))?
}

fn lock<'a, T>(m: &'a Mutex<T>, operation: &'static str) -> Result<MutexGuard<'a, T>> {
    m.lock().map_err(|e| {
        MonitorError::source_unavailable(operation, format!("sysinfo lock poisoned: {}", e))
    })
}
