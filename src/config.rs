use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Used when CONFIG_FILE is unset and this file exists in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub exporter: ExporterConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    /// Reported as `deployment.environment`.
    pub environment: String,
    /// Reported as `container.name`; normally taken from HOSTNAME.
    pub container_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "unknown-service".into(),
            version: "1.0.0".into(),
            environment: "production".into(),
            container_name: "unknown".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// OTLP/HTTP base URL; `/v1/traces` and `/v1/metrics` are appended.
    pub endpoint: String,
    pub export_interval_ms: u64,
    pub export_timeout_ms: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://otel-collector:4318".into(),
            export_interval_ms: 10_000,
            export_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub sample_interval_ms: u64,
    /// Emit a health-check span on every Nth tick.
    pub trace_every_ticks: u64,
    /// Blocking window over which CPU usage is measured.
    pub cpu_sample_window_ms: u64,
    /// Disk usage is reported for the filesystem holding this path.
    pub disk_path: String,
    /// How often to log loop stats at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 10_000,
            trace_every_ticks: 5,
            cpu_sample_window_ms: 1_000,
            disk_path: "/".into(),
            stats_log_interval_secs: 300,
        }
    }
}

impl MonitoringConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_window_ms)
    }

    pub fn stats_log_interval(&self) -> Duration {
        Duration::from_secs(self.stats_log_interval_secs)
    }
}

impl AppConfig {
    /// Loads the config file (CONFIG_FILE, else ./config.toml if present, else defaults),
    /// applies environment overrides and validates.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::parse(&read_config_file(&path)?)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::parse(&read_config_file(DEFAULT_CONFIG_PATH)?)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No env overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config = Self::parse(s)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Standard OTEL_* variables win over the file. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("OTEL_SERVICE_NAME") {
            self.service.name = v;
        }
        if let Some(v) = get("OTEL_SERVICE_VERSION") {
            self.service.version = v;
        }
        if let Some(v) = get("DEPLOYMENT_ENVIRONMENT") {
            self.service.environment = v;
        }
        if let Some(v) = get("HOSTNAME") {
            self.service.container_name = v;
        }
        if let Some(v) = get("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.exporter.endpoint = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.service.name.trim().is_empty(),
            "service.name must be non-empty"
        );
        anyhow::ensure!(
            self.exporter.endpoint.starts_with("http://")
                || self.exporter.endpoint.starts_with("https://"),
            "exporter.endpoint must be an http(s) URL, got {:?}",
            self.exporter.endpoint
        );
        anyhow::ensure!(
            self.exporter.export_interval_ms > 0,
            "exporter.export_interval_ms must be > 0, got {}",
            self.exporter.export_interval_ms
        );
        anyhow::ensure!(
            self.exporter.export_timeout_ms > 0,
            "exporter.export_timeout_ms must be > 0, got {}",
            self.exporter.export_timeout_ms
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.trace_every_ticks > 0,
            "monitoring.trace_every_ticks must be > 0, got {}",
            self.monitoring.trace_every_ticks
        );
        anyhow::ensure!(
            self.monitoring.cpu_sample_window_ms > 0,
            "monitoring.cpu_sample_window_ms must be > 0, got {}",
            self.monitoring.cpu_sample_window_ms
        );
        // The CPU window blocks inside every tick.
        anyhow::ensure!(
            self.monitoring.cpu_sample_window_ms < self.monitoring.sample_interval_ms,
            "monitoring.cpu_sample_window_ms ({}) must be shorter than monitoring.sample_interval_ms ({})",
            self.monitoring.cpu_sample_window_ms,
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            !self.monitoring.disk_path.is_empty(),
            "monitoring.disk_path must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}

fn read_config_file(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path))
}
