// Sampling loop: sample → delta → emit, on a fixed period, until shutdown.
// A failed or panicking tick is logged and skipped; it never stops the loop.

use crate::config::AppConfig;
use crate::delta::DeltaTracker;
use crate::error::Result;
use crate::models::{CounterDelta, HostInfo, NetworkCounters, ResourceSample, clamp_percent};
use crate::sysinfo_repo::CounterSource;
use crate::telemetry::instruments::{
    CPU_USAGE_PERCENT, DISK_USAGE_PERCENT, HEALTH_CHECK_EVENT, HEALTH_CHECK_SPAN, LOAD_AVERAGE_1M,
    MEMORY_USAGE_BYTES, MEMORY_USAGE_PERCENT, NETWORK_BYTES_RECEIVED, NETWORK_BYTES_SENT,
    PROCESS_COUNT, UNIT_BYTES, UNIT_NONE, UNIT_PERCENT,
};
use crate::telemetry::{MetricSink, SpanHandle, TraceSink};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub traces_emitted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed { trace_emitted: bool },
    Failed,
}

/// Loop timing.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub sample_interval: Duration,
    /// Health-check span on ticks 0, N, 2N, ...
    pub trace_every_ticks: u64,
    pub stats_log_interval: Duration,
    pub service_name: String,
}

impl SchedulerConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sample_interval: config.monitoring.sample_interval(),
            trace_every_ticks: config.monitoring.trace_every_ticks,
            stats_log_interval: config.monitoring.stats_log_interval(),
            service_name: config.service.name.clone(),
        }
    }
}

/// Collaborators the scheduler owns.
pub struct SchedulerDeps<S, M, T> {
    pub source: S,
    pub metrics: M,
    pub traces: T,
    pub host: HostInfo,
}

pub struct Scheduler<S, M, T> {
    source: S,
    metrics: M,
    traces: T,
    host: HostInfo,
    tracker: DeltaTracker,
    config: SchedulerConfig,
    state: LoopState,
    tick_index: u64,
    stats: LoopStats,
}

impl<S, M, T> Scheduler<S, M, T>
where
    S: CounterSource,
    M: MetricSink,
    T: TraceSink,
{
    pub fn new(
        deps: SchedulerDeps<S, M, T>,
        initial: NetworkCounters,
        mut config: SchedulerConfig,
    ) -> Self {
        config.trace_every_ticks = config.trace_every_ticks.max(1);
        let SchedulerDeps {
            source,
            metrics,
            traces,
            host,
        } = deps;
        Self {
            source,
            metrics,
            traces,
            host,
            tracker: DeltaTracker::new(initial),
            config,
            state: LoopState::Running,
            tick_index: 0,
            stats: LoopStats::default(),
        }
    }

    /// Takes one reading to seed the network baseline, then builds the scheduler.
    pub async fn bootstrap(deps: SchedulerDeps<S, M, T>, config: SchedulerConfig) -> Result<Self> {
        let initial = deps.source.sample().await?.network;
        tracing::debug!(
            bytes_sent = initial.bytes_sent,
            bytes_recv = initial.bytes_recv,
            "network baseline"
        );
        Ok(Self::new(deps, initial, config))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn previous_network(&self) -> NetworkCounters {
        self.tracker.previous()
    }

    /// Runs one iteration. Failures are counted and logged, never returned.
    pub async fn tick(&mut self) -> TickOutcome {
        let tick_index = self.tick_index;
        self.tick_index += 1;

        match AssertUnwindSafe(self.run_tick(tick_index)).catch_unwind().await {
            Ok(Ok(trace_emitted)) => {
                self.stats.ticks_completed += 1;
                if trace_emitted {
                    self.stats.traces_emitted += 1;
                }
                TickOutcome::Completed { trace_emitted }
            }
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    operation = "sample",
                    tick = tick_index,
                    "Error collecting metrics; skipping tick"
                );
                self.stats.ticks_failed += 1;
                TickOutcome::Failed
            }
            Err(panic) => {
                tracing::error!(
                    panic = panic_message(panic.as_ref()),
                    tick = tick_index,
                    "tick panicked; skipping tick"
                );
                self.stats.ticks_failed += 1;
                TickOutcome::Failed
            }
        }
    }

    async fn run_tick(&mut self, tick_index: u64) -> Result<bool> {
        // Nothing is emitted until the whole sample is in hand.
        let sample = self.source.sample().await?;
        self.emit_sample(&sample);

        let trace_due = tick_index % self.config.trace_every_ticks == 0;
        if trace_due {
            self.emit_health_check();
        }

        tracing::info!(
            tick = tick_index,
            "Metrics collected - CPU: {:.1}%, Memory: {:.1}%, Disk: {:.1}%",
            clamp_percent(sample.cpu_percent),
            clamp_percent(sample.memory_percent),
            clamp_percent(sample.disk_percent),
        );
        Ok(trace_due)
    }

    fn emit_sample(&mut self, sample: &ResourceSample) {
        let metrics = &self.metrics;
        metrics.set_gauge(
            CPU_USAGE_PERCENT,
            clamp_percent(sample.cpu_percent),
            UNIT_PERCENT,
        );
        metrics.set_gauge(
            MEMORY_USAGE_BYTES,
            sample.memory_used_bytes as f64,
            UNIT_BYTES,
        );
        metrics.set_gauge(
            MEMORY_USAGE_PERCENT,
            clamp_percent(sample.memory_percent),
            UNIT_PERCENT,
        );
        metrics.set_gauge(
            DISK_USAGE_PERCENT,
            clamp_percent(sample.disk_percent),
            UNIT_PERCENT,
        );

        let delta = self.tracker.advance(sample.network);
        emit_counter(metrics, NETWORK_BYTES_SENT, delta.bytes_sent);
        emit_counter(metrics, NETWORK_BYTES_RECEIVED, delta.bytes_recv);

        metrics.set_gauge(PROCESS_COUNT, sample.process_count as f64, UNIT_NONE);
        if let Some(load) = sample.load_avg_1m {
            metrics.set_gauge(LOAD_AVERAGE_1M, load, UNIT_NONE);
        }
    }

    fn emit_health_check(&self) {
        let mut span = self.traces.start_span(HEALTH_CHECK_SPAN);
        span.set_attribute("service.name", self.config.service_name.as_str().into());
        span.set_attribute("host.name", self.host.host_name.as_str().into());
        span.add_event(
            HEALTH_CHECK_EVENT,
            vec![
                ("cpu_count", self.host.cpu_count.into()),
                ("total_memory", self.host.total_memory_bytes.into()),
            ],
        );
    }

    fn log_stats(&self) {
        tracing::info!(
            ticks_completed = self.stats.ticks_completed,
            ticks_failed = self.stats.ticks_failed,
            traces_emitted = self.stats.traces_emitted,
            "sampling stats"
        );
    }

    /// Ticks every `sample_interval` until `shutdown_rx` fires (or its sender is dropped).
    /// Shutdown is observed between ticks; an in-progress tick always finishes.
    /// `Stopping` lasts only while the final stats are logged.
    pub async fn run(&mut self, mut shutdown_rx: oneshot::Receiver<()>) -> LoopStats {
        let mut tick = interval(self.config.sample_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stats_log_interval = self.config.stats_log_interval;
        let mut stats_log_tick = interval_at(Instant::now() + stats_log_interval, stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.state = LoopState::Running;
        tracing::info!("Starting system monitoring...");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => {
                    self.state = LoopState::Stopping;
                    tracing::info!(state = ?self.state, "Scheduler stopping");
                    break;
                }
                _ = tick.tick() => {
                    self.tick().await;
                }
                _ = stats_log_tick.tick() => {
                    self.log_stats();
                }
            }
        }

        self.log_stats();
        self.state = LoopState::Stopped;
        tracing::info!(state = ?self.state, "Monitoring stopped");
        self.stats
    }
}

fn emit_counter<M: MetricSink>(metrics: &M, name: &'static str, delta: CounterDelta) {
    match delta {
        CounterDelta::Increased(d) => metrics.add_counter(name, d, UNIT_BYTES),
        CounterDelta::Unchanged => {}
        CounterDelta::Decreased { previous, current } => {
            tracing::debug!(
                metric = name,
                previous,
                current,
                "counter decreased; skipping increment this tick"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Spawns the scheduler on the runtime; the handle yields it back once stopped.
pub fn spawn<S, M, T>(
    mut scheduler: Scheduler<S, M, T>,
    shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<Scheduler<S, M, T>>
where
    S: CounterSource,
    M: MetricSink + 'static,
    T: TraceSink + 'static,
{
    let span = tracing::info_span!(
        "scheduler",
        sample_interval_ms = scheduler.config.sample_interval.as_millis() as u64
    );
    tokio::spawn(
        async move {
            scheduler.run(shutdown_rx).await;
            scheduler
        }
        .instrument(span),
    )
}
