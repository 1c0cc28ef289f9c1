// Shared test helpers: scripted counter source and recording sinks

#![allow(dead_code)]

use hostpulse::error::{MonitorError, Result};
use hostpulse::models::{HostInfo, NetworkCounters, ResourceSample};
use hostpulse::sysinfo_repo::CounterSource;
use hostpulse::telemetry::{AttributeValue, MetricSink, SpanHandle, TraceSink};
use hostpulse::worker::SchedulerConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn sample(sent: u64, recv: u64) -> ResourceSample {
    ResourceSample {
        cpu_percent: 12.5,
        memory_used_bytes: 512,
        memory_percent: 50.0,
        disk_percent: 40.0,
        process_count: 42,
        load_avg_1m: Some(0.75),
        network: NetworkCounters::new(sent, recv),
    }
}

pub fn host() -> HostInfo {
    HostInfo {
        host_name: "test-host".into(),
        os_type: "linux".into(),
        os_version: "6.1".into(),
        os_description: Some("Test Linux".into()),
        cpu_count: 8,
        total_memory_bytes: 1024,
    }
}

pub fn scheduler_config(sample_interval: Duration) -> SchedulerConfig {
    SchedulerConfig {
        sample_interval,
        trace_every_ticks: 5,
        stats_log_interval: Duration::from_secs(3600),
        service_name: "test-service".into(),
    }
}

pub enum Step {
    Sample(ResourceSample),
    Fail,
    Panic,
}

/// Replays `script`; once exhausted, repeats `fallback` forever.
pub struct FakeSource {
    script: Mutex<VecDeque<Step>>,
    fallback: ResourceSample,
    calls: Arc<Mutex<u64>>,
}

impl FakeSource {
    pub fn new(script: Vec<Step>, fallback: ResourceSample) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn repeating(fallback: ResourceSample) -> Self {
        Self::new(vec![], fallback)
    }

    pub fn call_counter(&self) -> Arc<Mutex<u64>> {
        self.calls.clone()
    }
}

impl CounterSource for FakeSource {
    async fn sample(&self) -> Result<ResourceSample> {
        *self.calls.lock().unwrap() += 1;
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Sample(s)) => Ok(s),
            Some(Step::Fail) => Err(MonitorError::source_unavailable(
                "sample",
                "permission denied",
            )),
            Some(Step::Panic) => panic!("sensor exploded"),
            None => Ok(self.fallback.clone()),
        }
    }

    async fn host_info(&self) -> Result<HostInfo> {
        Ok(host())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Gauge(String, f64, String),
    Counter(String, u64, String),
}

#[derive(Default)]
pub struct RecordingMetrics {
    pub emissions: Mutex<Vec<Emission>>,
}

impl RecordingMetrics {
    pub fn take(&self) -> Vec<Emission> {
        std::mem::take(&mut *self.emissions.lock().unwrap())
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.emissions.lock().unwrap().iter().rev().find_map(|e| match e {
            Emission::Gauge(n, v, _) if n == name => Some(*v),
            _ => None,
        })
    }

    pub fn counters(&self, name: &str) -> Vec<u64> {
        self.emissions
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Emission::Counter(n, v, _) if n == name => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl MetricSink for RecordingMetrics {
    fn set_gauge(&self, name: &str, value: f64, unit: &str) {
        self.emissions
            .lock()
            .unwrap()
            .push(Emission::Gauge(name.into(), value, unit.into()));
    }

    fn add_counter(&self, name: &str, delta: u64, unit: &str) {
        self.emissions
            .lock()
            .unwrap()
            .push(Emission::Counter(name.into(), delta, unit.into()));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedSpan {
    pub name: String,
    pub attributes: Vec<(String, AttributeValue)>,
    pub events: Vec<(String, Vec<(String, AttributeValue)>)>,
    pub ended: bool,
}

#[derive(Default)]
pub struct RecordingTraces {
    pub spans: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl RecordingTraces {
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.spans.lock().unwrap().clone()
    }
}

pub struct RecordingSpan {
    span: RecordedSpan,
    sink: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl SpanHandle for RecordingSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        self.span.attributes.push((key.into(), value));
    }

    fn add_event(&mut self, name: &'static str, attributes: Vec<(&'static str, AttributeValue)>) {
        self.span.events.push((
            name.into(),
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ));
    }
}

impl Drop for RecordingSpan {
    fn drop(&mut self) {
        let mut span = std::mem::take(&mut self.span);
        span.ended = true;
        self.sink.lock().unwrap().push(span);
    }
}

impl TraceSink for RecordingTraces {
    type Span = RecordingSpan;

    fn start_span(&self, name: &'static str) -> RecordingSpan {
        RecordingSpan {
            span: RecordedSpan {
                name: name.into(),
                ..Default::default()
            },
            sink: self.spans.clone(),
        }
    }
}

/// Formatted log output captured by a thread-local subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a subscriber for the current thread; logs are captured until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
