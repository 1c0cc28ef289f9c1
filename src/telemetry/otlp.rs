// OTLP/HTTP export pipeline.
// Build and shut down outside the tokio runtime: the exporters use a blocking HTTP client
// on the SDK's own worker threads.

use super::instruments;
use super::{AttributeValue, MetricSink, SpanHandle, TraceSink};
use crate::config::AppConfig;
use crate::error::{MonitorError, Result};
use crate::models::HostInfo;
use crate::version;
use opentelemetry::metrics::{Counter, Gauge, Meter, MeterProvider as _};
use opentelemetry::trace::{Tracer, TracerProvider as _};
use opentelemetry::{KeyValue, Value};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// `{base}/v1/{signal}`, tolerating a trailing slash on the base URL.
pub fn signal_endpoint(base: &str, signal: &str) -> String {
    format!("{}/v1/{}", base.trim_end_matches('/'), signal)
}

/// Resource attributes describing this service instance and host.
pub fn resource_attributes(config: &AppConfig, host: &HostInfo) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("service.name", config.service.name.clone()),
        KeyValue::new("service.version", config.service.version.clone()),
        KeyValue::new("host.name", host.host_name.clone()),
        KeyValue::new("os.type", host.os_type.clone()),
        KeyValue::new("os.version", host.os_version.clone()),
        KeyValue::new("container.name", config.service.container_name.clone()),
        KeyValue::new("deployment.environment", config.service.environment.clone()),
    ];
    if let Some(description) = &host.os_description {
        attrs.push(KeyValue::new("os.description", description.clone()));
    }
    attrs
}

pub struct OtlpPipeline {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl OtlpPipeline {
    pub fn init(config: &AppConfig, host: &HostInfo) -> Result<Self> {
        let endpoint = &config.exporter.endpoint;
        let timeout = Duration::from_millis(config.exporter.export_timeout_ms);
        let resource = Resource::builder()
            .with_service_name(config.service.name.clone())
            .with_attributes(resource_attributes(config, host))
            .build();

        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "traces"))
            .with_timeout(timeout)
            .build()
            .map_err(|e| MonitorError::SinkUnavailable(format!("span exporter: {}", e)))?;
        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .with_resource(resource.clone())
            .build();

        let metric_exporter = MetricExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "metrics"))
            .with_timeout(timeout)
            .build()
            .map_err(|e| MonitorError::SinkUnavailable(format!("metric exporter: {}", e)))?;
        let reader = PeriodicReader::builder(metric_exporter)
            .with_interval(Duration::from_millis(config.exporter.export_interval_ms))
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build();

        tracing::debug!(
            endpoint = %endpoint,
            export_interval_ms = config.exporter.export_interval_ms,
            "OTLP pipeline initialized"
        );
        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }

    pub fn metric_sink(&self) -> OtlpMetricSink {
        OtlpMetricSink::new(self.meter_provider.meter(version::NAME))
    }

    pub fn trace_sink(&self) -> impl TraceSink + use<> {
        OtlpTraceSink {
            tracer: self.tracer_provider.tracer(version::NAME),
        }
    }

    /// Flushes pending spans and metrics, then stops the exporters.
    pub fn shutdown(&self) -> Result<()> {
        let traces = self.tracer_provider.shutdown();
        let metrics = self.meter_provider.shutdown();
        traces.map_err(|e| MonitorError::SinkUnavailable(format!("tracer shutdown: {}", e)))?;
        metrics.map_err(|e| MonitorError::SinkUnavailable(format!("meter shutdown: {}", e)))?;
        Ok(())
    }
}

/// Creates instruments lazily, once per name.
pub struct OtlpMetricSink {
    meter: Meter,
    gauges: Mutex<HashMap<String, Gauge<f64>>>,
    counters: Mutex<HashMap<String, Counter<u64>>>,
}

impl OtlpMetricSink {
    pub fn new(meter: Meter) -> Self {
        Self {
            meter,
            gauges: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
        }
    }
}

fn description_of(name: &str) -> &'static str {
    instruments::lookup(name).map_or("", |spec| spec.description)
}

impl MetricSink for OtlpMetricSink {
    fn set_gauge(&self, name: &str, value: f64, unit: &str) {
        let mut gauges = self.gauges.lock().unwrap_or_else(PoisonError::into_inner);
        let gauge = gauges.entry(name.to_owned()).or_insert_with(|| {
            let builder = self
                .meter
                .f64_gauge(name.to_owned())
                .with_description(description_of(name));
            if unit.is_empty() {
                builder.build()
            } else {
                builder.with_unit(unit.to_owned()).build()
            }
        });
        gauge.record(value, &[]);
    }

    fn add_counter(&self, name: &str, delta: u64, unit: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(name.to_owned()).or_insert_with(|| {
            let builder = self
                .meter
                .u64_counter(name.to_owned())
                .with_description(description_of(name));
            if unit.is_empty() {
                builder.build()
            } else {
                builder.with_unit(unit.to_owned()).build()
            }
        });
        counter.add(delta, &[]);
    }
}

pub struct OtlpTraceSink<T> {
    tracer: T,
}

impl<T> TraceSink for OtlpTraceSink<T>
where
    T: Tracer + Send + Sync,
{
    type Span = OtlpSpan<T::Span>;

    fn start_span(&self, name: &'static str) -> Self::Span {
        OtlpSpan {
            inner: self.tracer.start(name),
        }
    }
}

pub struct OtlpSpan<S: opentelemetry::trace::Span> {
    inner: S,
}

fn to_otel_value(value: AttributeValue) -> Value {
    match value {
        AttributeValue::String(v) => Value::from(v),
        AttributeValue::I64(v) => Value::from(v),
        AttributeValue::F64(v) => Value::from(v),
        AttributeValue::Bool(v) => Value::from(v),
    }
}

impl<S: opentelemetry::trace::Span> SpanHandle for OtlpSpan<S> {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        self.inner.set_attribute(KeyValue::new(key, to_otel_value(value)));
    }

    fn add_event(&mut self, name: &'static str, attributes: Vec<(&'static str, AttributeValue)>) {
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| KeyValue::new(k, to_otel_value(v)))
            .collect();
        self.inner.add_event(name, attributes);
    }
}

impl<S: opentelemetry::trace::Span> Drop for OtlpSpan<S> {
    fn drop(&mut self) {
        self.inner.end();
    }
}
