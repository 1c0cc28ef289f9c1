//! Sinks the sampling loop reports to.
//!
//! The loop only sees [`MetricSink`] and [`TraceSink`]; batching, retry and
//! transport live behind them (see [`otlp`] for the OTLP/HTTP implementation).

pub mod instruments;
pub mod otlp;

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::I64(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::I64(v as i64)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::I64(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::F64(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Metric instruments addressed by a stable name.
pub trait MetricSink: Send + Sync {
    fn set_gauge(&self, name: &str, value: f64, unit: &str);

    /// `delta` is a non-negative increment.
    fn add_counter(&self, name: &str, delta: u64, unit: &str);
}

/// A started span; it ends when dropped.
pub trait SpanHandle {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue);

    fn add_event(&mut self, name: &'static str, attributes: Vec<(&'static str, AttributeValue)>);
}

pub trait TraceSink: Send + Sync {
    type Span: SpanHandle;

    fn start_span(&self, name: &'static str) -> Self::Span;
}

impl<M: MetricSink + ?Sized> MetricSink for Arc<M> {
    fn set_gauge(&self, name: &str, value: f64, unit: &str) {
        (**self).set_gauge(name, value, unit)
    }

    fn add_counter(&self, name: &str, delta: u64, unit: &str) {
        (**self).add_counter(name, delta, unit)
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Arc<T> {
    type Span = T::Span;

    fn start_span(&self, name: &'static str) -> Self::Span {
        (**self).start_span(name)
    }
}
