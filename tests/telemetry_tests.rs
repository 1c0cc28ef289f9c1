// Instrument catalog and OTLP resource attributes

mod common;

use hostpulse::config::AppConfig;
use hostpulse::telemetry::instruments::{self, CATALOG, InstrumentKind};
use hostpulse::telemetry::otlp::{resource_attributes, signal_endpoint};
use std::collections::HashSet;

#[test]
fn catalog_names_are_unique() {
    let names: HashSet<&str> = CATALOG.iter().map(|spec| spec.name).collect();
    assert_eq!(names.len(), CATALOG.len());
}

#[test]
fn network_instruments_are_byte_counters() {
    for name in [instruments::NETWORK_BYTES_SENT, instruments::NETWORK_BYTES_RECEIVED] {
        let spec = instruments::lookup(name).unwrap();
        assert_eq!(spec.kind, InstrumentKind::Counter);
        assert_eq!(spec.unit, instruments::UNIT_BYTES);
    }
    assert!(instruments::lookup("no_such_metric").is_none());
}

#[test]
fn resource_attributes_describe_service_and_host() {
    let mut config = AppConfig::load_from_str("").unwrap();
    config.service.container_name = "web-1".into();
    let attrs = resource_attributes(&config, &common::host());
    let find = |key: &str| {
        attrs
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.to_string())
    };

    assert_eq!(find("service.name").as_deref(), Some("unknown-service"));
    assert_eq!(find("service.version").as_deref(), Some("1.0.0"));
    assert_eq!(find("host.name").as_deref(), Some("test-host"));
    assert_eq!(find("os.type").as_deref(), Some("linux"));
    assert_eq!(find("os.description").as_deref(), Some("Test Linux"));
    assert_eq!(find("container.name").as_deref(), Some("web-1"));
    assert_eq!(find("deployment.environment").as_deref(), Some("production"));
}

#[test]
fn resource_attributes_skip_unknown_os_description() {
    let config = AppConfig::load_from_str("").unwrap();
    let mut host = common::host();
    host.os_description = None;
    let attrs = resource_attributes(&config, &host);
    assert!(attrs.iter().all(|kv| kv.key.as_str() != "os.description"));
}

#[test]
fn signal_endpoints_for_default_collector() {
    let config = AppConfig::load_from_str("").unwrap();
    assert_eq!(
        signal_endpoint(&config.exporter.endpoint, "metrics"),
        "http://otel-collector:4318/v1/metrics"
    );
}
