// Package identity, reported in the startup log and as the OTel instrumentation scope

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scope name for the meter and tracer.
pub const NAME: &str = env!("CARGO_PKG_NAME");
