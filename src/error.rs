// Error taxonomy for sampling and export

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// An OS query failed; the current tick is skipped.
    #[error("{operation} unavailable: {reason}")]
    SourceUnavailable {
        operation: &'static str,
        reason: String,
    },

    /// The export pipeline could not be built or flushed.
    #[error("telemetry sink unavailable: {0}")]
    SinkUnavailable(String),

    /// The metric has no meaning on this platform; it is omitted.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl MonitorError {
    pub fn source_unavailable(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            operation,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
