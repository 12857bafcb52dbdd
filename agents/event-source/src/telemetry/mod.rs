//! Telemetry for the Event Source Agent
//!
//! - `metrics` - Prometheus metrics for the save pipeline, remote calls and
//!   network fan-out

pub mod metrics;

pub use metrics::{EventSourceMetrics, EventSourceMetricsRegistry, EventTimer};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
