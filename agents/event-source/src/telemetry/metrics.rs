//! Prometheus metrics for the Event Source Agent
//!
//! - `events_total` (counter) - Inbound events by tag and result
//! - `event_duration_seconds` (histogram) - Time spent in the save pipeline
//! - `remote_calls_total` (counter) - RPC calls by service, command and result
//! - `fanout_items_total` (counter) - Network batch items by outcome
//! - `audit_failures_total` (counter) - Audit events that could not be stored
//! - `fanouts_in_flight` (gauge) - Network batches still being dispatched
//!
//! # Example
//!
//! ```rust,no_run
//! use event_source::telemetry::EventSourceMetricsRegistry;
//!
//! let registry = EventSourceMetricsRegistry::new().unwrap();
//! let metrics = registry.metrics();
//!
//! metrics.record_event("EVENT_DEV_MEBOOST_POWERON_REPORT", "success");
//! metrics.record_remote_call("device_manager", "getDevice", "success");
//! ```

use prometheus::{Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "event_source";

/// Pipeline metrics
pub struct EventSourceMetrics {
    events_total: CounterVec,
    duration_seconds: HistogramVec,
    remote_calls_total: CounterVec,
    fanout_items_total: CounterVec,
    audit_failures_total: Counter,

    /// Network batches still being dispatched
    fanouts_in_flight: Gauge,
}

impl EventSourceMetrics {
    /// Create the metrics and register them with the provided registry
    pub fn new(registry: &Registry) -> Result<Self> {
        let events_total = CounterVec::new(
            Opts::new("events_total", "Inbound device events by tag and result")
                .namespace(NAMESPACE),
            &["tag", "result"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "event_duration_seconds",
                "Time spent handling one inbound event",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["tag"],
        )?;

        let remote_calls_total = CounterVec::new(
            Opts::new("remote_calls_total", "RPC calls to collaborator services")
                .namespace(NAMESPACE),
            &["service", "command", "result"],
        )?;

        let fanout_items_total = CounterVec::new(
            Opts::new(
                "fanout_items_total",
                "Network batch items by outcome (updated, unchanged, failed)",
            )
            .namespace(NAMESPACE),
            &["result"],
        )?;

        let audit_failures_total = Counter::with_opts(
            Opts::new(
                "audit_failures_total",
                "Audit events that could not be stored",
            )
            .namespace(NAMESPACE),
        )?;

        let fanouts_in_flight = Gauge::with_opts(
            Opts::new("fanouts_in_flight", "Network batches still being dispatched")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(remote_calls_total.clone()))?;
        registry.register(Box::new(fanout_items_total.clone()))?;
        registry.register(Box::new(audit_failures_total.clone()))?;
        registry.register(Box::new(fanouts_in_flight.clone()))?;

        Ok(Self {
            events_total,
            duration_seconds,
            remote_calls_total,
            fanout_items_total,
            audit_failures_total,
            fanouts_in_flight,
        })
    }

    /// Metrics bound to a private registry, for callers that never scrape
    pub fn unregistered() -> Result<Self> {
        Self::new(&Registry::new())
    }

    /// Record the result of one inbound event
    pub fn record_event(&self, tag: &str, result: &str) {
        self.events_total.with_label_values(&[tag, result]).inc();
    }

    pub fn observe_duration(&self, tag: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[tag])
            .observe(duration_secs);
    }

    /// Record one RPC call
    pub fn record_remote_call(&self, service: &str, command: &str, result: &str) {
        self.remote_calls_total
            .with_label_values(&[service, command, result])
            .inc();
    }

    /// Record the outcome of one network batch item
    pub fn record_fanout_item(&self, result: &str) {
        self.fanout_items_total.with_label_values(&[result]).inc();
    }

    pub fn record_audit_failure(&self) {
        self.audit_failures_total.inc();
    }

    pub fn inc_fanouts(&self) {
        self.fanouts_in_flight.inc();
    }

    pub fn dec_fanouts(&self) {
        self.fanouts_in_flight.dec();
    }

    pub fn fanouts_in_flight(&self) -> f64 {
        self.fanouts_in_flight.get()
    }

    /// Start timing an event (records the duration on drop)
    pub fn start_timer(&self, tag: &str) -> EventTimer<'_> {
        EventTimer {
            start: Instant::now(),
            tag: tag.to_string(),
            metrics: self,
        }
    }
}

/// RAII guard timing one event
pub struct EventTimer<'a> {
    start: Instant,
    tag: String,
    metrics: &'a EventSourceMetrics,
}

impl<'a> EventTimer<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Re-label the timer once the tag is known
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }
}

impl<'a> Drop for EventTimer<'a> {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.metrics.observe_duration(&self.tag, duration);
    }
}

/// Registry owning the pipeline metrics
pub struct EventSourceMetricsRegistry {
    registry: Arc<Registry>,
    metrics: Arc<EventSourceMetrics>,
}

impl EventSourceMetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create with an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let metrics = Arc::new(EventSourceMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<EventSourceMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.gather(), &mut buffer)
            .map_err(|e| TelemetryError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_encode() {
        let registry = EventSourceMetricsRegistry::new().unwrap();
        let metrics = registry.metrics();

        metrics.record_event("EVENT_DEV_MEBOOST_POWERON_REPORT", "success");
        metrics.record_remote_call("device_manager", "getDevice", "success");
        metrics.record_fanout_item("unchanged");
        metrics.record_audit_failure();
        metrics.observe_duration("EVENT_DEV_MEBOOST_POWERON_REPORT", 0.01);

        let text = registry.encode_text().unwrap();
        assert!(text.contains("event_source_events_total"));
        assert!(text.contains("event_source_remote_calls_total"));
        assert!(text.contains("event_source_fanout_items_total"));
        assert!(text.contains("event_source_audit_failures_total 1"));
        assert!(text.contains("event_source_event_duration_seconds"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = EventSourceMetricsRegistry::new().unwrap();
        let second = EventSourceMetricsRegistry::new().unwrap();

        first.metrics().record_audit_failure();

        assert!(second
            .encode_text()
            .unwrap()
            .contains("event_source_audit_failures_total 0"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        EventSourceMetrics::new(&registry).unwrap();
        assert!(EventSourceMetrics::new(&registry).is_err());
    }

    #[test]
    fn test_timer_records_on_drop() {
        let registry = EventSourceMetricsRegistry::new().unwrap();
        let metrics = registry.metrics();

        {
            let mut timer = metrics.start_timer("unknown");
            timer.set_tag("EVENT_DEV_MEBOOST_POWER_REPORT");
            assert!(timer.elapsed_secs() >= 0.0);
        }

        let text = registry.encode_text().unwrap();
        assert!(text.contains("tag=\"EVENT_DEV_MEBOOST_POWER_REPORT\""));
    }

    #[test]
    fn test_fanout_gauge() {
        let metrics = EventSourceMetrics::unregistered().unwrap();
        metrics.inc_fanouts();
        metrics.inc_fanouts();
        metrics.dec_fanouts();
    }
}
