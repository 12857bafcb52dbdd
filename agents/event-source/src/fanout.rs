//! Network batch fan-out
//!
//! A controller network update carries many `(uuid, online)` items. Each
//! item is resolved and dispatched on its own: look the device up, skip it
//! if its network status already matches, otherwise update it and publish
//! an audit event. Item failures are logged and counted, never reported to
//! the caller of the parent event.

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::client::{DeviceDirectory, EventStore};
use crate::contracts::*;
use crate::error::Result;
use crate::telemetry::EventSourceMetrics;

/// What happened to one network item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Status changed and was written
    Updated,
    /// Device already had the target status; no remote write
    Unchanged,
    /// Lookup or update failed
    Failed,
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::Updated => "updated",
            ItemOutcome::Unchanged => "unchanged",
            ItemOutcome::Failed => "failed",
        }
    }
}

/// Tally of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl FanOutReport {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.updated + self.unchanged + self.failed
    }
}

impl FromIterator<ItemOutcome> for FanOutReport {
    fn from_iter<I: IntoIterator<Item = ItemOutcome>>(iter: I) -> Self {
        let mut report = FanOutReport::default();
        for outcome in iter {
            report.record(outcome);
        }
        report
    }
}

/// Audit description for a network change
pub fn network_description(status: NetworkStatus) -> String {
    format!("device network {}", status)
}

/// Holds one slot of the in-flight gauge until dropped, even when the
/// batch task panics or is aborted
struct InFlight(Arc<EventSourceMetrics>);

impl InFlight {
    fn enter(metrics: Arc<EventSourceMetrics>) -> Self {
        metrics.inc_fanouts();
        Self(metrics)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec_fanouts();
    }
}

/// Runs network batches on tracked background tasks
#[derive(Clone)]
pub struct NetworkFanOut {
    directory: Arc<dyn DeviceDirectory>,
    store: Arc<dyn EventStore>,
    metrics: Arc<EventSourceMetrics>,
    tracker: TaskTracker,
}

impl NetworkFanOut {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        store: Arc<dyn EventStore>,
        metrics: Arc<EventSourceMetrics>,
    ) -> Self {
        Self {
            directory,
            store,
            metrics,
            tracker: TaskTracker::new(),
        }
    }

    /// Start a batch in the background and return immediately
    pub fn spawn(&self, tag: EventTag, items: Vec<NetworkItem>) -> JoinHandle<FanOutReport> {
        let this = self.clone();
        let in_flight = InFlight::enter(Arc::clone(&self.metrics));
        self.tracker.spawn(async move {
            let _in_flight = in_flight;
            this.run(tag, items).await
        })
    }

    /// Dispatch every item of a batch concurrently and tally the outcomes
    pub async fn run(&self, tag: EventTag, items: Vec<NetworkItem>) -> FanOutReport {
        let outcomes = join_all(items.iter().map(|item| self.dispatch_item(tag, item))).await;
        let report: FanOutReport = outcomes.into_iter().collect();

        tracing::info!(
            event_tag = %tag,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            "Network fan-out finished"
        );

        report
    }

    /// Resolve one item and apply its status if it changed
    pub async fn dispatch_item(&self, tag: EventTag, item: &NetworkItem) -> ItemOutcome {
        let outcome = match self.apply(tag, item).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    device_uuid = %item.uuid,
                    event_tag = %tag,
                    error = %e,
                    "Network item dispatch failed"
                );
                ItemOutcome::Failed
            }
        };

        self.metrics.record_fanout_item(outcome.as_str());
        outcome
    }

    async fn apply(&self, tag: EventTag, item: &NetworkItem) -> Result<ItemOutcome> {
        let device = self.directory.get_device(&item.uuid).await?;
        let target = item.target_status();

        if device.status.network == Some(target) {
            tracing::debug!(
                device_uuid = %device.uuid,
                network = %target,
                "Network status unchanged"
            );
            return Ok(ItemOutcome::Unchanged);
        }

        let mutation = DeviceMutation::new(device.uuid.clone()).set("status.network", target.as_str());
        self.directory.update_device(&mutation).await?;

        let audit = AuditEvent::for_device(&device, tag, network_description(target));
        if let Err(e) = self.store.save_event(&audit).await {
            self.metrics.record_audit_failure();
            tracing::error!(
                device_uuid = %device.uuid,
                event_tag = %tag,
                error = %e,
                "Failed to publish network audit event"
            );
        }

        Ok(ItemOutcome::Updated)
    }

    /// Number of batches still running
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every batch started so far
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
