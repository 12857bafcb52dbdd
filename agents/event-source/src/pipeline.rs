//! The `save` operation
//!
//! validate -> check tag fields -> resolve device -> derive effects ->
//! apply mutation -> start network fan-out -> publish audit event.
//!
//! Validation failures never reach a collaborator. A failed mutation stops
//! the pipeline before the audit event. A failed audit publish is logged
//! and does not change the caller's result.

use serde_json::Value;
use std::sync::Arc;

use crate::client::{
    ClientError, DeviceDirectory, DeviceManagerClient, EndpointPool, EventCenterClient,
    EventStore, RpcClient, DEVICE_MANAGER, EVENT_CENTER,
};
use crate::config::EventSourceConfig;
use crate::contracts::*;
use crate::engine::EventRuleEngine;
use crate::error::{Result, ValidationError};
use crate::fanout::NetworkFanOut;
use crate::telemetry::EventSourceMetrics;
use crate::validation::{validate, EnvelopeSchema};

/// Metric label for events whose tag could not be read
const UNKNOWN_TAG: &str = "unknown";

/// Envelope and tag-field checks shared by the service and the CLI
pub fn check_event(
    message: &Value,
    schema: &EnvelopeSchema,
    engine: &EventRuleEngine,
) -> std::result::Result<Event, ValidationError> {
    let event = validate(message, schema)?;
    engine.check_requirements(&event)?;
    Ok(event)
}

/// Event normalisation and dispatch service
pub struct EventSource {
    schema: EnvelopeSchema,
    engine: EventRuleEngine,
    directory: Arc<dyn DeviceDirectory>,
    store: Arc<dyn EventStore>,
    fan_out: NetworkFanOut,
    metrics: Arc<EventSourceMetrics>,
}

impl EventSource {
    /// Create a service over the given collaborators with the default
    /// schema and rules
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        store: Arc<dyn EventStore>,
        metrics: Arc<EventSourceMetrics>,
    ) -> Self {
        let fan_out = NetworkFanOut::new(
            Arc::clone(&directory),
            Arc::clone(&store),
            Arc::clone(&metrics),
        );

        Self {
            schema: EnvelopeSchema::save(),
            engine: EventRuleEngine::new(),
            directory,
            store,
            fan_out,
            metrics,
        }
    }

    /// Create a service talking to the configured HTTP pools
    pub fn from_config(
        config: &EventSourceConfig,
        metrics: Arc<EventSourceMetrics>,
    ) -> std::result::Result<Self, ClientError> {
        let timeout = config.request_timeout_ms;

        let device_manager = RpcClient::new(
            EndpointPool::new(DEVICE_MANAGER, config.services.device_manager.iter().cloned()),
            timeout,
        )?
        .with_metrics(Arc::clone(&metrics));

        let event_center = RpcClient::new(
            EndpointPool::new(EVENT_CENTER, config.services.event_center.iter().cloned()),
            timeout,
        )?
        .with_metrics(Arc::clone(&metrics));

        Ok(Self::new(
            Arc::new(DeviceManagerClient::new(device_manager)),
            Arc::new(EventCenterClient::new(event_center)),
            metrics,
        ))
    }

    /// Replace the envelope schema
    pub fn with_schema(mut self, schema: EnvelopeSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the rule engine
    pub fn with_engine(mut self, engine: EventRuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn schema(&self) -> &EnvelopeSchema {
        &self.schema
    }

    pub fn engine(&self) -> &EventRuleEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Arc<EventSourceMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Envelope and tag-field checks only; no remote calls
    pub fn check(&self, message: &Value) -> std::result::Result<Event, ValidationError> {
        check_event(message, &self.schema, &self.engine)
    }

    /// Handle one inbound event and build the caller-facing response
    pub async fn save(&self, message: &Value) -> ServiceResponse {
        match self.submit(message).await {
            Ok(()) => ServiceResponse::success(),
            Err(e) => ServiceResponse::from(&e),
        }
    }

    /// Handle one inbound event with logging and metrics, keeping the
    /// typed error.
    ///
    /// Metrics are labelled with the registered tag once the envelope
    /// passes validation, and with `unknown` otherwise.
    pub async fn submit(&self, message: &Value) -> Result<()> {
        let raw_tag = message
            .get("eventTag")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_TAG);
        let mut timer = self.metrics.start_timer(UNKNOWN_TAG);

        tracing::info!(event_tag = %raw_tag, payload = %message, "Received event");

        let (label, result) = match self.check(message) {
            Ok(event) => {
                timer.set_tag(event.tag.as_str());
                (event.tag.as_str(), self.dispatch(&event).await)
            }
            Err(e) => (UNKNOWN_TAG, Err(e.into())),
        };

        match &result {
            Ok(()) => self.metrics.record_event(label, "success"),
            Err(e) => {
                self.metrics.record_event(label, e.kind());
                if e.is_user_error() {
                    tracing::warn!(event_tag = %raw_tag, error = %e, "Rejected event");
                } else {
                    tracing::error!(
                        event_tag = %raw_tag,
                        ret_code = e.ret_code(),
                        error = %e,
                        "Event processing failed"
                    );
                }
            }
        }
        result
    }

    /// Run the pipeline, surfacing the first blocking error
    pub async fn process(&self, message: &Value) -> Result<()> {
        let event = self.check(message)?;
        self.dispatch(&event).await
    }

    /// Resolve, mutate, fan out and publish for an already checked event
    pub async fn dispatch(&self, event: &Event) -> Result<()> {
        let device = self.directory.get_device(&event.device_uuid).await?;
        tracing::debug!(
            device_uuid = %device.uuid,
            event_tag = %event.tag,
            device_type = %device.device_type.id,
            "Resolved device"
        );

        let derivation = self.engine.derive(event, &device);

        if let Some(mutation) = &derivation.mutation {
            self.directory.update_device(mutation).await?;
            tracing::debug!(
                device_uuid = %mutation.uuid,
                fields = mutation.fields.len(),
                "Applied device mutation"
            );
        }

        if !derivation.fan_out.is_empty() {
            tracing::info!(
                device_uuid = %device.uuid,
                items = derivation.fan_out.len(),
                "Starting network fan-out"
            );
            self.fan_out.spawn(event.tag, derivation.fan_out);
        }

        if let Some(audit) = &derivation.audit {
            self.publish(audit).await;
        }

        Ok(())
    }

    async fn publish(&self, audit: &AuditEvent) {
        if let Err(e) = self.store.save_event(audit).await {
            self.metrics.record_audit_failure();
            tracing::error!(
                device_uuid = %audit.device_uuid,
                event_tag = %audit.event_tag,
                error = %e,
                "Failed to publish audit event"
            );
        }
    }

    /// Network batches still running in the background
    pub fn pending_fanouts(&self) -> usize {
        self.fan_out.pending()
    }

    /// Wait for every network batch started so far
    pub async fn drain(&self) {
        self.fan_out.drain().await;
    }
}
