//! Event rule engine
//!
//! Tag-keyed table of pure rules. Each rule maps `(eventData, device)` to
//! the device fields to update, the audit description (if any) and the
//! network items to fan out.

mod rules;
mod thresholds;

pub use rules::*;
pub use thresholds::*;

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::contracts::*;
use crate::error::ValidationError;

/// A field a rule needs in `eventData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRequirement {
    /// Present and a JSON number
    Number(&'static str),
    /// Present and a JSON string
    String(&'static str),
    /// Present and not null
    Present(&'static str),
}

impl FieldRequirement {
    pub fn field(&self) -> &'static str {
        match self {
            FieldRequirement::Number(f)
            | FieldRequirement::String(f)
            | FieldRequirement::Present(f) => f,
        }
    }

    fn check(&self, event: &Event) -> Result<(), ValidationError> {
        let path = format!("eventData.{}", self.field());
        match (self, event.field(self.field())) {
            (_, None) | (_, Some(Value::Null)) => Err(ValidationError::missing(path)),
            (FieldRequirement::Number(_), Some(v)) if !v.is_number() => {
                Err(ValidationError::invalid_type(path, "a number"))
            }
            (FieldRequirement::String(_), Some(v)) if !v.is_string() => {
                Err(ValidationError::invalid_type(path, "a string"))
            }
            _ => Ok(()),
        }
    }
}

/// What a single rule decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    /// Dotted-path fields to write on the resolved device
    pub fields: BTreeMap<String, Value>,
    /// Audit description; `None` means no audit event at all
    pub description: Option<String>,
    /// Network items to resolve and update independently
    pub fan_out: Vec<NetworkItem>,
}

impl RuleOutcome {
    /// Outcome that records an audit event with the given description
    pub fn audit(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Outcome with neither mutation nor audit event
    pub fn silent() -> Self {
        Self::default()
    }

    /// Outcome that only fans out network items
    pub fn fan_out(items: Vec<NetworkItem>) -> Self {
        Self {
            fan_out: items,
            ..Default::default()
        }
    }

    /// Add a field to the device mutation
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    pub fn switch_to(self, status: SwitchStatus) -> Self {
        self.set("status.switch", status.as_str())
    }
}

/// Everything the pipeline must do for one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    pub mutation: Option<DeviceMutation>,
    pub audit: Option<AuditEvent>,
    pub fan_out: Vec<NetworkItem>,
}

/// Trait for tag rules
pub trait EventRule: Send + Sync {
    /// Tag this rule handles
    fn tag(&self) -> EventTag;

    /// Fields this rule reads from `eventData`
    fn requirements(&self) -> &'static [FieldRequirement] {
        &[]
    }

    /// Decide the effects of the event on the resolved device
    fn apply(&self, event: &Event, device: &DeviceRecord) -> RuleOutcome;
}

/// Dispatch table from tag to rule
pub struct EventRuleEngine {
    rules: HashMap<EventTag, Arc<dyn EventRule>>,
}

impl Default for EventRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRuleEngine {
    /// Create a new engine with a rule for every registered tag
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register_default_rules();
        engine
    }

    /// Create an engine with no rules
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    fn register_default_rules(&mut self) {
        // Boost heaters
        self.register(Arc::new(PowerOnRule::new(EventTag::BoostPowerOn)));
        self.register(Arc::new(ExceptionCodeRule::new(EventTag::BoostException)));
        self.register(Arc::new(BoostBasicStatusRule));
        self.register(Arc::new(BoostPowerRule));

        // Receivers
        self.register(Arc::new(ExceptionCodeRule::new(EventTag::ReceiverException)));
        self.register(Arc::new(PowerOnRule::new(EventTag::ReceiverPowerOn)));
        self.register(Arc::new(ReceiverBasicStatusRule));

        // Thermostats
        self.register(Arc::new(PowerOnRule::new(EventTag::ThermostatPowerOn)));
        self.register(Arc::new(ThermostatModeRule));
        self.register(Arc::new(ThermostatSetpointRule));

        // Controller
        self.register(Arc::new(ControlNetworkRule));

        // Water heaters
        self.register(Arc::new(WaterExceptionRule));
        self.register(Arc::new(WaterPowerStatusRule));
        self.register(Arc::new(WaterHeatingStatusRule));
        self.register(Arc::new(WaterHeatingModeRule));
        self.register(Arc::new(WaterNetworkRule));
    }

    /// Register a rule, replacing any rule already bound to its tag
    pub fn register(&mut self, rule: Arc<dyn EventRule>) {
        self.rules.insert(rule.tag(), rule);
    }

    pub fn rule(&self, tag: EventTag) -> Option<&dyn EventRule> {
        self.rules.get(&tag).map(|r| r.as_ref())
    }

    pub fn has_rule(&self, tag: EventTag) -> bool {
        self.rules.contains_key(&tag)
    }

    /// Check the tag-specific fields of an already validated event
    pub fn check_requirements(&self, event: &Event) -> Result<(), ValidationError> {
        if let Some(rule) = self.rule(event.tag) {
            for requirement in rule.requirements() {
                requirement.check(event)?;
            }
        }
        Ok(())
    }

    /// Derive the mutation, audit event and fan-out for an event
    pub fn derive(&self, event: &Event, device: &DeviceRecord) -> Derivation {
        let Some(rule) = self.rule(event.tag) else {
            tracing::warn!(event_tag = %event.tag, "No rule bound to event tag");
            return Derivation::default();
        };

        let outcome = rule.apply(event, device);

        let mutation = (!outcome.fields.is_empty()).then(|| DeviceMutation {
            uuid: device.uuid.clone(),
            fields: outcome.fields,
        });

        let audit = outcome
            .description
            .map(|description| AuditEvent::for_device(device, event.tag, description));

        Derivation {
            mutation,
            audit,
            fan_out: outcome.fan_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    pub(crate) fn event(tag: EventTag, data: Value) -> Event {
        let data: Map<String, Value> = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Event {
            tag,
            device_uuid: data
                .get("uuid")
                .and_then(Value::as_str)
                .unwrap_or("d1")
                .to_string(),
            data,
        }
    }

    #[test]
    fn test_every_registered_tag_has_a_rule() {
        let engine = EventRuleEngine::new();
        for tag in EventTag::ALL {
            assert!(engine.has_rule(tag), "missing rule for {}", tag);
        }
    }

    #[test]
    fn test_power_on_example() {
        let engine = EventRuleEngine::new();
        let device = DeviceRecord::new("d1", "x");

        let derivation = engine.derive(&event(EventTag::BoostPowerOn, json!({"uuid": "d1"})), &device);

        let mutation = derivation.mutation.unwrap();
        assert_eq!(mutation.uuid, "d1");
        assert_eq!(mutation.fields.len(), 1);
        assert_eq!(mutation.get("status.switch"), Some(&json!("ON")));
        assert_eq!(derivation.audit.unwrap().event_description, "device power on");
        assert!(derivation.fan_out.is_empty());
    }

    #[test]
    fn test_mutation_targets_resolved_device() {
        let engine = EventRuleEngine::new();
        let device = DeviceRecord::new("canonical-uuid", "x");

        let derivation =
            engine.derive(&event(EventTag::BoostPowerOn, json!({"uuid": "alias"})), &device);

        assert_eq!(derivation.mutation.unwrap().uuid, "canonical-uuid");
        assert_eq!(derivation.audit.unwrap().device_uuid, "canonical-uuid");
    }

    #[test]
    fn test_silent_rule_yields_nothing() {
        let engine = EventRuleEngine::new();
        let device = DeviceRecord::new("d1", "x");

        let derivation = engine.derive(
            &event(EventTag::ControlUpdateNetwork, json!({"uuid": "d1"})),
            &device,
        );

        assert_eq!(derivation, Derivation::default());
    }

    #[test]
    fn test_requirements_checked() {
        let engine = EventRuleEngine::new();

        let err = engine
            .check_requirements(&event(EventTag::BoostBasicStatus, json!({"uuid": "d1"})))
            .unwrap_err();
        assert_eq!(err, ValidationError::missing("eventData.status"));

        let err = engine
            .check_requirements(&event(
                EventTag::BoostBasicStatus,
                json!({"uuid": "d1", "status": "4"}),
            ))
            .unwrap_err();
        assert_eq!(err, ValidationError::invalid_type("eventData.status", "a number"));

        let err = engine
            .check_requirements(&event(
                EventTag::WaterException,
                json!({"uuid": "d1", "errorMSG": 12}),
            ))
            .unwrap_err();
        assert_eq!(err, ValidationError::invalid_type("eventData.errorMSG", "a string"));

        assert!(engine
            .check_requirements(&event(EventTag::BoostPowerOn, json!({"uuid": "d1"})))
            .is_ok());
    }

    #[test]
    fn test_unbound_tag_derives_nothing() {
        let engine = EventRuleEngine::empty();
        let device = DeviceRecord::new("d1", "x");

        let derivation = engine.derive(&event(EventTag::BoostPowerOn, json!({})), &device);
        assert_eq!(derivation, Derivation::default());
        assert!(engine
            .check_requirements(&event(EventTag::BoostBasicStatus, json!({})))
            .is_ok());
    }

    #[test]
    fn test_register_replaces_rule() {
        struct Quiet;
        impl EventRule for Quiet {
            fn tag(&self) -> EventTag {
                EventTag::BoostPowerOn
            }
            fn apply(&self, _event: &Event, _device: &DeviceRecord) -> RuleOutcome {
                RuleOutcome::silent()
            }
        }

        let mut engine = EventRuleEngine::new();
        engine.register(Arc::new(Quiet));

        let derivation = engine.derive(
            &event(EventTag::BoostPowerOn, json!({})),
            &DeviceRecord::new("d1", "x"),
        );
        assert_eq!(derivation, Derivation::default());
    }
}
