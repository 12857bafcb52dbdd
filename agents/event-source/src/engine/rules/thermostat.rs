//! Thermostat rules

use crate::contracts::*;
use crate::engine::{EventRule, FieldRequirement, RuleOutcome};

use super::render;

/// Operating mode change; mirrors the water heater mode report and also
/// records the mode on the device
pub struct ThermostatModeRule;

impl EventRule for ThermostatModeRule {
    fn tag(&self) -> EventTag {
        EventTag::ThermostatMode
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("mode")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let mode = event.field("mode");
        RuleOutcome::audit(format!("device switch into {} mode.", render(mode)))
            .set("extra.items.mode", mode.cloned().unwrap_or_default())
    }
}

/// Target temperature change
pub struct ThermostatSetpointRule;

impl EventRule for ThermostatSetpointRule {
    fn tag(&self) -> EventTag {
        EventTag::ThermostatSetpoint
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("setpoint")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let setpoint = event.field("setpoint");
        RuleOutcome::audit(format!("device setpoint to {}", render(setpoint)))
            .set("extra.items.setpoint", setpoint.cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::event;
    use serde_json::json;

    #[test]
    fn test_mode_report() {
        let outcome = ThermostatModeRule.apply(
            &event(EventTag::ThermostatMode, json!({"uuid": "t1", "mode": "AWAY"})),
            &DeviceRecord::new("t1", "x"),
        );

        assert_eq!(outcome.fields.get("extra.items.mode"), Some(&json!("AWAY")));
        assert_eq!(outcome.description.as_deref(), Some("device switch into AWAY mode."));
    }

    #[test]
    fn test_setpoint_report() {
        let outcome = ThermostatSetpointRule.apply(
            &event(EventTag::ThermostatSetpoint, json!({"uuid": "t1", "setpoint": 21.5})),
            &DeviceRecord::new("t1", "x"),
        );

        assert_eq!(outcome.fields.get("extra.items.setpoint"), Some(&json!(21.5)));
        assert_eq!(outcome.description.as_deref(), Some("device setpoint to 21.5"));
    }
}
