//! Water heater rules
//!
//! Apart from the exception report these are audit-only: the device record
//! is left untouched.

use serde_json::Value;

use crate::contracts::*;
use crate::engine::{EventRule, FieldRequirement, RuleOutcome};

use super::{render, status_code};

/// Status value meaning the heater started heating
pub const HEATING_STARTED: i64 = 2;

/// Fault report carrying its own message text
pub struct WaterExceptionRule;

impl EventRule for WaterExceptionRule {
    fn tag(&self) -> EventTag {
        EventTag::WaterException
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::String("errorMSG")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let message = event
            .field("errorMSG")
            .and_then(Value::as_str)
            .unwrap_or_default();

        RuleOutcome::audit(message).switch_to(SwitchStatus::Err)
    }
}

pub struct WaterPowerStatusRule;

impl EventRule for WaterPowerStatusRule {
    fn tag(&self) -> EventTag {
        EventTag::WaterPowerStatus
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("power")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        RuleOutcome::audit(format!("device power {}", render(event.field("power"))))
    }
}

pub struct WaterHeatingStatusRule;

impl EventRule for WaterHeatingStatusRule {
    fn tag(&self) -> EventTag {
        EventTag::WaterHeatingStatus
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("status")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let heating = status_code(event) == Some(HEATING_STARTED);
        if heating {
            RuleOutcome::audit("device start heating.")
        } else {
            RuleOutcome::audit("device heating off.")
        }
    }
}

pub struct WaterHeatingModeRule;

impl EventRule for WaterHeatingModeRule {
    fn tag(&self) -> EventTag {
        EventTag::WaterHeatingMode
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("heat_mode")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        RuleOutcome::audit(format!(
            "device switch into {} mode.",
            render(event.field("heat_mode"))
        ))
    }
}

/// Connectivity report from the heater itself (not the controller batch)
pub struct WaterNetworkRule;

impl EventRule for WaterNetworkRule {
    fn tag(&self) -> EventTag {
        EventTag::WaterUpdateNetwork
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("network")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        RuleOutcome::audit(format!("device {}.", render(event.field("network"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::event;
    use serde_json::json;

    fn device() -> DeviceRecord {
        DeviceRecord::new("w1", "water")
    }

    #[test]
    fn test_exception_uses_error_message() {
        let outcome = WaterExceptionRule.apply(
            &event(EventTag::WaterException, json!({"uuid": "w1", "errorMSG": "E3 dry burn"})),
            &device(),
        );

        assert_eq!(outcome.fields.get("status.switch"), Some(&json!("ERR")));
        assert_eq!(outcome.description.as_deref(), Some("E3 dry burn"));
    }

    #[test]
    fn test_power_status_is_audit_only() {
        let outcome = WaterPowerStatusRule.apply(
            &event(EventTag::WaterPowerStatus, json!({"uuid": "w1", "power": "ON"})),
            &device(),
        );

        assert!(outcome.fields.is_empty());
        assert_eq!(outcome.description.as_deref(), Some("device power ON"));
    }

    #[test]
    fn test_heating_status() {
        let rule = WaterHeatingStatusRule;
        let cases = [
            (json!(2), "device start heating."),
            (json!(2.0), "device start heating."),
            (json!(1), "device heating off."),
            (json!(0), "device heating off."),
            (json!("2"), "device heating off."),
        ];

        for (status, expected) in cases {
            let outcome = rule.apply(
                &event(EventTag::WaterHeatingStatus, json!({"uuid": "w1", "status": status})),
                &device(),
            );
            assert!(outcome.fields.is_empty());
            assert_eq!(outcome.description.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_heating_mode() {
        let outcome = WaterHeatingModeRule.apply(
            &event(EventTag::WaterHeatingMode, json!({"uuid": "w1", "heat_mode": "ECO"})),
            &device(),
        );

        assert!(outcome.fields.is_empty());
        assert_eq!(outcome.description.as_deref(), Some("device switch into ECO mode."));
    }

    #[test]
    fn test_network_report() {
        let outcome = WaterNetworkRule.apply(
            &event(EventTag::WaterUpdateNetwork, json!({"uuid": "w1", "network": "offline"})),
            &device(),
        );

        assert!(outcome.fields.is_empty());
        assert!(outcome.fan_out.is_empty());
        assert_eq!(outcome.description.as_deref(), Some("device offline."));
    }
}
