//! Boost heater rules

use crate::contracts::*;
use crate::engine::{EventRule, FieldRequirement, RuleOutcome};

use super::status_code;

/// Basic status codes: code -> (switch, description)
pub const BASIC_STATUS_CODES: &[(i64, SwitchStatus, &str)] = &[
    (0x0001, SwitchStatus::On, "Device switch into ECO mode."),
    (0x0002, SwitchStatus::On, "Device switch into MAN mode."),
    (0x0003, SwitchStatus::On, "Device heating finish."),
    (0x0004, SwitchStatus::Off, "Device heating off."),
    (0x0005, SwitchStatus::On, "device power adjusting"),
];

/// Fallback for codes outside [`BASIC_STATUS_CODES`]
pub const BASIC_STATUS_FALLBACK: (SwitchStatus, &str) = (SwitchStatus::Err, "device exception!");

/// Switch state and description for a basic status code
pub fn basic_status(code: Option<i64>) -> (SwitchStatus, &'static str) {
    code.and_then(|code| {
        BASIC_STATUS_CODES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, switch, description)| (*switch, *description))
    })
    .unwrap_or(BASIC_STATUS_FALLBACK)
}

/// Mode change report; the raw status is also stored as the device mode
pub struct BoostBasicStatusRule;

impl EventRule for BoostBasicStatusRule {
    fn tag(&self) -> EventTag {
        EventTag::BoostBasicStatus
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Number("status")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let (switch, description) = basic_status(status_code(event));
        let mode = event.field("status").cloned().unwrap_or_default();

        RuleOutcome::audit(description)
            .set("extra.items.mode", mode)
            .switch_to(switch)
    }
}

/// Power reading; implies the device is on
pub struct BoostPowerRule;

impl EventRule for BoostPowerRule {
    fn tag(&self) -> EventTag {
        EventTag::BoostPower
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Present("power")]
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let power = event.field("power").cloned().unwrap_or_default();

        RuleOutcome::audit("")
            .switch_to(SwitchStatus::On)
            .set("extra.items.power", power)
    }
}
