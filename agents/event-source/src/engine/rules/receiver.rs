//! Receiver rules

use crate::contracts::*;
use crate::engine::{receiver_switch, EventRule, FieldRequirement, RuleOutcome};

use super::{render, status_code};

/// Raw status word report.
///
/// The word is always stored; the switch is only touched for receiver
/// types with a known threshold.
pub struct ReceiverBasicStatusRule;

impl EventRule for ReceiverBasicStatusRule {
    fn tag(&self) -> EventTag {
        EventTag::ReceiverBasicStatus
    }

    fn requirements(&self) -> &'static [FieldRequirement] {
        &[FieldRequirement::Number("status")]
    }

    fn apply(&self, event: &Event, device: &DeviceRecord) -> RuleOutcome {
        let status = event.field("status");
        let mut outcome = RuleOutcome::audit(format!("device power report to {}", render(status)))
            .set("extra.items.status", status.cloned().unwrap_or_default());

        let switch = status_code(event)
            .and_then(|code| receiver_switch(&device.device_type.id, code));
        if let Some(switch) = switch {
            outcome = outcome.switch_to(switch);
        }

        outcome
    }
}
