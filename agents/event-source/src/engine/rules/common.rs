//! Rules shared by several device families

use crate::contracts::*;
use crate::engine::{EventRule, RuleOutcome};

use super::status_code;

/// Exception status codes and their descriptions
pub const EXCEPTION_CODES: &[(i64, &str)] = &[
    (0xFFF1, "device voltage abnormal."),
    (0xFFF2, "device current abnormal."),
    (0xFFF3, "device power abnormal."),
    (0xFFF4, "device temperature abnormal."),
    (0xFFF5, "device unknown error."),
];

/// Description for an exception code; `None` for codes outside the table
pub fn exception_description(code: i64) -> Option<&'static str> {
    EXCEPTION_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, description)| *description)
}

/// Device reports it has been switched on
pub struct PowerOnRule {
    tag: EventTag,
}

impl PowerOnRule {
    pub fn new(tag: EventTag) -> Self {
        Self { tag }
    }
}

impl EventRule for PowerOnRule {
    fn tag(&self) -> EventTag {
        self.tag
    }

    fn apply(&self, _event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        RuleOutcome::audit("device power on").switch_to(SwitchStatus::On)
    }
}

/// Device reports a fault code.
///
/// The switch always goes to ERR. Unknown codes still produce an audit
/// event, with an empty description.
pub struct ExceptionCodeRule {
    tag: EventTag,
}

impl ExceptionCodeRule {
    pub fn new(tag: EventTag) -> Self {
        Self { tag }
    }
}

impl EventRule for ExceptionCodeRule {
    fn tag(&self) -> EventTag {
        self.tag
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        let description = status_code(event)
            .and_then(exception_description)
            .unwrap_or_default();

        RuleOutcome::audit(description).switch_to(SwitchStatus::Err)
    }
}
