//! Controller network batch

use serde_json::Value;

use crate::contracts::*;
use crate::engine::{EventRule, RuleOutcome};

/// Parse the `network` array of a control event.
///
/// Entries without a string `uuid` are dropped with a warning. A missing or
/// non-array `network` yields no items.
pub fn network_items(event: &Event) -> Vec<NetworkItem> {
    let Some(entries) = event.field("network").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match serde_json::from_value::<NetworkItem>(entry.clone()) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(
                        device_uuid = %event.device_uuid,
                        index,
                        error = %e,
                        "Skipping malformed network item"
                    );
                    None
                }
            }
        })
        .collect()
}

/// The controller reports connectivity for many devices at once. The
/// controller record itself is not touched; each item is handled by the
/// fan-out.
pub struct ControlNetworkRule;

impl EventRule for ControlNetworkRule {
    fn tag(&self) -> EventTag {
        EventTag::ControlUpdateNetwork
    }

    fn apply(&self, event: &Event, _device: &DeviceRecord) -> RuleOutcome {
        RuleOutcome::fan_out(network_items(event))
    }
}
