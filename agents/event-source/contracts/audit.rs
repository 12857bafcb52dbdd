//! Audit events persisted to the event center

use serde::{Deserialize, Serialize};

use super::{DeviceRecord, EventTag};

/// Human-readable history entry for a device.
///
/// Built only from a resolved [`DeviceRecord`], never from a bare uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub user_uuid: String,
    pub owner_uuid: String,
    pub device_uuid: String,
    pub device_name: String,
    pub device_type: String,
    pub event_tag: EventTag,
    pub event_level: u8,
    pub event_description: String,
}

impl AuditEvent {
    /// Level used for every event this service emits
    pub const DEFAULT_LEVEL: u8 = 0;

    pub fn for_device(
        device: &DeviceRecord,
        event_tag: EventTag,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_uuid: device.user_id.clone(),
            owner_uuid: device.owner.clone(),
            device_uuid: device.uuid.clone(),
            device_name: device.name.clone(),
            device_type: device.device_type.id.clone(),
            event_tag,
            event_level: Self::DEFAULT_LEVEL,
            event_description: description.into(),
        }
    }
}
