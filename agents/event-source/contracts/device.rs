//! Device directory records and the partial-update command

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Power switch state held by the device directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchStatus {
    On,
    Off,
    Err,
}

impl SwitchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchStatus::On => "ON",
            SwitchStatus::Off => "OFF",
            SwitchStatus::Err => "ERR",
        }
    }
}

impl fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity state held by the device directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkStatus {
    Connected,
    Disconnected,
}

impl NetworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Connected => "CONNECTED",
            NetworkStatus::Disconnected => "DISCONNECTED",
        }
    }

    pub fn from_online(online: bool) -> Self {
        if online {
            NetworkStatus::Connected
        } else {
            NetworkStatus::Disconnected
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device type descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(default)]
    pub id: String,
}

/// Current status block of a device.
///
/// Values outside the known states read as `None`; the directory may hold
/// states this service never writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(
        default,
        deserialize_with = "super::de::tolerant",
        skip_serializing_if = "Option::is_none"
    )]
    pub switch: Option<SwitchStatus>,
    #[serde(
        default,
        deserialize_with = "super::de::tolerant",
        skip_serializing_if = "Option::is_none"
    )]
    pub network: Option<NetworkStatus>,
}

/// Free-form extension block (`extra.items.mode`, `extra.items.power`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceExtra {
    #[serde(default)]
    pub items: Map<String, Value>,
}

/// A device as stored in the device directory.
///
/// Owned by the directory; this service only reads it and requests
/// partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub uuid: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "super::de::null_as_default")]
    pub device_type: DeviceType,
    #[serde(default, deserialize_with = "super::de::null_as_default")]
    pub status: DeviceStatus,
    #[serde(default, deserialize_with = "super::de::null_as_default")]
    pub extra: DeviceExtra,
}

impl DeviceRecord {
    /// Minimal record, mostly useful in tests and fixtures
    pub fn new(uuid: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            user_id: String::new(),
            owner: String::new(),
            name: String::new(),
            device_type: DeviceType { id: type_id.into() },
            status: DeviceStatus::default(),
            extra: DeviceExtra::default(),
        }
    }

    /// Set the current network status
    pub fn with_network(mut self, network: NetworkStatus) -> Self {
        self.status.network = Some(network);
        self
    }

    /// Set the owning user and owner
    pub fn with_owner(mut self, user_id: impl Into<String>, owner: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self.owner = owner.into();
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Partial-update command against a device record.
///
/// Serialises flat: `{"uuid": "...", "status.switch": "ON", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceMutation {
    pub uuid: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DeviceMutation {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a dotted-path field
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One entry of `eventData.network` in a control network update.
///
/// `online` is read by truthiness, so `1`, `"yes"` and `true` all mean
/// connected while a missing flag, `null`, `0` and `false` do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkItem {
    pub uuid: String,
    #[serde(default, deserialize_with = "super::de::truthy")]
    pub online: bool,
}

impl NetworkItem {
    pub fn new(uuid: impl Into<String>, online: bool) -> Self {
        Self {
            uuid: uuid.into(),
            online,
        }
    }

    /// Network status the device should end up in
    pub fn target_status(&self) -> NetworkStatus {
        NetworkStatus::from_online(self.online)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_record_from_directory_json() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "uuid": "d1",
            "userId": "u1",
            "owner": "o1",
            "name": "Boiler",
            "type": {"id": "040B09050101"},
            "status": {"switch": "ON", "network": "CONNECTED"},
            "extra": {"items": {"mode": 1, "power": 40}}
        }))
        .unwrap();

        assert_eq!(record.user_id, "u1");
        assert_eq!(record.device_type.id, "040B09050101");
        assert_eq!(record.status.switch, Some(SwitchStatus::On));
        assert_eq!(record.status.network, Some(NetworkStatus::Connected));
        assert_eq!(record.extra.items.get("power"), Some(&json!(40)));
    }

    #[test]
    fn test_device_record_tolerates_sparse_json() {
        let record: DeviceRecord = serde_json::from_value(json!({"uuid": "d2"})).unwrap();
        assert_eq!(record.device_type.id, "");
        assert_eq!(record.status, DeviceStatus::default());
        assert!(record.extra.items.is_empty());
    }

    #[test]
    fn test_device_record_with_unknown_states() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "uuid": "d3",
            "type": null,
            "status": {"switch": "STANDBY", "network": "connected"},
            "extra": null
        }))
        .unwrap();

        assert_eq!(record.uuid, "d3");
        assert_eq!(record.device_type.id, "");
        assert_eq!(record.status.switch, None);
        assert_eq!(record.status.network, None);

        let record: DeviceRecord =
            serde_json::from_value(json!({"uuid": "d4", "status": {"switch": 3, "network": "CONNECTED"}}))
                .unwrap();
        assert_eq!(record.status.switch, None);
        assert_eq!(record.status.network, Some(NetworkStatus::Connected));
    }

    #[test]
    fn test_mutation_serializes_flat() {
        let mutation = DeviceMutation::new("d1")
            .set("status.switch", "ON")
            .set("extra.items.power", 42);

        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(
            json,
            json!({"uuid": "d1", "status.switch": "ON", "extra.items.power": 42})
        );
    }

    #[test]
    fn test_network_item_target() {
        assert_eq!(NetworkItem::new("a", true).target_status(), NetworkStatus::Connected);
        let item: NetworkItem = serde_json::from_value(json!({"uuid": "b"})).unwrap();
        assert_eq!(item.target_status(), NetworkStatus::Disconnected);
    }

    #[test]
    fn test_network_item_loose_online_flag() {
        let online = |flag: Value| {
            serde_json::from_value::<NetworkItem>(json!({"uuid": "x", "online": flag}))
                .unwrap()
                .online
        };

        assert!(online(json!(1)));
        assert!(online(json!("true")));
        assert!(!online(json!(0)));
        assert!(!online(json!(null)));
        assert!(!online(json!("")));
    }
}
