//! Inbound event envelope and the registered tag set

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Semantic kind of a telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventTag {
    #[serde(rename = "EVENT_DEV_MEBOOST_POWERON_REPORT")]
    BoostPowerOn,
    #[serde(rename = "EVENT_DEV_MEBOOST_EXCEPTION_REPORT")]
    BoostException,
    #[serde(rename = "EVENT_DEV_MEBOOST_BASIC_STATUS_REPORT")]
    BoostBasicStatus,
    #[serde(rename = "EVENT_DEV_MEBOOST_POWER_REPORT")]
    BoostPower,
    #[serde(rename = "EVENT_DEV_MERECEIVER_EXCEPTION_REPORT")]
    ReceiverException,
    #[serde(rename = "EVENT_DEV_MERECEIVER_POWERON_REPORT")]
    ReceiverPowerOn,
    #[serde(rename = "EVENT_DEV_MERECEIVER_BASIC_STATUS_REPORT")]
    ReceiverBasicStatus,
    #[serde(rename = "EVENT_DEV_METHERMOSTAT_POWERON_REPORT")]
    ThermostatPowerOn,
    #[serde(rename = "EVENT_DEV_METHERMOSTAT_MODE_REPORT")]
    ThermostatMode,
    #[serde(rename = "EVENT_DEV_METHERMOSTAT_SETPOINT_REPORT")]
    ThermostatSetpoint,
    #[serde(rename = "EVENT_CONTROL_UPDATE_NETWORK")]
    ControlUpdateNetwork,
    #[serde(rename = "EVENT_DEV_YUEDONG_WATER_EXCEPTION_REPORT")]
    WaterException,
    #[serde(rename = "EVENT_DEV_YUEDONG_WATER_POWER_STATUS_REPORT")]
    WaterPowerStatus,
    #[serde(rename = "EVENT_DEV_YUEDONG_WATER_HEATING_STATUS_REPORT")]
    WaterHeatingStatus,
    #[serde(rename = "EVENT_DEV_YUEDONG_WATER_HEATING_MODE_REPORT")]
    WaterHeatingMode,
    #[serde(rename = "EVENT_DEV_YUEDONG_WATER_UPDATE_NETWORK")]
    WaterUpdateNetwork,
}

impl EventTag {
    /// Every registered tag, in registry order
    pub const ALL: [EventTag; 16] = [
        EventTag::BoostPowerOn,
        EventTag::BoostException,
        EventTag::BoostBasicStatus,
        EventTag::BoostPower,
        EventTag::ReceiverException,
        EventTag::ReceiverPowerOn,
        EventTag::ReceiverBasicStatus,
        EventTag::ThermostatPowerOn,
        EventTag::ThermostatMode,
        EventTag::ThermostatSetpoint,
        EventTag::ControlUpdateNetwork,
        EventTag::WaterException,
        EventTag::WaterPowerStatus,
        EventTag::WaterHeatingStatus,
        EventTag::WaterHeatingMode,
        EventTag::WaterUpdateNetwork,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::BoostPowerOn => "EVENT_DEV_MEBOOST_POWERON_REPORT",
            EventTag::BoostException => "EVENT_DEV_MEBOOST_EXCEPTION_REPORT",
            EventTag::BoostBasicStatus => "EVENT_DEV_MEBOOST_BASIC_STATUS_REPORT",
            EventTag::BoostPower => "EVENT_DEV_MEBOOST_POWER_REPORT",
            EventTag::ReceiverException => "EVENT_DEV_MERECEIVER_EXCEPTION_REPORT",
            EventTag::ReceiverPowerOn => "EVENT_DEV_MERECEIVER_POWERON_REPORT",
            EventTag::ReceiverBasicStatus => "EVENT_DEV_MERECEIVER_BASIC_STATUS_REPORT",
            EventTag::ThermostatPowerOn => "EVENT_DEV_METHERMOSTAT_POWERON_REPORT",
            EventTag::ThermostatMode => "EVENT_DEV_METHERMOSTAT_MODE_REPORT",
            EventTag::ThermostatSetpoint => "EVENT_DEV_METHERMOSTAT_SETPOINT_REPORT",
            EventTag::ControlUpdateNetwork => "EVENT_CONTROL_UPDATE_NETWORK",
            EventTag::WaterException => "EVENT_DEV_YUEDONG_WATER_EXCEPTION_REPORT",
            EventTag::WaterPowerStatus => "EVENT_DEV_YUEDONG_WATER_POWER_STATUS_REPORT",
            EventTag::WaterHeatingStatus => "EVENT_DEV_YUEDONG_WATER_HEATING_STATUS_REPORT",
            EventTag::WaterHeatingMode => "EVENT_DEV_YUEDONG_WATER_HEATING_MODE_REPORT",
            EventTag::WaterUpdateNetwork => "EVENT_DEV_YUEDONG_WATER_UPDATE_NETWORK",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the registered tags
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unregistered event tag: {0}")]
pub struct UnknownEventTag(pub String);

impl FromStr for EventTag {
    type Err = UnknownEventTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownEventTag(s.to_string()))
    }
}

/// A validated inbound event.
///
/// Only produced by the envelope validator, so `device_uuid` is always the
/// string `eventData.uuid` of the inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub tag: EventTag,
    pub device_uuid: String,
    pub data: Map<String, Value>,
}

impl Event {
    /// Look up a tag-specific field in `eventData`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trips_through_wire_name() {
        for tag in EventTag::ALL {
            assert_eq!(tag.as_str().parse::<EventTag>().unwrap(), tag);
            let json = serde_json::to_value(tag).unwrap();
            assert_eq!(json, Value::String(tag.as_str().to_string()));
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = "EVENT_DEV_TOASTER_REPORT".parse::<EventTag>().unwrap_err();
        assert_eq!(err.to_string(), "unregistered event tag: EVENT_DEV_TOASTER_REPORT");
    }

    #[test]
    fn test_registry_has_no_duplicates() {
        let mut names: Vec<_> = EventTag::ALL.iter().map(|t| t.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EventTag::ALL.len());
    }
}
