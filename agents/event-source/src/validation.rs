//! Envelope validation
//!
//! Checks the inbound message against the declared envelope shape:
//! `eventTag` must be a registered tag and `eventData` must be an object
//! carrying a string `uuid`. Tag-specific fields are the rule engine's
//! concern, not this gate's.

use serde_json::{json, Value};

use crate::contracts::{Event, EventTag};
use crate::error::ValidationError;

/// Declared shape of the `save` operation's input
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeSchema {
    tags: Vec<EventTag>,
}

impl Default for EnvelopeSchema {
    fn default() -> Self {
        Self::save()
    }
}

impl EnvelopeSchema {
    /// Schema accepting every registered tag
    pub fn save() -> Self {
        Self {
            tags: EventTag::ALL.to_vec(),
        }
    }

    /// Schema restricted to a subset of tags
    pub fn with_tags(tags: impl IntoIterator<Item = EventTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    pub fn allows(&self, tag: EventTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn tags(&self) -> &[EventTag] {
        &self.tags
    }

    /// JSON Schema rendering of the contract, as published to callers
    pub fn to_json_schema(&self) -> Value {
        let names: Vec<&str> = self.tags.iter().map(|t| t.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "eventTag": {"type": "string", "enum": names},
                "eventData": {
                    "type": "object",
                    "properties": {"uuid": {"type": "string"}},
                    "required": ["uuid"]
                }
            },
            "required": ["eventTag", "eventData"]
        })
    }
}

/// Validate an inbound message and produce the typed event
pub fn validate(message: &Value, schema: &EnvelopeSchema) -> Result<Event, ValidationError> {
    let envelope = message.as_object().ok_or(ValidationError::NotAnObject)?;

    let tag_name = match envelope.get("eventTag") {
        None | Some(Value::Null) => return Err(ValidationError::missing("eventTag")),
        Some(Value::String(name)) => name,
        Some(_) => return Err(ValidationError::invalid_type("eventTag", "a string")),
    };

    let tag = tag_name
        .parse::<EventTag>()
        .ok()
        .filter(|tag| schema.allows(*tag))
        .ok_or_else(|| ValidationError::NotRegistered {
            path: "eventTag".to_string(),
            value: tag_name.clone(),
        })?;

    let data = match envelope.get("eventData") {
        None | Some(Value::Null) => return Err(ValidationError::missing("eventData")),
        Some(Value::Object(data)) => data,
        Some(_) => return Err(ValidationError::invalid_type("eventData", "an object")),
    };

    let device_uuid = match data.get("uuid") {
        None | Some(Value::Null) => return Err(ValidationError::missing("eventData.uuid")),
        Some(Value::String(uuid)) => uuid.clone(),
        Some(_) => return Err(ValidationError::invalid_type("eventData.uuid", "a string")),
    };

    Ok(Event {
        tag,
        device_uuid,
        data: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_envelope() {
        let event = validate(
            &json!({"eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT", "eventData": {"uuid": "d1"}}),
            &EnvelopeSchema::save(),
        )
        .unwrap();

        assert_eq!(event.tag, EventTag::BoostPowerOn);
        assert_eq!(event.device_uuid, "d1");
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let event = validate(
            &json!({
                "eventTag": "EVENT_DEV_MEBOOST_POWER_REPORT",
                "eventData": {"uuid": "d1", "power": 42}
            }),
            &EnvelopeSchema::save(),
        )
        .unwrap();

        assert_eq!(event.field("power"), Some(&json!(42)));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = validate(&json!([1, 2]), &EnvelopeSchema::save()).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
    }

    #[test]
    fn test_rejects_unregistered_tag() {
        let err = validate(
            &json!({"eventTag": "EVENT_DEV_TOASTER_REPORT", "eventData": {"uuid": "d1"}}),
            &EnvelopeSchema::save(),
        )
        .unwrap_err();

        assert!(matches!(err, ValidationError::NotRegistered { .. }));
    }

    #[test]
    fn test_rejects_tag_outside_schema_subset() {
        let schema = EnvelopeSchema::with_tags([EventTag::BoostPowerOn]);
        let err = validate(
            &json!({"eventTag": "EVENT_CONTROL_UPDATE_NETWORK", "eventData": {"uuid": "d1"}}),
            &schema,
        )
        .unwrap_err();

        assert!(matches!(err, ValidationError::NotRegistered { .. }));
    }

    #[test]
    fn test_rejects_missing_or_bad_uuid() {
        let schema = EnvelopeSchema::save();

        let err = validate(
            &json!({"eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT", "eventData": {}}),
            &schema,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::missing("eventData.uuid"));

        let err = validate(
            &json!({"eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT", "eventData": {"uuid": 7}}),
            &schema,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::invalid_type("eventData.uuid", "a string"));
    }

    #[test]
    fn test_rejects_missing_event_data() {
        let err = validate(
            &json!({"eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT"}),
            &EnvelopeSchema::save(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::missing("eventData"));
    }

    #[test]
    fn test_json_schema_lists_every_tag() {
        let schema = EnvelopeSchema::save().to_json_schema();
        let tags = schema["properties"]["eventTag"]["enum"].as_array().unwrap();
        assert_eq!(tags.len(), EventTag::ALL.len());
        assert_eq!(schema["required"], json!(["eventTag", "eventData"]));
    }
}
