//! RPC command envelopes exchanged with the device manager and event center

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{AuditEvent, DeviceMutation};

/// Return code that signals success on every hop
pub const RET_CODE_SUCCESS: i64 = 200;

/// A command sent to a remote service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcCommand {
    pub cmd_name: String,
    pub cmd_code: String,
    pub parameters: Value,
}

impl RpcCommand {
    pub const GET_DEVICE: &'static str = "getDevice";
    pub const DEVICE_UPDATE: &'static str = "deviceUpdate";
    pub const SAVE_EVENT: &'static str = "saveEvent";

    /// Device directory lookup
    pub fn get_device(uuid: &str) -> Self {
        Self {
            cmd_name: Self::GET_DEVICE.to_string(),
            cmd_code: "0003".to_string(),
            parameters: json!({ "uuid": uuid }),
        }
    }

    /// Device directory partial update
    pub fn device_update(mutation: &DeviceMutation) -> serde_json::Result<Self> {
        Ok(Self {
            cmd_name: Self::DEVICE_UPDATE.to_string(),
            cmd_code: "0004".to_string(),
            parameters: serde_json::to_value(mutation)?,
        })
    }

    /// Event center append
    pub fn save_event(event: &AuditEvent) -> serde_json::Result<Self> {
        Ok(Self {
            cmd_name: Self::SAVE_EVENT.to_string(),
            cmd_code: "0001".to_string(),
            parameters: serde_json::to_value(event)?,
        })
    }
}

/// Reply from a remote service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponse {
    pub ret_code: i64,
    #[serde(default, deserialize_with = "super::de::null_as_default")]
    pub description: String,
    #[serde(default)]
    pub data: Value,
}

impl RpcResponse {
    pub fn is_success(&self) -> bool {
        self.ret_code == RET_CODE_SUCCESS
    }
}

/// Response returned to the caller of the inbound `save` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub ret_code: i64,
    pub description: String,
    #[serde(default)]
    pub data: Value,
}

impl ServiceResponse {
    pub fn success() -> Self {
        Self {
            ret_code: RET_CODE_SUCCESS,
            description: "Success.".to_string(),
            data: json!({}),
        }
    }

    pub fn failure(ret_code: i64, description: impl Into<String>) -> Self {
        Self {
            ret_code,
            description: description.into(),
            data: json!({}),
        }
    }

    pub fn is_success(&self) -> bool {
        self.ret_code == RET_CODE_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_device_command_shape() {
        let cmd = RpcCommand::get_device("d1");
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"cmdName": "getDevice", "cmdCode": "0003", "parameters": {"uuid": "d1"}})
        );
    }

    #[test]
    fn test_device_update_command_flattens_fields() {
        let mutation = DeviceMutation::new("d1").set("status.switch", "ERR");
        let cmd = RpcCommand::device_update(&mutation).unwrap();
        assert_eq!(cmd.cmd_code, "0004");
        assert_eq!(cmd.parameters, json!({"uuid": "d1", "status.switch": "ERR"}));
    }

    #[test]
    fn test_rpc_response_defaults() {
        let response: RpcResponse = serde_json::from_value(json!({"retCode": 500})).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.description, "");
        assert_eq!(response.data, Value::Null);
    }

    #[test]
    fn test_rpc_response_null_description() {
        let response: RpcResponse =
            serde_json::from_value(json!({"retCode": 404, "description": null, "data": null}))
                .unwrap();
        assert_eq!(response.ret_code, 404);
        assert_eq!(response.description, "");
    }

    #[test]
    fn test_success_response_shape() {
        assert_eq!(
            serde_json::to_value(ServiceResponse::success()).unwrap(),
            json!({"retCode": 200, "description": "Success.", "data": {}})
        );
    }
}
