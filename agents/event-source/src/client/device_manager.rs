//! Device directory client

use async_trait::async_trait;
use serde_json::Value;

use crate::contracts::{DeviceMutation, DeviceRecord, RpcCommand};
use crate::error::{EventSourceError, Result};

use super::{ensure_success, ClientError, DeviceDirectory, RpcClient};

/// RPC client for the "device_manager" pool
pub struct DeviceManagerClient {
    rpc: RpcClient,
}

impl DeviceManagerClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

/// Pick the device record out of a lookup reply.
///
/// The directory may answer with the record itself or with a list whose
/// first element is the record. Null, an empty list, or an empty object
/// mean the uuid is unknown.
pub(crate) fn device_from_data(uuid: &str, data: Value) -> Result<DeviceRecord> {
    let record = match data {
        Value::Array(items) => items.into_iter().next(),
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other),
    };

    match record {
        Some(Value::Null) | None => Err(EventSourceError::NotFound {
            uuid: uuid.to_string(),
        }),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            EventSourceError::from(ClientError::Parse(format!("invalid device record: {}", e)))
        }),
    }
}

#[async_trait]
impl DeviceDirectory for DeviceManagerClient {
    async fn get_device(&self, uuid: &str) -> Result<DeviceRecord> {
        let response = ensure_success(self.rpc.call(&RpcCommand::get_device(uuid)).await?)?;
        device_from_data(uuid, response.data)
    }

    async fn update_device(&self, mutation: &DeviceMutation) -> Result<()> {
        let command = RpcCommand::device_update(mutation).map_err(ClientError::from)?;
        ensure_success(self.rpc.call(&command).await?)?;
        Ok(())
    }
}
