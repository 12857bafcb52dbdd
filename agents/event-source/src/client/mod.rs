//! Clients for the collaborator services
//!
//! The pipeline talks to two remote services through the traits below:
//! the device directory ("device_manager") and the event store
//! ("event_center"). The HTTP implementations share one RPC transport and
//! endpoint-pool rotation.

pub mod device_manager;
pub mod event_center;
pub mod pool;
pub mod rpc;

pub use device_manager::DeviceManagerClient;
pub use event_center::EventCenterClient;
pub use pool::EndpointPool;
pub use rpc::{RpcClient, RPC_PATH};

use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::{AuditEvent, DeviceMutation, DeviceRecord, RpcResponse};
use crate::error::{EventSourceError, Result};

/// Pool name of the device directory
pub const DEVICE_MANAGER: &str = "device_manager";

/// Pool name of the event store
pub const EVENT_CENTER: &str = "event_center";

/// Transport-level client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("no instance configured for {0}")]
    NoEndpoint(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("unreadable reply: {0}")]
    Parse(String),

    #[error("failed to encode command: {0}")]
    Encode(String),
}

impl From<ClientError> for EventSourceError {
    fn from(err: ClientError) -> Self {
        EventSourceError::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Encode(err.to_string())
    }
}

/// Turn a non-success reply into a remote error
pub(crate) fn ensure_success(response: RpcResponse) -> Result<RpcResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(EventSourceError::remote(response.ret_code, response.description))
    }
}

/// Device directory: lookup and partial update of device records
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Resolve a uuid to its current record.
    ///
    /// A successful reply without a record is [`EventSourceError::NotFound`].
    async fn get_device(&self, uuid: &str) -> Result<DeviceRecord>;

    /// Apply a partial update
    async fn update_device(&self, mutation: &DeviceMutation) -> Result<()>;
}

/// Event store: append-only audit log
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn save_event(&self, event: &AuditEvent) -> Result<()>;
}
