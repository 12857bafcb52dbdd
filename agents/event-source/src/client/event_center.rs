//! Event store client

use async_trait::async_trait;

use crate::contracts::{AuditEvent, RpcCommand};
use crate::error::Result;

use super::{ensure_success, ClientError, EventStore, RpcClient};

/// RPC client for the "event_center" pool
pub struct EventCenterClient {
    rpc: RpcClient,
}

impl EventCenterClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait]
impl EventStore for EventCenterClient {
    async fn save_event(&self, event: &AuditEvent) -> Result<()> {
        let command = RpcCommand::save_event(event).map_err(ClientError::from)?;
        ensure_success(self.rpc.call(&command).await?)?;
        Ok(())
    }
}
