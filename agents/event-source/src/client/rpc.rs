//! RPC transport shared by the collaborator clients
//!
//! Commands are POSTed as JSON to `<instance>/api/v1/rpc`. Any reply that
//! parses as an [`RpcResponse`] is returned as-is; interpreting `retCode` is
//! up to the caller.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::contracts::{RpcCommand, RpcResponse};
use crate::telemetry::EventSourceMetrics;

use super::{ClientError, EndpointPool};

/// Path of the RPC endpoint on every collaborator instance
pub const RPC_PATH: &str = "/api/v1/rpc";

/// HTTP client for one collaborator pool
pub struct RpcClient {
    client: Client,
    pool: EndpointPool,
    timeout_ms: u64,
    metrics: Option<Arc<EventSourceMetrics>>,
}

impl RpcClient {
    /// Create a client for a pool with the given per-request timeout
    pub fn new(pool: EndpointPool, timeout_ms: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            pool,
            timeout_ms,
            metrics: None,
        })
    }

    /// Record every call in the given metrics
    pub fn with_metrics(mut self, metrics: Arc<EventSourceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn service(&self) -> &str {
        self.pool.service()
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Send a command to the next instance of the pool
    pub async fn call(&self, command: &RpcCommand) -> Result<RpcResponse, ClientError> {
        let result = self.send(command).await;

        if let Some(metrics) = &self.metrics {
            let label = match &result {
                Ok(response) if response.is_success() => "success",
                Ok(_) => "remote_error",
                Err(_) => "transport_error",
            };
            metrics.record_remote_call(self.service(), &command.cmd_name, label);
        }

        result
    }

    async fn send(&self, command: &RpcCommand) -> Result<RpcResponse, ClientError> {
        let base = self.pool.pick()?;
        let url = format!("{}{}", base, RPC_PATH);

        tracing::debug!(
            service = %self.service(),
            instance = %base,
            cmd_name = %command.cmd_name,
            cmd_code = %command.cmd_code,
            "Sending RPC command"
        );

        let response = self
            .client
            .post(&url)
            .json(command)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RpcResponse>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}
