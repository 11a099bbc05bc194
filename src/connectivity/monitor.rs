use super::types::HealthCheckResult;
use crate::rpc::{Connector, EndpointDescriptor};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Checks one endpoint
///
/// Implementations must finish within their own timeout; any failure
/// (timeout, HTTP status, RPC error, non-"ok" answer) is reported as an
/// unhealthy [`HealthCheckResult`], never as an error.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> HealthCheckResult;
}

/// `getHealth` probe through a fresh client per endpoint
pub struct RpcHealthProbe {
    connector: Arc<dyn Connector>,
}

impl RpcHealthProbe {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl EndpointProbe for RpcHealthProbe {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> HealthCheckResult {
        let start = Instant::now();

        let client = match self.connector.connect(endpoint).await {
            Ok(client) => client,
            Err(e) => return HealthCheckResult::failure(e.to_string()),
        };

        match client.get_health().await {
            Ok(()) => HealthCheckResult::from_latency(start.elapsed().as_millis() as u64),
            Err(e) => HealthCheckResult::failure(e.to_string()),
        }
    }
}
