//! Ledger client seam and its JSON-RPC implementation
//!
//! Every call carries its own timeout; a timeout is reported as
//! [`RpcError::Timeout`] and treated like any other upstream failure.

use super::manager::Connector;
use super::types::{EndpointDescriptor, SignatureInfo};
use crate::config::Config;
use crate::errors::RpcError;
use crate::logger::{self, LogTag};
use crate::transactions::RawTransaction;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Queries the pipeline issues against the ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Name of the endpoint this client talks to
    fn endpoint_name(&self) -> &str;

    /// `getHealth`, `Ok` only when the node answers "ok"
    async fn get_health(&self) -> Result<(), RpcError>;

    /// Signatures for `program` older than `before` and newer than `until`, newest first
    async fn list_signatures(
        &self,
        program: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError>;

    /// jsonParsed transaction, `None` when the node does not know it (yet)
    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, RpcError>;

    /// Native balance in lamports
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError>;
}

/// Per-method timeouts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientTimeouts {
    pub health: Duration,
    pub signatures: Duration,
    pub transaction: Duration,
    pub balance: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(3),
            signatures: Duration::from_secs(10),
            transaction: Duration::from_secs(10),
            balance: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for ClientTimeouts {
    fn from(config: &Config) -> Self {
        Self {
            health: Duration::from_secs(config.connectivity.health_check_timeout_secs),
            signatures: Duration::from_secs(config.rpc.signatures_timeout_secs),
            transaction: Duration::from_secs(config.rpc.transaction_timeout_secs),
            balance: Duration::from_secs(config.rpc.balance_timeout_secs),
        }
    }
}

/// JSON-RPC over HTTP via reqwest
pub struct HttpLedgerClient {
    endpoint_name: String,
    url: String,
    http: reqwest::Client,
    timeouts: ClientTimeouts,
    commitment: String,
}

impl HttpLedgerClient {
    pub fn new(
        endpoint: &EndpointDescriptor,
        timeouts: ClientTimeouts,
        commitment: &str,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::ConnectionFailed {
                endpoint: endpoint.name.clone(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint_name: endpoint.name.clone(),
            url: endpoint.http_url.clone(),
            http,
            timeouts,
            commitment: commitment.to_string(),
        })
    }

    /// Send one request and return its `result`
    async fn execute(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        logger::verbose(
            LogTag::Rpc,
            &format!("{} -> {} {}", self.endpoint_name, method, payload["params"]),
        );

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(method, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus {
                endpoint: self.endpoint_name.clone(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(method, timeout, e))?;

        parse_rpc_body(&self.endpoint_name, body)
    }

    fn transport_error(&self, method: &str, timeout: Duration, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout {
                endpoint: self.endpoint_name.clone(),
                method: method.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            RpcError::InvalidResponse {
                endpoint: self.endpoint_name.clone(),
                reason: e.to_string(),
            }
        } else {
            RpcError::ConnectionFailed {
                endpoint: self.endpoint_name.clone(),
                reason: e.to_string(),
            }
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> RpcError {
        RpcError::InvalidResponse {
            endpoint: self.endpoint_name.clone(),
            reason: reason.into(),
        }
    }
}

/// Split a JSON-RPC envelope into its result or error
pub fn parse_rpc_body(endpoint: &str, body: Value) -> Result<Value, RpcError> {
    if let Some(err) = body.get("error") {
        return Err(RpcError::Rpc {
            endpoint: endpoint.to_string(),
            code: err.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
            message: err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    match body {
        Value::Object(mut map) => map.remove("result").ok_or_else(|| RpcError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: "missing result field".to_string(),
        }),
        _ => Err(RpcError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: "response is not an object".to_string(),
        }),
    }
}

/// Parse a `getSignaturesForAddress` result array
pub fn parse_signatures(endpoint: &str, result: &Value) -> Result<Vec<SignatureInfo>, RpcError> {
    let invalid = |reason: &str| RpcError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let items = result
        .as_array()
        .ok_or_else(|| invalid("expected signature array"))?;

    items
        .iter()
        .map(|item| {
            let signature = item
                .get("signature")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("missing signature field"))?;
            let slot = item
                .get("slot")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| invalid("missing slot field"))?;
            let err = item
                .get("err")
                .filter(|v| !v.is_null())
                .map(|v| v.to_string());

            Ok(SignatureInfo {
                signature: signature.to_string(),
                slot,
                err,
                block_time: item.get("blockTime").and_then(|v| v.as_i64()),
            })
        })
        .collect()
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    async fn get_health(&self) -> Result<(), RpcError> {
        let result = self
            .execute("getHealth", json!([]), self.timeouts.health)
            .await?;
        match result.as_str() {
            Some("ok") => Ok(()),
            _ => Err(self.invalid(format!("unhealthy: {}", result))),
        }
    }

    async fn list_signatures(
        &self,
        program: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let mut options = json!({
            "limit": limit,
            "commitment": self.commitment,
        });
        if let Some(before) = before {
            options["before"] = json!(before);
        }
        if let Some(until) = until {
            options["until"] = json!(until);
        }

        let result = self
            .execute(
                "getSignaturesForAddress",
                json!([program, options]),
                self.timeouts.signatures,
            )
            .await?;
        parse_signatures(&self.endpoint_name, &result)
    }

    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, RpcError> {
        let result = self
            .execute(
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "maxSupportedTransactionVersion": 0,
                    "commitment": self.commitment,
                }]),
                self.timeouts.transaction,
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }
        RawTransaction::from_json(signature, &result)
            .map(Some)
            .map_err(|reason| self.invalid(reason))
    }

    async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        let result = self
            .execute(
                "getBalance",
                json!([address, { "commitment": self.commitment }]),
                self.timeouts.balance,
            )
            .await?;
        result
            .get("value")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| self.invalid("missing balance value"))
    }
}

/// Builds [`HttpLedgerClient`]s for the connection manager
pub struct HttpConnector {
    timeouts: ClientTimeouts,
    commitment: String,
}

impl HttpConnector {
    pub fn new(timeouts: ClientTimeouts, commitment: &str) -> Self {
        Self {
            timeouts,
            commitment: commitment.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ClientTimeouts::from(config), &config.rpc.commitment)
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(
        &self,
        endpoint: &EndpointDescriptor,
    ) -> Result<Arc<dyn LedgerClient>, RpcError> {
        let client = HttpLedgerClient::new(endpoint, self.timeouts, &self.commitment)?;
        Ok(Arc::new(client))
    }
}
