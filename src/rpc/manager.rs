//! Connection manager
//!
//! Owns the single live upstream connection. Fetchers read it through
//! [`ConnectionManager::current`]; [`ConnectionManager::failover`] takes the
//! write side, so no fetch starts while a switch is in progress.

use super::client::LedgerClient;
use super::registry::EndpointRegistry;
use super::types::EndpointDescriptor;
use crate::errors::RpcError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Builds a client for an endpoint, the seam tests use to inject mocks
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &EndpointDescriptor,
    ) -> Result<Arc<dyn LedgerClient>, RpcError>;
}

/// The live connection; `generation` increases on every switch
#[derive(Clone)]
pub struct Connection {
    pub endpoint: EndpointDescriptor,
    pub client: Arc<dyn LedgerClient>,
    pub generation: u64,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint.name)
            .field("generation", &self.generation)
            .finish()
    }
}

pub struct ConnectionManager {
    registry: Arc<EndpointRegistry>,
    connector: Arc<dyn Connector>,
    current: RwLock<Connection>,
    failovers: AtomicU64,
}

impl ConnectionManager {
    /// Connect to the best reachable endpoint
    ///
    /// When no endpoint answers the liveness probe the most preferred one is
    /// installed anyway; the first failing batch will trigger a failover.
    pub async fn connect(
        registry: Arc<EndpointRegistry>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, RpcError> {
        let (endpoint, client) = match establish(&registry, connector.as_ref(), None).await {
            Ok(found) => found,
            Err(RpcError::AllEndpointsFailed { attempted }) => {
                let endpoint = registry.best().ok_or(RpcError::NoEndpoints)?;
                logger::warning(
                    LogTag::Rpc,
                    &format!(
                        "No endpoint passed the liveness probe ({} attempted), starting with {}",
                        attempted, endpoint.name
                    ),
                );
                let client = connector.connect(&endpoint).await?;
                (endpoint, client)
            }
            Err(e) => return Err(e),
        };

        logger::info(
            LogTag::Rpc,
            &format!("Connected to {} ({})", endpoint.name, endpoint.http_url),
        );

        Ok(Self {
            registry,
            connector,
            current: RwLock::new(Connection {
                endpoint,
                client,
                generation: 0,
            }),
            failovers: AtomicU64::new(0),
        })
    }

    /// Snapshot of the live connection
    pub async fn current(&self) -> Connection {
        self.current.read().await.clone()
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// Number of successful switches since startup
    pub fn failover_count(&self) -> u64 {
        self.failovers.load(Ordering::Relaxed)
    }

    /// Replace the connection observed at `observed_generation`
    ///
    /// If the generation already moved on, another caller switched first and
    /// the current connection is returned unchanged. On exhaustion the
    /// previous connection stays installed.
    pub async fn failover(&self, observed_generation: u64) -> Result<Connection, RpcError> {
        let mut current = self.current.write().await;
        if current.generation != observed_generation {
            logger::debug(
                LogTag::Connectivity,
                &format!(
                    "Failover for generation {} already handled, now on {}",
                    observed_generation, current.endpoint.name
                ),
            );
            return Ok(current.clone());
        }

        let failed = current.endpoint.name.clone();
        logger::warning(
            LogTag::Connectivity,
            &format!("Failing over from {}", failed),
        );

        match establish(&self.registry, self.connector.as_ref(), Some(&failed)).await {
            Ok((endpoint, client)) => {
                *current = Connection {
                    endpoint,
                    client,
                    generation: current.generation + 1,
                };
                self.failovers.fetch_add(1, Ordering::Relaxed);
                logger::info(
                    LogTag::Connectivity,
                    &format!(
                        "Switched from {} to {} (generation {})",
                        failed, current.endpoint.name, current.generation
                    ),
                );
                Ok(current.clone())
            }
            Err(e) => {
                logger::error(
                    LogTag::Connectivity,
                    &format!("Failover from {} failed: {}", failed, e),
                );
                Err(e)
            }
        }
    }
}

/// Walk the failover candidates and return the first one that answers a probe
async fn establish(
    registry: &EndpointRegistry,
    connector: &dyn Connector,
    exclude: Option<&str>,
) -> Result<(EndpointDescriptor, Arc<dyn LedgerClient>), RpcError> {
    let candidates = registry.failover_candidates(exclude);
    if candidates.is_empty() {
        return Err(RpcError::NoEndpoints);
    }
    let attempted = candidates.len();

    for endpoint in candidates {
        let client = match connector.connect(&endpoint).await {
            Ok(client) => client,
            Err(e) => {
                logger::warning(
                    LogTag::Connectivity,
                    &format!("Cannot connect to {}: {}", endpoint.name, e),
                );
                continue;
            }
        };

        let start = Instant::now();
        match client.get_health().await {
            Ok(()) => {
                logger::debug(
                    LogTag::Connectivity,
                    &format!(
                        "{} reachable in {}ms",
                        endpoint.name,
                        start.elapsed().as_millis()
                    ),
                );
                return Ok((endpoint, client));
            }
            Err(e) => {
                logger::warning(
                    LogTag::Connectivity,
                    &format!("{} failed liveness probe: {}", endpoint.name, e),
                );
            }
        }
    }

    Err(RpcError::AllEndpointsFailed { attempted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnector, MockLedgerClient};

    fn registry(entries: &[(&str, i32)]) -> Arc<EndpointRegistry> {
        Arc::new(EndpointRegistry::new(
            entries
                .iter()
                .map(|(name, priority)| {
                    EndpointDescriptor::new(name, &format!("https://{}", name), "", *priority)
                })
                .collect(),
        ))
    }

    fn connector(names: &[&str]) -> (Arc<MockConnector>, Vec<Arc<MockLedgerClient>>) {
        let connector = Arc::new(MockConnector::new());
        let clients = names
            .iter()
            .map(|name| {
                let client = Arc::new(MockLedgerClient::new(name));
                connector.register(client.clone());
                client
            })
            .collect();
        (connector, clients)
    }

    #[tokio::test]
    async fn connects_to_most_preferred_healthy_endpoint() {
        let registry = registry(&[("backup", 2), ("primary", 1)]);
        let (connector, clients) = connector(&["backup", "primary"]);
        clients[1].set_healthy(false);

        let manager = ConnectionManager::connect(registry, connector).await.unwrap();
        let current = manager.current().await;
        assert_eq!(current.endpoint.name, "backup");
        assert_eq!(current.generation, 0);
    }

    #[tokio::test]
    async fn failover_selects_second_when_first_inactive() {
        let registry = registry(&[("first", 1), ("second", 1), ("third", 2)]);
        let (connector, _clients) = connector(&["first", "second", "third"]);
        let manager = ConnectionManager::connect(registry.clone(), connector)
            .await
            .unwrap();
        assert_eq!(manager.current().await.endpoint.name, "first");

        registry.record_result("first", false, 3000);
        let switched = manager.failover(0).await.unwrap();
        assert_eq!(switched.endpoint.name, "second");
        assert_eq!(switched.generation, 1);
        assert_eq!(manager.failover_count(), 1);
    }

    #[tokio::test]
    async fn failover_is_idempotent_per_generation() {
        let registry = registry(&[("a", 1), ("b", 1), ("c", 2)]);
        let (connector, _clients) = connector(&["a", "b", "c"]);
        let manager = Arc::new(ConnectionManager::connect(registry, connector).await.unwrap());

        let first = manager.clone();
        let second = manager.clone();
        let (r1, r2) = tokio::join!(first.failover(0), second.failover(0));

        assert_eq!(r1.unwrap().generation, 1);
        assert_eq!(r2.unwrap().generation, 1);
        assert_eq!(manager.failover_count(), 1);
        assert_eq!(manager.current().await.endpoint.name, "b");
    }

    #[tokio::test]
    async fn exhausted_failover_keeps_previous_connection() {
        let registry = registry(&[("a", 1), ("b", 2), ("c", 3)]);
        let (connector, clients) = connector(&["a", "b", "c"]);
        let manager = ConnectionManager::connect(registry, connector).await.unwrap();

        clients[1].set_healthy(false);
        clients[2].set_healthy(false);
        let err = manager.failover(0).await.unwrap_err();
        assert_eq!(err, RpcError::AllEndpointsFailed { attempted: 2 });

        let current = manager.current().await;
        assert_eq!(current.endpoint.name, "a");
        assert_eq!(current.generation, 0);
    }

    #[tokio::test]
    async fn unreachable_endpoints_still_yield_a_connection() {
        let registry = registry(&[("a", 1), ("b", 2)]);
        let (connector, clients) = connector(&["a", "b"]);
        for client in &clients {
            client.set_healthy(false);
        }

        let manager = ConnectionManager::connect(registry, connector).await.unwrap();
        assert_eq!(manager.current().await.endpoint.name, "a");
    }

    #[tokio::test]
    async fn empty_registry_is_an_error() {
        let (connector, _) = connector(&[]);
        let result = ConnectionManager::connect(registry(&[]), connector).await;
        assert!(matches!(result, Err(RpcError::NoEndpoints)));
    }
}
