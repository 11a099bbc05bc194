use super::monitor::EndpointProbe;
use super::types::{HealthCheckResult, HealthTransition};
use crate::database::Persistence;
use crate::logger::{self, LogTag};
use crate::rpc::EndpointRegistry;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Periodically probes every registered endpoint
///
/// Results only feed the registry (and its persisted snapshot); the live
/// connection is never touched from here, failover picks the new state up on
/// its next walk.
pub struct HealthMonitor {
    registry: Arc<EndpointRegistry>,
    probe: Arc<dyn EndpointProbe>,
    store: Option<Arc<dyn Persistence>>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<EndpointRegistry>, probe: Arc<dyn EndpointProbe>) -> Self {
        Self {
            registry,
            probe,
            store: None,
        }
    }

    /// Save the registry after every round
    pub fn with_persistence(mut self, store: Arc<dyn Persistence>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// Probe all endpoints concurrently and record the results
    pub async fn check_all(&self) -> Vec<(String, HealthCheckResult)> {
        let endpoints = self.registry.snapshot();
        let results = join_all(endpoints.iter().map(|e| self.probe.probe(e))).await;

        let mut report = Vec::with_capacity(endpoints.len());
        for (endpoint, result) in endpoints.into_iter().zip(results) {
            self.registry
                .record_result(&endpoint.name, result.healthy, result.latency_ms);
            log_result(&endpoint.name, endpoint.is_active, &result);
            report.push((endpoint.name, result));
        }

        if let Some(store) = &self.store {
            let store = store.clone();
            let snapshot = self.registry.snapshot();
            tokio::spawn(async move {
                if let Err(e) = store.save_endpoints(&snapshot).await {
                    logger::warning(
                        LogTag::Connectivity,
                        &format!("Failed to persist endpoint registry: {}", e),
                    );
                }
            });
        }

        let healthy = report.iter().filter(|(_, r)| r.healthy).count();
        logger::debug(
            LogTag::Connectivity,
            &format!("Health check round: {}/{} endpoints healthy", healthy, report.len()),
        );
        report
    }

    /// Check on a fixed interval until shutdown; the first round runs immediately
    pub async fn run(self: Arc<Self>, check_interval: Duration, shutdown: Arc<Notify>) {
        let mut timer = interval(check_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown_signal = shutdown.notified();
        tokio::pin!(shutdown_signal);
        shutdown_signal.as_mut().enable();

        logger::info(
            LogTag::Connectivity,
            &format!(
                "Starting endpoint health checks (interval={}s, endpoints={})",
                check_interval.as_secs(),
                self.registry.len()
            ),
        );

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    logger::info(LogTag::Connectivity, "Endpoint health checks shutting down");
                    break;
                }
                _ = timer.tick() => {
                    self.check_all().await;
                }
            }
        }
    }
}

fn log_result(name: &str, was_active: bool, result: &HealthCheckResult) {
    let reason = result.error.as_deref().unwrap_or("unknown");
    match HealthTransition::between(was_active, result.healthy) {
        HealthTransition::Lost => logger::warning(
            LogTag::Connectivity,
            &format!("{} endpoint unhealthy: {}", name, reason),
        ),
        HealthTransition::Recovered => logger::info(
            LogTag::Connectivity,
            &format!("{} endpoint recovered (latency={}ms)", name, result.latency_ms),
        ),
        HealthTransition::Unchanged if result.is_degraded() => logger::debug(
            LogTag::Connectivity,
            &format!("{} endpoint degraded: {}", name, reason),
        ),
        HealthTransition::Unchanged => logger::verbose(
            LogTag::Connectivity,
            &format!(
                "{} endpoint {} (latency={}ms)",
                name,
                if result.healthy { "healthy" } else { "still unhealthy" },
                result.latency_ms
            ),
        ),
    }
}
