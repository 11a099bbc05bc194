use crate::config::Config;
use crate::connectivity::HealthMonitor;
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Periodic endpoint probing
pub struct HealthMonitorService {
    monitor: Arc<HealthMonitor>,
    check_interval: Duration,
}

impl HealthMonitorService {
    pub fn new(monitor: Arc<HealthMonitor>, check_interval: Duration) -> Self {
        Self {
            monitor,
            check_interval,
        }
    }
}

#[async_trait]
impl Service for HealthMonitorService {
    fn name(&self) -> &'static str {
        "health_monitor"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.connectivity.enabled
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let monitor = self.monitor.clone();
        let handle = tokio::spawn(monitor.run(self.check_interval, shutdown));
        Ok(vec![handle])
    }

    async fn health(&self) -> ServiceHealth {
        let registry = self.monitor.registry();
        let active = registry.snapshot().iter().filter(|e| e.is_active).count();
        match active {
            0 => ServiceHealth::Unhealthy("no active endpoints".to_string()),
            n if n < registry.len() => {
                ServiceHealth::Degraded(format!("{}/{} endpoints active", n, registry.len()))
            }
            _ => ServiceHealth::Healthy,
        }
    }
}
