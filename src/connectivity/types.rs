use serde::{Deserialize, Serialize};

/// Probes slower than this still count as healthy but are reported as degraded
pub const SLOW_PROBE_MS: u64 = 1_500;

/// Outcome of one endpoint probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl HealthCheckResult {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            healthy: true,
            latency_ms,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            healthy: false,
            latency_ms: 0,
            error: Some(error),
        }
    }

    pub fn degraded(latency_ms: u64, reason: String) -> Self {
        Self {
            healthy: true,
            latency_ms,
            error: Some(reason),
        }
    }

    /// Healthy answer, degraded when slower than [`SLOW_PROBE_MS`]
    pub fn from_latency(latency_ms: u64) -> Self {
        if latency_ms > SLOW_PROBE_MS {
            Self::degraded(latency_ms, format!("slow response ({}ms)", latency_ms))
        } else {
            Self::success(latency_ms)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.healthy && self.error.is_some()
    }
}

/// Health state change observed by one check round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    Unchanged,
    Recovered,
    Lost,
}

impl HealthTransition {
    pub fn between(was_active: bool, healthy: bool) -> Self {
        match (was_active, healthy) {
            (false, true) => HealthTransition::Recovered,
            (true, false) => HealthTransition::Lost,
            _ => HealthTransition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_probe_is_degraded_but_healthy() {
        let fast = HealthCheckResult::from_latency(120);
        assert!(fast.healthy && !fast.is_degraded());

        let slow = HealthCheckResult::from_latency(SLOW_PROBE_MS + 1);
        assert!(slow.healthy);
        assert!(slow.is_degraded());

        assert!(!HealthCheckResult::failure("timeout".to_string()).healthy);
    }

    #[test]
    fn transitions() {
        assert_eq!(HealthTransition::between(true, false), HealthTransition::Lost);
        assert_eq!(HealthTransition::between(false, true), HealthTransition::Recovered);
        assert_eq!(HealthTransition::between(true, true), HealthTransition::Unchanged);
    }
}
