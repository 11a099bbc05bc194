use crate::config::EndpointConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Success rate is a 0..=100 score
pub const MAX_SUCCESS_RATE: u8 = 100;
const SUCCESS_STEP: u8 = 1;
const FAILURE_STEP: u8 = 5;

/// An upstream endpoint and its last known health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub name: String,
    pub http_url: String,
    pub ws_url: String,
    /// Failover tier, lower is preferred
    pub priority: i32,
    pub last_latency_ms: u64,
    pub success_rate: u8,
    pub is_active: bool,
    pub last_checked_at: DateTime<Utc>,
}

impl EndpointDescriptor {
    pub fn new(name: &str, http_url: &str, ws_url: &str, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            http_url: http_url.to_string(),
            ws_url: ws_url.to_string(),
            priority,
            last_latency_ms: 0,
            success_rate: MAX_SUCCESS_RATE,
            is_active: true,
            last_checked_at: Utc::now(),
        }
    }

    /// Apply one probe outcome: +1 when healthy, -5 when not, clamped to 0..=100
    pub fn record_result(&mut self, healthy: bool, latency_ms: u64) {
        self.success_rate = if healthy {
            self.success_rate
                .saturating_add(SUCCESS_STEP)
                .min(MAX_SUCCESS_RATE)
        } else {
            self.success_rate.saturating_sub(FAILURE_STEP)
        };
        self.last_latency_ms = latency_ms;
        self.is_active = healthy;
        self.last_checked_at = Utc::now();
    }
}

impl From<&EndpointConfig> for EndpointDescriptor {
    fn from(config: &EndpointConfig) -> Self {
        Self::new(&config.name, &config.http_url, &config.ws_url, config.priority)
    }
}

/// Entry of a `getSignaturesForAddress` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Error if the transaction failed, None if successful
    pub err: Option<String>,
    pub block_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_moves_and_clamps() {
        let mut endpoint = EndpointDescriptor::new("A", "https://a", "wss://a", 1);
        endpoint.record_result(true, 40);
        assert_eq!(endpoint.success_rate, 100);

        endpoint.record_result(false, 3000);
        assert_eq!(endpoint.success_rate, 95);
        assert!(!endpoint.is_active);
        assert_eq!(endpoint.last_latency_ms, 3000);

        endpoint.success_rate = 3;
        endpoint.record_result(false, 3000);
        assert_eq!(endpoint.success_rate, 0);

        endpoint.record_result(true, 20);
        assert_eq!(endpoint.success_rate, 1);
        assert!(endpoint.is_active);
    }
}
