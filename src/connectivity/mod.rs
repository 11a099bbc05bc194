//! Endpoint health monitoring
//!
//! An independent task probes every registered endpoint on a fixed interval
//! and records the outcome in the [`EndpointRegistry`](crate::rpc::EndpointRegistry).

pub mod monitor;
pub mod service;
pub mod types;

pub use monitor::{EndpointProbe, RpcHealthProbe};
pub use service::HealthMonitor;
pub use types::{HealthCheckResult, HealthTransition, SLOW_PROBE_MS};
