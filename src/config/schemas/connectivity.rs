use crate::config_struct;

// ============================================================================
// CONNECTIVITY MONITORING CONFIGURATION
// ============================================================================

config_struct! {
    /// Endpoint health monitoring configuration
    pub struct ConnectivityConfig {
        /// Enable periodic endpoint probing
        enabled: bool = true,

        /// Health check interval in seconds
        check_interval_secs: u64 = 300,

        /// Timeout for a single getHealth probe in seconds
        health_check_timeout_secs: u64 = 3,
    }
}
