// Config schema submodules, one per section of config.toml

use crate::config_struct;

mod analysis;
mod connectivity;
mod monitor;
mod notifications;
mod rpc;
mod thresholds;

pub use analysis::*;
pub use connectivity::*;
pub use monitor::*;
pub use notifications::*;
pub use rpc::*;
pub use thresholds::*;

config_struct! {
    /// SQLite storage settings
    pub struct DatabaseConfig {
        /// Database file, empty means `<data dir>/whalewatch.db`
        path: String = String::new(),

        /// Load and save the endpoint registry through the database
        persist_endpoints: bool = true,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),

        monitor: MonitorConfig = MonitorConfig::default(),

        thresholds: ThresholdsConfig = ThresholdsConfig::default(),

        analysis: AnalysisConfig = AnalysisConfig::default(),

        connectivity: ConnectivityConfig = ConnectivityConfig::default(),

        notifications: NotificationsConfig = NotificationsConfig::default(),

        database: DatabaseConfig = DatabaseConfig::default(),
    }
}
