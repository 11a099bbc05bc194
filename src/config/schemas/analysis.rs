use crate::config_struct;

config_struct! {
    /// Pattern analysis run when a known whale moves a token
    pub struct AnalysisConfig {
        /// Report recent large transfers as whale movements; off means no alerts
        detect_whale_movements: bool = false,

        /// Transfer amount counted as a whale movement
        min_whale_transaction: f64 = 1000.0,

        /// Look-back window for pattern queries
        time_window_minutes: u64 = 60,
    }
}
