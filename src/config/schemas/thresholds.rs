use crate::config_struct;

config_struct! {
    /// Classification thresholds
    pub struct ThresholdsConfig {
        /// Transfers below this amount (token units) are ignored
        min_transaction_size: f64 = 10.0,

        /// Per-token transfer count that fires the trending signal
        min_transactions_for_trending: u64 = 50,

        /// Window used by recent-transaction queries
        monitoring_timeframe_minutes: u64 = 60,

        /// Native balance (SOL) at which an unknown sender becomes a whale
        smart_wallet_min_balance: f64 = 1000.0,
    }
}
