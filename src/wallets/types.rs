use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioural class of a tracked wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletCategory {
    Whale,
    Arbitrage,
    Bot,
    #[serde(rename = "early")]
    EarlyInvestor,
    Developer,
}

impl WalletCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletCategory::Whale => "whale",
            WalletCategory::Arbitrage => "arbitrage",
            WalletCategory::Bot => "bot",
            WalletCategory::EarlyInvestor => "early",
            WalletCategory::Developer => "developer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "whale" => Some(WalletCategory::Whale),
            "arbitrage" => Some(WalletCategory::Arbitrage),
            "bot" => Some(WalletCategory::Bot),
            "early" => Some(WalletCategory::EarlyInvestor),
            "developer" => Some(WalletCategory::Developer),
            _ => None,
        }
    }
}

impl fmt::Display for WalletCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification state of one `(address, category)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: String,
    pub category: WalletCategory,
    pub transaction_count: u64,
    /// 0..=100
    pub win_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletRecord {
    /// Fresh record for a wallet seen for the first time
    pub fn new(address: &str, category: WalletCategory) -> Self {
        let now = Utc::now();
        Self {
            address: address.to_string(),
            category,
            transaction_count: 1,
            win_rate: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_transaction(&mut self) {
        self.transaction_count += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_round_trip() {
        for category in [
            WalletCategory::Whale,
            WalletCategory::Arbitrage,
            WalletCategory::Bot,
            WalletCategory::EarlyInvestor,
            WalletCategory::Developer,
        ] {
            assert_eq!(WalletCategory::from_str(category.as_str()), Some(category));
        }
        assert_eq!(WalletCategory::from_str("shark"), None);
        assert_eq!(
            serde_json::to_string(&WalletCategory::EarlyInvestor).unwrap(),
            "\"early\""
        );
    }

    #[test]
    fn new_record_starts_at_one() {
        let mut record = WalletRecord::new("W1", WalletCategory::Whale);
        assert_eq!(record.transaction_count, 1);
        assert_eq!(record.win_rate, 0.0);
        record.record_transaction();
        assert_eq!(record.transaction_count, 2);
        assert!(record.updated_at >= record.created_at);
    }
}
