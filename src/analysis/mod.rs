//! Pattern analysis hooks
//!
//! The classifier asks a [`PatternAnalyzer`] about a token every time a known
//! whale moves it; any returned match becomes an alert. The default
//! [`PlaceholderAnalyzer`] never matches.

use crate::database::Persistence;
use crate::logger::{self, LogTag};
use crate::transactions::TransferEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    WhaleMovement,
    PumpAndDump,
    Accumulation,
}

impl PatternKind {
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::WhaleMovement => "Whale movement",
            PatternKind::PumpAndDump => "Pump and dump",
            PatternKind::Accumulation => "Accumulation",
        }
    }
}

/// A detected pattern and the transfers that triggered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub token_mint: String,
    pub transactions: Vec<TransferEvent>,
}

#[async_trait]
pub trait PatternAnalyzer: Send + Sync {
    async fn analyze_token(&self, token_mint: &str) -> Vec<PatternMatch>;
}

/// Never reports a pattern
pub struct PlaceholderAnalyzer;

#[async_trait]
impl PatternAnalyzer for PlaceholderAnalyzer {
    async fn analyze_token(&self, _token_mint: &str) -> Vec<PatternMatch> {
        Vec::new()
    }
}

/// Reports recent large transfers of the token from the persisted history
pub struct WhaleMovementAnalyzer {
    store: Arc<dyn Persistence>,
    window_minutes: u64,
    min_amount: f64,
}

impl WhaleMovementAnalyzer {
    pub fn new(store: Arc<dyn Persistence>, window_minutes: u64, min_amount: f64) -> Self {
        Self {
            store,
            window_minutes,
            min_amount,
        }
    }
}

#[async_trait]
impl PatternAnalyzer for WhaleMovementAnalyzer {
    async fn analyze_token(&self, token_mint: &str) -> Vec<PatternMatch> {
        let recent = match self
            .store
            .get_recent_transactions(token_mint, self.window_minutes)
            .await
        {
            Ok(recent) => recent,
            Err(e) => {
                logger::warning(
                    LogTag::Analysis,
                    &format!("Recent transfers for {} unavailable: {}", token_mint, e),
                );
                return Vec::new();
            }
        };

        let large: Vec<TransferEvent> = recent
            .into_iter()
            .filter(|e| e.amount >= self.min_amount)
            .collect();
        if large.is_empty() {
            return Vec::new();
        }

        vec![PatternMatch {
            kind: PatternKind::WhaleMovement,
            token_mint: token_mint.to_string(),
            transactions: large,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{contract, MemoryStore};

    #[tokio::test]
    async fn placeholder_never_matches() {
        assert!(PlaceholderAnalyzer.analyze_token("MintA").await.is_empty());
    }

    #[tokio::test]
    async fn whale_movement_reports_large_recent_transfers() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_transaction(&contract::event("s1", "MintA", 500.0, "W1"))
            .await
            .unwrap();
        store
            .save_transaction(&contract::event("s2", "MintA", 3.0, "W2"))
            .await
            .unwrap();

        let analyzer = WhaleMovementAnalyzer::new(store, 60, 100.0);
        let matches = analyzer.analyze_token("MintA").await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, PatternKind::WhaleMovement);
        assert_eq!(matches[0].transactions.len(), 1);
        assert_eq!(matches[0].transactions[0].signature, "s1");

        assert!(analyzer.analyze_token("MintB").await.is_empty());
    }
}
