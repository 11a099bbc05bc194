/// Durable storage for transfers, wallet classifications and the endpoint registry
///
/// The pipeline only sees the [`Persistence`] trait. [`SqliteStore`] is the
/// production store, [`MemoryStore`] backs tests and `--dry-run`.
mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::PersistenceError;
use crate::rpc::EndpointDescriptor;
use crate::transactions::TransferEvent;
use crate::wallets::{WalletCategory, WalletRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Aggregated transfer volume of one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenVolume {
    pub token_mint: String,
    pub volume: f64,
    pub transfer_count: u64,
}

#[async_trait]
pub trait Persistence: Send + Sync {
    /// Store a transfer; returns false when the signature was already stored
    async fn save_transaction(&self, event: &TransferEvent) -> PersistenceResult<bool>;

    /// Insert or update the record keyed by `(address, category)`
    async fn save_wallet_record(&self, record: &WalletRecord) -> PersistenceResult<()>;

    async fn find_wallet(
        &self,
        address: &str,
        category: WalletCategory,
    ) -> PersistenceResult<Option<WalletRecord>>;

    /// Records of every category for an address
    async fn find_wallets_by_address(&self, address: &str) -> PersistenceResult<Vec<WalletRecord>>;

    /// Transfers of `token_mint` observed within the window, newest first
    async fn get_recent_transactions(
        &self,
        token_mint: &str,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>>;

    /// Tokens ranked by summed transfer amount within the window
    async fn get_top_tokens_by_volume(
        &self,
        window_minutes: u64,
        limit: usize,
    ) -> PersistenceResult<Vec<TokenVolume>>;

    /// Transfers of at least `min_amount` within the window, newest first
    async fn get_whale_transactions(
        &self,
        min_amount: f64,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>>;

    async fn load_endpoints(&self) -> PersistenceResult<Vec<EndpointDescriptor>>;

    /// Replace the stored registry snapshot
    async fn save_endpoints(&self, endpoints: &[EndpointDescriptor]) -> PersistenceResult<()>;
}

/// Start of a look-back window ending now
pub fn window_start(window_minutes: u64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(window_minutes.min(i64::MAX as u64) as i64)
}

/// Checks shared by both stores' tests
#[cfg(test)]
pub(crate) mod contract {
    use super::*;

    pub fn event(signature: &str, mint: &str, amount: f64, sender: &str) -> TransferEvent {
        TransferEvent {
            signature: signature.to_string(),
            token_mint: mint.to_string(),
            token_name: None,
            amount,
            raw_amount: (amount * 1_000_000.0) as u64,
            decimals: 6,
            sender: sender.to_string(),
            observed_at: Utc::now(),
        }
    }

    /// Behaviour every `Persistence` implementation must share
    pub async fn exercise(store: &dyn Persistence) {
        // duplicate signatures are ignored
        assert!(store.save_transaction(&event("s1", "MintA", 50.0, "W1")).await.unwrap());
        assert!(!store.save_transaction(&event("s1", "MintA", 50.0, "W1")).await.unwrap());
        store.save_transaction(&event("s2", "MintA", 5.0, "W2")).await.unwrap();
        store.save_transaction(&event("s3", "MintB", 500.0, "W1")).await.unwrap();

        let mut old = event("s0", "MintA", 900.0, "W3");
        old.observed_at = Utc::now() - Duration::minutes(120);
        store.save_transaction(&old).await.unwrap();

        let recent = store.get_recent_transactions("MintA", 60).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|e| e.token_mint == "MintA"));

        let top = store.get_top_tokens_by_volume(60, 10).await.unwrap();
        assert_eq!(top[0].token_mint, "MintB");
        assert_eq!(top[1].token_mint, "MintA");
        assert_eq!(top[1].volume, 55.0);
        assert_eq!(top[1].transfer_count, 2);
        assert_eq!(store.get_top_tokens_by_volume(60, 1).await.unwrap().len(), 1);

        let whales = store.get_whale_transactions(50.0, 60).await.unwrap();
        let mut signatures: Vec<&str> = whales.iter().map(|e| e.signature.as_str()).collect();
        signatures.sort();
        assert_eq!(signatures, vec!["s1", "s3"]);

        // wallet records are unique per (address, category)
        let mut whale = WalletRecord::new("W1", WalletCategory::Whale);
        store.save_wallet_record(&whale).await.unwrap();
        whale.record_transaction();
        store.save_wallet_record(&whale).await.unwrap();
        store
            .save_wallet_record(&WalletRecord::new("W1", WalletCategory::Bot))
            .await
            .unwrap();

        let found = store
            .find_wallet("W1", WalletCategory::Whale)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.transaction_count, 2);
        assert_eq!(store.find_wallets_by_address("W1").await.unwrap().len(), 2);
        assert!(store
            .find_wallet("W2", WalletCategory::Whale)
            .await
            .unwrap()
            .is_none());

        // endpoint snapshots replace each other
        let mut endpoint = EndpointDescriptor::new("Ankr", "https://rpc.ankr.com/solana", "", 2);
        store.save_endpoints(&[endpoint.clone()]).await.unwrap();
        endpoint.record_result(false, 3000);
        store.save_endpoints(&[endpoint.clone()]).await.unwrap();
        let loaded = store.load_endpoints().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].success_rate, 95);
        assert!(!loaded[0].is_active);
        assert_eq!(loaded[0].priority, 2);
    }
}
