use super::{window_start, Persistence, PersistenceResult, TokenVolume};
use crate::rpc::EndpointDescriptor;
use crate::transactions::TransferEvent;
use crate::wallets::{WalletCategory, WalletRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Non-durable store for `--dry-run` and tests
#[derive(Default)]
pub struct MemoryStore {
    transactions: RwLock<Vec<TransferEvent>>,
    wallets: RwLock<HashMap<(String, WalletCategory), WalletRecord>>,
    endpoints: RwLock<Vec<EndpointDescriptor>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.read().len()
    }

    /// Transaction and wallet writes issued so far, duplicates included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn newest_first(mut events: Vec<TransferEvent>) -> Vec<TransferEvent> {
        events.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        events
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn save_transaction(&self, event: &TransferEvent) -> PersistenceResult<bool> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut transactions = self.transactions.write();
        if transactions.iter().any(|e| e.signature == event.signature) {
            return Ok(false);
        }
        transactions.push(event.clone());
        Ok(true)
    }

    async fn save_wallet_record(&self, record: &WalletRecord) -> PersistenceResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let key = (record.address.clone(), record.category);
        let mut wallets = self.wallets.write();
        match wallets.get_mut(&key) {
            Some(existing) => {
                existing.transaction_count = record.transaction_count;
                existing.win_rate = record.win_rate;
                existing.updated_at = record.updated_at;
            }
            None => {
                wallets.insert(key, record.clone());
            }
        }
        Ok(())
    }

    async fn find_wallet(
        &self,
        address: &str,
        category: WalletCategory,
    ) -> PersistenceResult<Option<WalletRecord>> {
        Ok(self
            .wallets
            .read()
            .get(&(address.to_string(), category))
            .cloned())
    }

    async fn find_wallets_by_address(&self, address: &str) -> PersistenceResult<Vec<WalletRecord>> {
        let mut records: Vec<WalletRecord> = self
            .wallets
            .read()
            .values()
            .filter(|r| r.address == address)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn get_recent_transactions(
        &self,
        token_mint: &str,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>> {
        let since = window_start(window_minutes);
        let events = self
            .transactions
            .read()
            .iter()
            .filter(|e| e.token_mint == token_mint && e.observed_at >= since)
            .cloned()
            .collect();
        Ok(Self::newest_first(events))
    }

    async fn get_top_tokens_by_volume(
        &self,
        window_minutes: u64,
        limit: usize,
    ) -> PersistenceResult<Vec<TokenVolume>> {
        let since = window_start(window_minutes);
        let mut totals: HashMap<String, TokenVolume> = HashMap::new();
        for event in self.transactions.read().iter().filter(|e| e.observed_at >= since) {
            let entry = totals
                .entry(event.token_mint.clone())
                .or_insert_with(|| TokenVolume {
                    token_mint: event.token_mint.clone(),
                    volume: 0.0,
                    transfer_count: 0,
                });
            entry.volume += event.amount;
            entry.transfer_count += 1;
        }

        let mut volumes: Vec<TokenVolume> = totals.into_values().collect();
        volumes.sort_by(|a, b| b.volume.total_cmp(&a.volume));
        volumes.truncate(limit);
        Ok(volumes)
    }

    async fn get_whale_transactions(
        &self,
        min_amount: f64,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>> {
        let since = window_start(window_minutes);
        let events = self
            .transactions
            .read()
            .iter()
            .filter(|e| e.amount >= min_amount && e.observed_at >= since)
            .cloned()
            .collect();
        Ok(Self::newest_first(events))
    }

    async fn load_endpoints(&self) -> PersistenceResult<Vec<EndpointDescriptor>> {
        Ok(self.endpoints.read().clone())
    }

    async fn save_endpoints(&self, endpoints: &[EndpointDescriptor]) -> PersistenceResult<()> {
        let mut stored = self.endpoints.write();
        for endpoint in endpoints {
            match stored.iter_mut().find(|e| e.name == endpoint.name) {
                Some(existing) => *existing = endpoint.clone(),
                None => stored.push(endpoint.clone()),
            }
        }
        Ok(())
    }
}
