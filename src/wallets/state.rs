/// Process-lifetime classification state
///
/// Token counters only grow and are reset by restarting. Per-address locks
/// serialize the read-modify-write of a wallet's records.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle locks are pruned once the table grows past this
const LOCK_TABLE_PRUNE_AT: usize = 10_000;

#[derive(Default)]
pub struct WalletStateStore {
    token_counters: Mutex<HashMap<String, u64>>,
    address_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl WalletStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more transfer of `token_mint`, returning the new count
    pub fn increment_token(&self, token_mint: &str) -> u64 {
        let mut counters = self.token_counters.lock();
        let count = counters.entry(token_mint.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn token_count(&self, token_mint: &str) -> u64 {
        self.token_counters
            .lock()
            .get(token_mint)
            .copied()
            .unwrap_or(0)
    }

    /// Most active tokens, highest count first
    pub fn top_tokens(&self, limit: usize) -> Vec<(String, u64)> {
        let mut tokens: Vec<(String, u64)> = self
            .token_counters
            .lock()
            .iter()
            .map(|(mint, count)| (mint.clone(), *count))
            .collect();
        tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tokens.truncate(limit);
        tokens
    }

    /// Exclusive access to one address until the guard is dropped
    pub async fn lock_address(&self, address: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.address_locks.lock();
            if locks.len() >= LOCK_TABLE_PRUNE_AT {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry(address.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
