//! Wallet classifier and token activity aggregation
//!
//! Every accepted transfer bumps its token counter. Transfers by known whales
//! are persisted and analysed; unknown senders are checked against the whale
//! balance threshold once and remembered from then on.

use super::state::WalletStateStore;
use super::types::{WalletCategory, WalletRecord};
use crate::analysis::PatternAnalyzer;
use crate::config::ThresholdsConfig;
use crate::database::Persistence;
use crate::logger::{self, LogTag};
use crate::notifications::{format_pattern_alert, NotificationSender};
use crate::rpc::{lamports_to_sol, LedgerClient};
use crate::transactions::TransferEvent;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Transfers strictly below this amount are ignored
    pub min_transaction_size: f64,
    /// Token count at which the trending signal fires
    pub min_transactions_for_trending: u64,
    /// Native balance (SOL) that makes an unknown sender a whale
    pub smart_wallet_min_balance: f64,
}

impl From<&ThresholdsConfig> for ClassifierConfig {
    fn from(thresholds: &ThresholdsConfig) -> Self {
        Self {
            min_transaction_size: thresholds.min_transaction_size,
            min_transactions_for_trending: thresholds.min_transactions_for_trending,
            smart_wallet_min_balance: thresholds.smart_wallet_min_balance,
        }
    }
}

/// What classifying one transfer did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub accepted: bool,
    /// Token counter after this transfer
    pub token_count: u64,
    /// This transfer made the token reach the trending threshold
    pub trending: bool,
    /// Sender was already a known whale
    pub known_whale: bool,
    /// Sender became a whale with this transfer
    pub whale_discovered: bool,
    pub alert_sent: bool,
}

pub struct WalletClassifier {
    config: ClassifierConfig,
    state: Arc<WalletStateStore>,
    store: Arc<dyn Persistence>,
    analyzer: Arc<dyn PatternAnalyzer>,
    notifier: Arc<dyn NotificationSender>,
}

impl WalletClassifier {
    pub fn new(
        config: ClassifierConfig,
        state: Arc<WalletStateStore>,
        store: Arc<dyn Persistence>,
        analyzer: Arc<dyn PatternAnalyzer>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            config,
            state,
            store,
            analyzer,
            notifier,
        }
    }

    pub fn state(&self) -> &Arc<WalletStateStore> {
        &self.state
    }

    /// Classify one transfer; `ledger` answers the whale balance lookup
    pub async fn classify(&self, event: &TransferEvent, ledger: &dyn LedgerClient) -> Classification {
        if event.amount < self.config.min_transaction_size {
            logger::debug(
                LogTag::Wallets,
                &format!(
                    "{} below minimum size ({} < {})",
                    event.signature, event.amount, self.config.min_transaction_size
                ),
            );
            return Classification::default();
        }

        let _guard = self.state.lock_address(&event.sender).await;
        let mut outcome = Classification {
            accepted: true,
            ..Classification::default()
        };

        let whale = match self
            .store
            .find_wallet(&event.sender, WalletCategory::Whale)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                logger::error(
                    LogTag::Wallets,
                    &format!("Whale lookup for {} failed: {}", event.sender, e),
                );
                None
            }
        };

        outcome.token_count = self.state.increment_token(&event.token_mint);
        if outcome.token_count == self.config.min_transactions_for_trending {
            outcome.trending = true;
            logger::info(
                LogTag::Wallets,
                &format!(
                    "🔥 Trending token {} ({} transfers)",
                    event.token_mint, outcome.token_count
                ),
            );
        }

        if let Some(record) = whale {
            outcome.known_whale = true;
            outcome.alert_sent = self.handle_whale_transfer(record, event).await;
        }
        outcome.whale_discovered = self
            .check_smart_wallet(event, ledger, outcome.known_whale)
            .await;

        outcome
    }

    /// Count, persist and analyse a transfer by a known whale
    async fn handle_whale_transfer(&self, mut record: WalletRecord, event: &TransferEvent) -> bool {
        record.record_transaction();
        if let Err(e) = self.store.save_wallet_record(&record).await {
            logger::error(
                LogTag::Database,
                &format!("Failed to update whale {}: {}", record.address, e),
            );
        }
        self.persist_event(event).await;

        logger::info(
            LogTag::Wallets,
            &format!(
                "🐋 Whale transfer: {} moved {:.2} of {} ({})",
                event.sender, event.amount, event.token_mint, event.signature
            ),
        );

        let matches = self.analyzer.analyze_token(&event.token_mint).await;
        if matches.is_empty() {
            return false;
        }
        self.notifier
            .send_alert(&format_pattern_alert(&matches))
            .await;
        true
    }

    /// Count the transfer on an existing record, or check whether an unknown
    /// sender qualifies as a whale; true when a whale was created
    ///
    /// `whale_counted` skips the whale record already updated for this transfer.
    async fn check_smart_wallet(
        &self,
        event: &TransferEvent,
        ledger: &dyn LedgerClient,
        whale_counted: bool,
    ) -> bool {
        let existing = match self.store.find_wallets_by_address(&event.sender).await {
            Ok(existing) => existing,
            Err(e) => {
                logger::error(
                    LogTag::Wallets,
                    &format!("Wallet lookup for {} failed: {}", event.sender, e),
                );
                return false;
            }
        };

        if !existing.is_empty() {
            let Some(mut record) = existing
                .into_iter()
                .find(|r| !(whale_counted && r.category == WalletCategory::Whale))
            else {
                return false;
            };
            record.record_transaction();
            if let Err(e) = self.store.save_wallet_record(&record).await {
                logger::error(
                    LogTag::Database,
                    &format!("Failed to update wallet {}: {}", record.address, e),
                );
            }
            return false;
        }

        let lamports = match ledger.get_balance(&event.sender).await {
            Ok(lamports) => lamports,
            Err(e) => {
                logger::warning(
                    LogTag::Wallets,
                    &format!("Balance lookup for {} failed: {}", event.sender, e),
                );
                return false;
            }
        };

        let balance_sol = lamports_to_sol(lamports);
        if balance_sol < self.config.smart_wallet_min_balance {
            return false;
        }

        let record = WalletRecord::new(&event.sender, WalletCategory::Whale);
        if let Err(e) = self.store.save_wallet_record(&record).await {
            logger::error(
                LogTag::Database,
                &format!("Failed to store new whale {}: {}", record.address, e),
            );
            return false;
        }

        logger::info(
            LogTag::Wallets,
            &format!(
                "New whale wallet: {} (balance {:.2} SOL)",
                event.sender, balance_sol
            ),
        );
        true
    }

    async fn persist_event(&self, event: &TransferEvent) {
        if let Err(e) = self.store.save_transaction(event).await {
            logger::error(
                LogTag::Database,
                &format!("Failed to store transaction {}: {}", event.signature, e),
            );
        }
    }
}
