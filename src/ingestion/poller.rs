//! Cursor-based signature poller
//!
//! Each tick walks the monitored programs: anchor a missing cursor, fetch the
//! signatures newer than it, advance the cursor, then fetch, normalize and
//! classify every transaction oldest first. The cursor moves before
//! processing, so a transfer is handled at most once.

use super::cursor::IngestionCursor;
use super::scheduler::Ticker;
use crate::config::Config;
use crate::errors::RpcError;
use crate::logger::{self, LogTag};
use crate::rpc::{Connection, ConnectionManager, SignatureInfo};
use crate::transactions::{normalize, NormalizerConfig};
use crate::wallets::WalletClassifier;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Upper bound on `getSignaturesForAddress` pages fetched for one program per tick
const MAX_PAGES_PER_TICK: usize = 20;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Program addresses, polled in this order
    pub programs: Vec<String>,
    pub batch_size: usize,
    pub normalizer: NormalizerConfig,
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            programs: config
                .monitor
                .programs
                .iter()
                .map(|p| p.address.clone())
                .collect(),
            batch_size: config.rpc.batch_size,
            normalizer: NormalizerConfig::from(&config.monitor),
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub anchored: usize,
    pub signatures: usize,
    pub transfers: usize,
    pub skipped: usize,
    pub failed_over: bool,
}

pub struct Poller {
    config: PollerConfig,
    connections: Arc<ConnectionManager>,
    classifier: Arc<WalletClassifier>,
    cursors: Mutex<HashMap<String, IngestionCursor>>,
    ticks: AtomicU64,
    transfers: AtomicU64,
}

impl Poller {
    pub fn new(
        config: PollerConfig,
        connections: Arc<ConnectionManager>,
        classifier: Arc<WalletClassifier>,
    ) -> Self {
        Self {
            config,
            connections,
            classifier,
            cursors: Mutex::new(HashMap::new()),
            ticks: AtomicU64::new(0),
            transfers: AtomicU64::new(0),
        }
    }

    pub fn cursor(&self, program: &str) -> Option<IngestionCursor> {
        self.cursors.lock().get(program).cloned()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn transfer_count(&self) -> u64 {
        self.transfers.load(Ordering::Relaxed)
    }

    /// Poll until the ticker closes or shutdown is signalled
    ///
    /// Shutdown is only observed between ticks; a batch in progress finishes.
    pub async fn run(self: Arc<Self>, mut ticker: Box<dyn Ticker>, shutdown: Arc<Notify>) {
        let shutdown_signal = shutdown.notified();
        tokio::pin!(shutdown_signal);
        shutdown_signal.as_mut().enable();

        logger::info(
            LogTag::Ingestion,
            &format!(
                "Poller started ({} programs, batch size {})",
                self.config.programs.len(),
                self.config.batch_size
            ),
        );

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                more = ticker.tick() => {
                    if !more {
                        break;
                    }
                    self.tick_once().await;
                }
            }
        }

        logger::info(
            LogTag::Ingestion,
            &format!(
                "Poller stopped after {} ticks, {} transfers",
                self.tick_count(),
                self.transfer_count()
            ),
        );
    }

    /// Run one poll over every monitored program
    pub async fn tick_once(&self) -> TickReport {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let connection = self.connections.current().await;
        let mut report = TickReport::default();

        for program in &self.config.programs {
            if let Err(e) = self.poll_program(&connection, program, &mut report).await {
                logger::warning(
                    LogTag::Ingestion,
                    &format!(
                        "Signature fetch for {} on {} failed: {}",
                        program, connection.endpoint.name, e
                    ),
                );
                report.failed_over = self.fail_over(&connection).await;
                break;
            }
        }

        if report.signatures > 0 {
            logger::info(
                LogTag::Ingestion,
                &format!(
                    "Tick processed {} signatures, {} transfers, {} skipped",
                    report.signatures, report.transfers, report.skipped
                ),
            );
        }
        report
    }

    async fn poll_program(
        &self,
        connection: &Connection,
        program: &str,
        report: &mut TickReport,
    ) -> Result<(), RpcError> {
        let Some(cursor) = self.cursor(program) else {
            if self.anchor(connection, program).await? {
                report.anchored += 1;
            }
            return Ok(());
        };

        let mut batch = self
            .signatures_since(connection, program, &cursor.signature)
            .await?;
        if batch.is_empty() {
            return Ok(());
        }
        batch.reverse();

        if let Some(newest) = batch.last() {
            if let Some(cursor) = self.cursors.lock().get_mut(program) {
                cursor.advance(newest);
            }
        }

        logger::debug(
            LogTag::Ingestion,
            &format!("{} new signatures for {}", batch.len(), program),
        );

        for info in &batch {
            report.signatures += 1;
            if info.err.is_some() {
                report.skipped += 1;
                continue;
            }
            if self.process_signature(connection, &info.signature).await {
                report.transfers += 1;
            } else {
                report.skipped += 1;
            }
        }
        Ok(())
    }

    /// Every signature newer than `cursor`, newest first
    ///
    /// Pages back with `before` while pages come back full, so a backlog
    /// larger than one batch is not skipped.
    async fn signatures_since(
        &self,
        connection: &Connection,
        program: &str,
        cursor: &str,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let mut signatures: Vec<SignatureInfo> = Vec::new();

        for page in 0..MAX_PAGES_PER_TICK {
            let before = signatures.last().map(|s| s.signature.clone());
            let batch = connection
                .client
                .list_signatures(
                    program,
                    before.as_deref(),
                    Some(cursor),
                    self.config.batch_size,
                )
                .await?;
            let full = batch.len() >= self.config.batch_size;
            signatures.extend(batch);

            if !full {
                return Ok(signatures);
            }
            if page > 0 {
                logger::debug(
                    LogTag::Ingestion,
                    &format!(
                        "Paging {} backlog ({} signatures so far)",
                        program,
                        signatures.len()
                    ),
                );
            }
        }

        logger::warning(
            LogTag::Ingestion,
            &format!(
                "Backlog for {} exceeds {} pages, older signatures after {} are skipped",
                program, MAX_PAGES_PER_TICK, cursor
            ),
        );
        Ok(signatures)
    }

    /// Point the cursor at the latest signature without processing anything
    async fn anchor(&self, connection: &Connection, program: &str) -> Result<bool, RpcError> {
        let latest = connection
            .client
            .list_signatures(program, None, None, 1)
            .await?;
        let Some(latest) = latest.first() else {
            logger::debug(
                LogTag::Ingestion,
                &format!("No signatures yet for {}, cursor stays empty", program),
            );
            return Ok(false);
        };

        self.cursors
            .lock()
            .insert(program.to_string(), IngestionCursor::anchored_at(latest));
        logger::debug(
            LogTag::Ingestion,
            &format!("Anchored {} at {} (slot {})", program, latest.signature, latest.slot),
        );
        Ok(true)
    }

    /// True when the signature produced a classified transfer
    async fn process_signature(&self, connection: &Connection, signature: &str) -> bool {
        let tx = match connection.client.get_parsed_transaction(signature).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                logger::debug(
                    LogTag::Ingestion,
                    &format!("Transaction {} not available yet", signature),
                );
                return false;
            }
            Err(e) => {
                logger::warning(
                    LogTag::Ingestion,
                    &format!("Failed to fetch transaction {}: {}", signature, e),
                );
                return false;
            }
        };

        if tx.is_failed() {
            return false;
        }

        let Some(event) = normalize(&tx, &self.config.normalizer) else {
            logger::verbose(
                LogTag::Transactions,
                &format!("{} carries no token transfer", signature),
            );
            return false;
        };

        logger::debug(
            LogTag::Transactions,
            &format!(
                "Transfer {}: {} of {} from {}",
                event.signature, event.amount, event.token_mint, event.sender
            ),
        );

        self.transfers.fetch_add(1, Ordering::Relaxed);
        self.classifier
            .classify(&event, connection.client.as_ref())
            .await;
        true
    }

    /// Switch endpoints after a batch failure; true when the connection changed
    async fn fail_over(&self, failed: &Connection) -> bool {
        match self.connections.failover(failed.generation).await {
            Ok(next) if next.generation != failed.generation => {
                self.reanchor(&next).await;
                true
            }
            Ok(_) => false,
            Err(e) => {
                logger::error(
                    LogTag::Ingestion,
                    &format!("Failover exhausted, retrying next tick: {}", e),
                );
                false
            }
        }
    }

    /// Re-anchor every cursor against a new connection
    ///
    /// A program whose anchor fails loses its cursor and is anchored on the
    /// next tick instead.
    async fn reanchor(&self, connection: &Connection) {
        for program in &self.config.programs {
            match self.anchor(connection, program).await {
                Ok(_) => {}
                Err(e) => {
                    self.cursors.lock().remove(program);
                    logger::warning(
                        LogTag::Ingestion,
                        &format!(
                            "Re-anchoring {} on {} failed: {}",
                            program, connection.endpoint.name, e
                        ),
                    );
                }
            }
        }
        logger::info(
            LogTag::Ingestion,
            &format!("Cursors re-anchored on {}", connection.endpoint.name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PlaceholderAnalyzer;
    use crate::database::MemoryStore;
    use crate::ingestion::scheduler::channel_ticker;
    use crate::rpc::{EndpointDescriptor, EndpointRegistry};
    use crate::testing::{transfer_tx, MockConnector, MockLedgerClient, RecordingNotifier};
    use crate::wallets::{ClassifierConfig, WalletStateStore};
    use serde_json::json;
    use tokio::time::Duration;

    const PROGRAM: &str = "Program1";
    const MINT: &str = "Mint1";

    struct Harness {
        poller: Arc<Poller>,
        a: Arc<MockLedgerClient>,
        b: Arc<MockLedgerClient>,
        state: Arc<WalletStateStore>,
        connections: Arc<ConnectionManager>,
    }

    async fn harness() -> Harness {
        harness_with_batch(100).await
    }

    async fn harness_with_batch(batch_size: usize) -> Harness {
        let registry = Arc::new(EndpointRegistry::new(vec![
            EndpointDescriptor::new("A", "https://a", "wss://a", 1),
            EndpointDescriptor::new("B", "https://b", "wss://b", 2),
        ]));
        let connector = Arc::new(MockConnector::new());
        let a = Arc::new(MockLedgerClient::new("A"));
        let b = Arc::new(MockLedgerClient::new("B"));
        connector.register(a.clone());
        connector.register(b.clone());

        let connections = Arc::new(ConnectionManager::connect(registry, connector).await.unwrap());
        let state = Arc::new(WalletStateStore::new());
        let classifier = Arc::new(WalletClassifier::new(
            ClassifierConfig {
                min_transaction_size: 10.0,
                min_transactions_for_trending: 50,
                smart_wallet_min_balance: 1000.0,
            },
            state.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(PlaceholderAnalyzer),
            Arc::new(RecordingNotifier::new()),
        ));
        let poller = Arc::new(Poller::new(
            PollerConfig {
                programs: vec![PROGRAM.to_string()],
                batch_size,
                normalizer: NormalizerConfig::default(),
            },
            connections.clone(),
            classifier,
        ));

        Harness {
            poller,
            a,
            b,
            state,
            connections,
        }
    }

    fn push_transfer(client: &MockLedgerClient, signature: &str, slot: u64) {
        client.push_signature(PROGRAM, signature, slot);
        client.add_transaction(transfer_tx(signature, MINT, 20_000_000, 6, "Sender"));
    }

    #[tokio::test]
    async fn first_tick_only_anchors() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        push_transfer(&h.a, "s2", 2);

        let report = h.poller.tick_once().await;
        assert_eq!(report.anchored, 1);
        assert_eq!(report.signatures, 0);
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "s2");
        assert!(h.a.fetched().is_empty());
    }

    #[tokio::test]
    async fn new_signatures_processed_oldest_first() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        h.poller.tick_once().await;

        push_transfer(&h.a, "s2", 2);
        push_transfer(&h.a, "s3", 3);
        push_transfer(&h.a, "s4", 4);

        let report = h.poller.tick_once().await;
        assert_eq!(report.signatures, 3);
        assert_eq!(report.transfers, 3);
        assert_eq!(h.a.fetched(), vec!["s2", "s3", "s4"]);
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "s4");
        assert_eq!(h.state.token_count(MINT), 3);
    }

    #[tokio::test]
    async fn backlog_larger_than_batch_is_paged_without_gaps() {
        let h = harness_with_batch(100).await;
        push_transfer(&h.a, "s0", 0);
        h.poller.tick_once().await;

        for i in 1..=150u64 {
            push_transfer(&h.a, &format!("s{}", i), i);
        }

        let report = h.poller.tick_once().await;
        assert_eq!(report.signatures, 150);
        assert_eq!(report.transfers, 150);

        let fetched = h.a.fetched();
        let expected: Vec<String> = (1..=150).map(|i| format!("s{}", i)).collect();
        assert_eq!(fetched, expected);
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "s150");

        // an exactly full page is followed by an empty one
        for i in 151..=250u64 {
            push_transfer(&h.a, &format!("s{}", i), i);
        }
        let report = h.poller.tick_once().await;
        assert_eq!(report.signatures, 100);
        assert_eq!(h.poller.tick_once().await.signatures, 0);
        assert_eq!(h.state.token_count(MINT), 250);
    }

    #[tokio::test]
    async fn cursor_is_monotonic_across_ticks() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        h.poller.tick_once().await;

        let mut slots = vec![h.poller.cursor(PROGRAM).unwrap().slot];
        for i in 2..6u64 {
            push_transfer(&h.a, &format!("s{}", i), i);
            h.poller.tick_once().await;
            // an empty tick leaves the cursor where it is
            h.poller.tick_once().await;
            slots.push(h.poller.cursor(PROGRAM).unwrap().slot);
        }

        assert_eq!(slots, vec![1, 2, 3, 4, 5]);
        assert_eq!(h.a.fetched().len(), 4);
    }

    #[tokio::test]
    async fn failed_and_unfetchable_transactions_are_skipped() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        h.poller.tick_once().await;

        h.a.push_signature(PROGRAM, "failed", 2);
        let mut failed = transfer_tx("failed", MINT, 20_000_000, 6, "Sender");
        failed.err = Some(json!({"InstructionError": [0, "Custom"]}));
        h.a.add_transaction(failed);

        push_transfer(&h.a, "timeout", 3);
        h.a.fail_transaction("timeout");

        push_transfer(&h.a, "ok", 4);

        let report = h.poller.tick_once().await;
        assert_eq!(report.signatures, 3);
        assert_eq!(report.transfers, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "ok");
        assert_eq!(h.state.token_count(MINT), 1);
    }

    #[tokio::test]
    async fn batch_failure_fails_over_and_reanchors() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        push_transfer(&h.b, "b1", 1);
        push_transfer(&h.b, "b2", 2);
        h.poller.tick_once().await;

        h.a.set_fail_signatures(true);
        let report = h.poller.tick_once().await;

        assert!(report.failed_over);
        assert_eq!(report.signatures, 0);
        assert_eq!(h.connections.current().await.endpoint.name, "B");
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "b2");

        push_transfer(&h.b, "b3", 3);
        let report = h.poller.tick_once().await;
        assert_eq!(report.transfers, 1);
        assert_eq!(h.b.fetched(), vec!["b3"]);
    }

    #[tokio::test]
    async fn exhausted_failover_keeps_cursor() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);
        h.poller.tick_once().await;

        h.a.set_fail_signatures(true);
        h.b.set_healthy(false);
        let report = h.poller.tick_once().await;

        assert!(!report.failed_over);
        assert_eq!(h.connections.current().await.endpoint.name, "A");
        assert_eq!(h.poller.cursor(PROGRAM).unwrap().signature, "s1");

        // next tick retries against the same endpoint
        h.a.set_fail_signatures(false);
        push_transfer(&h.a, "s2", 2);
        let report = h.poller.tick_once().await;
        assert_eq!(report.transfers, 1);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown_and_closed_ticker() {
        let h = harness().await;
        push_transfer(&h.a, "s1", 1);

        let (ticks, ticker) = channel_ticker(4);
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(h.poller.clone().run(Box::new(ticker), shutdown.clone()));

        assert!(ticks.tick().await);
        for _ in 0..100 {
            if h.poller.cursor(PROGRAM).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        push_transfer(&h.a, "s2", 2);
        assert!(ticks.tick().await);

        for _ in 0..100 {
            if h.poller.tick_count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(h.poller.tick_count(), 2);

        shutdown.notify_waiters();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.poller.transfer_count(), 1);

        // a closed tick source also ends the loop
        let (ticks, ticker) = channel_ticker(1);
        drop(ticks);
        let handle = tokio::spawn(h.poller.clone().run(Box::new(ticker), Arc::new(Notify::new())));
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
