//! Scripted collaborators for unit tests
//!
//! Nothing here talks to the network; every mock records what it was asked.

use crate::errors::RpcError;
use crate::notifications::NotificationSender;
use crate::rpc::{Connector, EndpointDescriptor, LedgerClient, SignatureInfo};
use crate::transactions::program_ids::{SPL_TOKEN_PROGRAM_ID, SPL_TOKEN_PROGRAM_NAME};
use crate::transactions::{Instruction, RawTransaction};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use serde_json::json;
use std::sync::Arc;

/// In-memory ledger with a scripted signature history per program
pub struct MockLedgerClient {
    name: String,
    healthy: AtomicBool,
    fail_signatures: AtomicBool,
    /// Newest first, like the RPC returns them
    signatures: Mutex<HashMap<String, Vec<SignatureInfo>>>,
    transactions: Mutex<HashMap<String, RawTransaction>>,
    failing_transactions: Mutex<HashSet<String>>,
    balances: Mutex<HashMap<String, u64>>,
    balance_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl MockLedgerClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            healthy: AtomicBool::new(true),
            fail_signatures: AtomicBool::new(false),
            signatures: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
            failing_transactions: Mutex::new(HashSet::new()),
            balances: Mutex::new(HashMap::new()),
            balance_calls: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Make `list_signatures` fail, simulating a batch-level outage
    pub fn set_fail_signatures(&self, fail: bool) {
        self.fail_signatures.store(fail, Ordering::SeqCst);
    }

    /// Append a confirmed signature; later pushes are newer
    pub fn push_signature(&self, program: &str, signature: &str, slot: u64) {
        self.signatures
            .lock()
            .entry(program.to_string())
            .or_default()
            .insert(
                0,
                SignatureInfo {
                    signature: signature.to_string(),
                    slot,
                    err: None,
                    block_time: None,
                },
            );
    }

    pub fn add_transaction(&self, tx: RawTransaction) {
        self.transactions.lock().insert(tx.signature.clone(), tx);
    }

    pub fn fail_transaction(&self, signature: &str) {
        self.failing_transactions.lock().insert(signature.to_string());
    }

    pub fn set_balance(&self, address: &str, lamports: u64) {
        self.balances.lock().insert(address.to_string(), lamports);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    /// Signatures passed to `get_parsed_transaction`, in call order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }

    fn unavailable(&self, method: &str) -> RpcError {
        RpcError::Timeout {
            endpoint: self.name.clone(),
            method: method.to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    fn endpoint_name(&self) -> &str {
        &self.name
    }

    async fn get_health(&self) -> Result<(), RpcError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(self.unavailable("getHealth"))
        }
    }

    async fn list_signatures(
        &self,
        program: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        if self.fail_signatures.load(Ordering::SeqCst) {
            return Err(self.unavailable("getSignaturesForAddress"));
        }
        let signatures = self.signatures.lock();
        let history = signatures.get(program).cloned().unwrap_or_default();
        let start = match before {
            Some(before) => history
                .iter()
                .position(|s| s.signature == before)
                .map_or(history.len(), |i| i + 1),
            None => 0,
        };
        Ok(history
            .into_iter()
            .skip(start)
            .take_while(|s| Some(s.signature.as_str()) != until)
            .take(limit)
            .collect())
    }

    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<RawTransaction>, RpcError> {
        self.fetched.lock().push(signature.to_string());
        if self.failing_transactions.lock().contains(signature) {
            return Err(self.unavailable("getTransaction"));
        }
        Ok(self.transactions.lock().get(signature).cloned())
    }

    async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balances.lock().get(address).copied().unwrap_or(0))
    }
}

/// Hands out registered mock clients by endpoint name
#[derive(Default)]
pub struct MockConnector {
    clients: Mutex<HashMap<String, Arc<MockLedgerClient>>>,
    attempts: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client: Arc<MockLedgerClient>) {
        self.clients.lock().insert(client.name.clone(), client);
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        endpoint: &EndpointDescriptor,
    ) -> Result<Arc<dyn LedgerClient>, RpcError> {
        self.attempts.lock().push(endpoint.name.clone());
        match self.clients.lock().get(&endpoint.name) {
            Some(client) => Ok(client.clone() as Arc<dyn LedgerClient>),
            None => Err(RpcError::ConnectionFailed {
                endpoint: endpoint.name.clone(),
                reason: "no mock registered".to_string(),
            }),
        }
    }
}

/// Captures every alert instead of delivering it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_alert(&self, message: &str) {
        self.sent.lock().push(message.to_string());
    }
}

/// Successful transaction holding a single parsed `transferChecked`
pub fn transfer_tx(
    signature: &str,
    mint: &str,
    raw_amount: u64,
    decimals: u8,
    authority: &str,
) -> RawTransaction {
    RawTransaction {
        signature: signature.to_string(),
        slot: 1,
        block_time: None,
        err: None,
        account_keys: vec![authority.to_string()],
        instructions: vec![Instruction::Parsed {
            program: SPL_TOKEN_PROGRAM_NAME.to_string(),
            program_id: SPL_TOKEN_PROGRAM_ID.to_string(),
            parsed: json!({
                "type": "transferChecked",
                "info": {
                    "source": format!("{}-ata", authority),
                    "destination": "DestAta",
                    "authority": authority,
                    "mint": mint,
                    "tokenAmount": {"amount": raw_amount.to_string(), "decimals": decimals}
                }
            }),
        }],
        inner_instructions: vec![],
        pre_token_balances: vec![],
        post_token_balances: vec![],
        fetched_at: Utc::now(),
    }
}
