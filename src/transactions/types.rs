// =============================================================================
// CORE DATA STRUCTURES
// =============================================================================

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One instruction of a jsonParsed transaction
///
/// The RPC node either fully parses an instruction (known programs) or hands
/// back the raw accounts and base58 data.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Parsed {
        program: String,
        program_id: String,
        parsed: Value,
    },
    PartiallyDecoded {
        program_id: String,
        accounts: Vec<String>,
        data: String,
    },
}

impl Instruction {
    pub fn program_id(&self) -> &str {
        match self {
            Instruction::Parsed { program_id, .. } => program_id,
            Instruction::PartiallyDecoded { program_id, .. } => program_id,
        }
    }

    /// Build from a jsonParsed instruction object, `None` for shapes we do not know
    pub fn from_json(value: &Value) -> Option<Instruction> {
        let program_id = value.get("programId").and_then(|v| v.as_str())?.to_string();

        if let Some(parsed) = value.get("parsed") {
            let program = value
                .get("program")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Some(Instruction::Parsed {
                program,
                program_id,
                parsed: parsed.clone(),
            });
        }

        let data = value.get("data").and_then(|v| v.as_str())?.to_string();
        let accounts = value
            .get("accounts")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| a.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Some(Instruction::PartiallyDecoded {
            program_id,
            accounts,
            data,
        })
    }
}

/// Inner instructions emitted while executing top-level instruction `index`
#[derive(Debug, Clone, PartialEq)]
pub struct InnerInstructionGroup {
    pub index: u64,
    pub instructions: Vec<Instruction>,
}

/// Entry of `meta.preTokenBalances` / `meta.postTokenBalances`
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    pub owner: Option<String>,
    pub decimals: u8,
}

/// A transaction as returned by `getTransaction` with jsonParsed encoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    /// `meta.err`, set for failed transactions
    pub err: Option<Value>,
    pub account_keys: Vec<String>,
    pub instructions: Vec<Instruction>,
    pub inner_instructions: Vec<InnerInstructionGroup>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
    /// When the transaction was fetched, used when the block time is unknown
    pub fetched_at: DateTime<Utc>,
}

impl RawTransaction {
    /// Parse the `result` object of a jsonParsed `getTransaction` response
    pub fn from_json(signature: &str, value: &Value) -> Result<RawTransaction, String> {
        let message = value
            .get("transaction")
            .and_then(|tx| tx.get("message"))
            .ok_or_else(|| format!("transaction {} has no message", signature))?;
        let meta = value.get("meta");

        let instructions = message
            .get("instructions")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(Instruction::from_json).collect())
            .unwrap_or_default();

        let inner_instructions = meta
            .and_then(|m| m.get("innerInstructions"))
            .and_then(|v| v.as_array())
            .map(|groups| {
                groups
                    .iter()
                    .map(|group| InnerInstructionGroup {
                        index: group.get("index").and_then(|v| v.as_u64()).unwrap_or(0),
                        instructions: group
                            .get("instructions")
                            .and_then(|v| v.as_array())
                            .map(|arr| arr.iter().filter_map(Instruction::from_json).collect())
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let err = meta
            .and_then(|m| m.get("err"))
            .filter(|v| !v.is_null())
            .cloned();

        Ok(RawTransaction {
            signature: signature.to_string(),
            slot: value.get("slot").and_then(|v| v.as_u64()).unwrap_or(0),
            block_time: value.get("blockTime").and_then(|v| v.as_i64()),
            err,
            account_keys: account_keys_from_message(message),
            instructions,
            inner_instructions,
            pre_token_balances: token_balances(meta, "preTokenBalances"),
            post_token_balances: token_balances(meta, "postTokenBalances"),
            fetched_at: Utc::now(),
        })
    }

    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }

    /// Fee payer is always the first account key
    pub fn fee_payer(&self) -> Option<&str> {
        self.account_keys.first().map(|s| s.as_str())
    }

    /// Block time when known, otherwise the fetch time
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.block_time
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or(self.fetched_at)
    }

    /// Top-level instructions followed by every inner group in order
    pub fn all_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().chain(
            self.inner_instructions
                .iter()
                .flat_map(|group| group.instructions.iter()),
        )
    }

    /// Token balance entries (pre then post) for the given account
    pub fn token_balance_for(&self, account: &str) -> Option<&TokenBalance> {
        self.pre_token_balances
            .iter()
            .chain(self.post_token_balances.iter())
            .find(|b| self.account_keys.get(b.account_index).map(|k| k.as_str()) == Some(account))
    }
}

/// Get account keys from a message, jsonParsed returns objects with a `pubkey` field
fn account_keys_from_message(message: &Value) -> Vec<String> {
    message
        .get("accountKeys")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|k| {
                    if let Some(s) = k.as_str() {
                        Some(s.to_string())
                    } else {
                        k.get("pubkey")
                            .and_then(|p| p.as_str())
                            .map(|s| s.to_string())
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn token_balances(meta: Option<&Value>, field: &str) -> Vec<TokenBalance> {
    meta.and_then(|m| m.get(field))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    Some(TokenBalance {
                        account_index: entry.get("accountIndex")?.as_u64()? as usize,
                        mint: entry.get("mint")?.as_str()?.to_string(),
                        owner: entry
                            .get("owner")
                            .and_then(|v| v.as_str())
                            .map(|s| s.to_string()),
                        decimals: entry
                            .get("uiTokenAmount")
                            .and_then(|u| u.get("decimals"))
                            .and_then(|d| d.as_u64())
                            .unwrap_or(0) as u8,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Canonical token transfer extracted from a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub signature: String,
    pub token_mint: String,
    pub token_name: Option<String>,
    /// `raw_amount / 10^decimals`
    pub amount: f64,
    pub raw_amount: u64,
    pub decimals: u8,
    pub sender: String,
    pub observed_at: DateTime<Utc>,
}

impl TransferEvent {
    pub fn new(
        signature: String,
        token_mint: String,
        raw_amount: u64,
        decimals: u8,
        sender: String,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            signature,
            token_mint,
            token_name: None,
            amount: ui_amount(raw_amount, decimals),
            raw_amount,
            decimals,
            sender,
            observed_at,
        }
    }
}

/// Convert a raw token amount to UI units
pub fn ui_amount(raw_amount: u64, decimals: u8) -> f64 {
    (raw_amount as f64) / 10f64.powi(decimals as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_parsed_transaction() {
        let value = json!({
            "slot": 250_000_000u64,
            "blockTime": 1_700_000_000i64,
            "meta": {
                "err": null,
                "innerInstructions": [{
                    "index": 0,
                    "instructions": [{
                        "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                        "accounts": ["A", "B", "C", "D"],
                        "data": "3Bxs4h24hBtQy9rw",
                        "stackHeight": 2
                    }]
                }],
                "preTokenBalances": [{
                    "accountIndex": 1,
                    "mint": "MintA",
                    "owner": "OwnerA",
                    "uiTokenAmount": {"amount": "1000", "decimals": 6}
                }],
                "postTokenBalances": []
            },
            "transaction": {
                "signatures": ["sig1"],
                "message": {
                    "accountKeys": [
                        {"pubkey": "Payer", "signer": true, "writable": true},
                        {"pubkey": "TokenAcc", "signer": false, "writable": true}
                    ],
                    "instructions": [{
                        "program": "spl-token",
                        "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                        "parsed": {"type": "transfer", "info": {"amount": "5"}}
                    }]
                }
            }
        });

        let tx = RawTransaction::from_json("sig1", &value).unwrap();
        assert_eq!(tx.slot, 250_000_000);
        assert!(!tx.is_failed());
        assert_eq!(tx.fee_payer(), Some("Payer"));
        assert_eq!(tx.instructions.len(), 1);
        assert!(matches!(tx.instructions[0], Instruction::Parsed { .. }));
        assert!(matches!(
            tx.inner_instructions[0].instructions[0],
            Instruction::PartiallyDecoded { .. }
        ));
        assert_eq!(tx.all_instructions().count(), 2);
        assert_eq!(tx.token_balance_for("TokenAcc").map(|b| b.decimals), Some(6));
        assert_eq!(tx.observed_at().timestamp(), 1_700_000_000);
    }

    #[test]
    fn failed_transaction_is_flagged() {
        let value = json!({
            "slot": 1,
            "meta": {"err": {"InstructionError": [0, "Custom"]}},
            "transaction": {"message": {"accountKeys": [], "instructions": []}}
        });
        let tx = RawTransaction::from_json("sig", &value).unwrap();
        assert!(tx.is_failed());
    }

    #[test]
    fn missing_message_is_an_error() {
        assert!(RawTransaction::from_json("sig", &json!({"slot": 1})).is_err());
    }

    #[test]
    fn ui_amount_respects_decimals() {
        assert_eq!(ui_amount(50_000_000, 6), 50.0);
        assert_eq!(ui_amount(7, 0), 7.0);
    }
}
