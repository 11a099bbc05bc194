//! Instruction normalizer
//!
//! Reduces a jsonParsed transaction to a single [`TransferEvent`], or `None`
//! when the transaction carries no usable token transfer. Instructions are
//! searched top-level first, then inner groups in order; the first transfer
//! found wins.

use super::program_ids::{is_token_program_name, SPL_TOKEN_2022_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID};
use super::types::{Instruction, RawTransaction, TransferEvent};
use crate::config::MonitorConfig;
use serde_json::Value;

/// SPL token instruction tags we decode from raw data
const TOKEN_IX_TRANSFER: u8 = 3;
const TOKEN_IX_TRANSFER_CHECKED: u8 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    /// Program IDs treated as token programs
    pub token_programs: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            token_programs: vec![
                SPL_TOKEN_PROGRAM_ID.to_string(),
                SPL_TOKEN_2022_PROGRAM_ID.to_string(),
            ],
        }
    }
}

impl From<&MonitorConfig> for NormalizerConfig {
    fn from(monitor: &MonitorConfig) -> Self {
        Self {
            token_programs: monitor.token_programs.clone(),
        }
    }
}

impl NormalizerConfig {
    fn is_token_program(&self, program_id: &str) -> bool {
        self.token_programs.iter().any(|p| p == program_id)
    }
}

/// Fields a transfer instruction may carry, whichever encoding it came in
#[derive(Debug, Default, Clone, PartialEq)]
struct TransferCandidate {
    raw_amount: Option<u64>,
    decimals: Option<u8>,
    mint: Option<String>,
    authority: Option<String>,
    source: Option<String>,
    destination: Option<String>,
}

/// Extract the canonical transfer event of a transaction
pub fn normalize(tx: &RawTransaction, config: &NormalizerConfig) -> Option<TransferEvent> {
    let candidate = tx
        .all_instructions()
        .find_map(|ix| transfer_candidate(ix, config))?;

    let raw_amount = candidate.raw_amount.filter(|a| *a > 0)?;
    let token_mint = resolve_mint(tx, &candidate, config)?;
    let decimals = resolve_decimals(tx, &candidate, &token_mint)?;
    let sender = candidate
        .authority
        .clone()
        .or_else(|| candidate.source.clone())
        .or_else(|| tx.fee_payer().map(|s| s.to_string()))?;

    Some(TransferEvent::new(
        tx.signature.clone(),
        token_mint,
        raw_amount,
        decimals,
        sender,
        tx.observed_at(),
    ))
}

fn transfer_candidate(ix: &Instruction, config: &NormalizerConfig) -> Option<TransferCandidate> {
    match ix {
        Instruction::Parsed {
            program,
            program_id,
            parsed,
        } => {
            if !is_token_program_name(program) && !config.is_token_program(program_id) {
                return None;
            }
            parsed_transfer(parsed)
        }
        Instruction::PartiallyDecoded {
            program_id,
            accounts,
            data,
        } => {
            if !config.is_token_program(program_id) {
                return None;
            }
            decoded_transfer(accounts, data)
        }
    }
}

/// `transfer` / `transferChecked` from a jsonParsed token instruction
fn parsed_transfer(parsed: &Value) -> Option<TransferCandidate> {
    let kind = parsed.get("type").and_then(|v| v.as_str())?;
    if kind != "transfer" && kind != "transferChecked" {
        return None;
    }
    let info = parsed.get("info")?;
    let token_amount = info.get("tokenAmount");

    let raw_amount = info
        .get("amount")
        .or_else(|| token_amount.and_then(|t| t.get("amount")))
        .and_then(amount_value);
    let decimals = token_amount
        .and_then(|t| t.get("decimals"))
        .or_else(|| info.get("decimals"))
        .and_then(|d| d.as_u64())
        .map(|d| d as u8);

    Some(TransferCandidate {
        raw_amount,
        decimals,
        mint: string_field(info, "mint"),
        authority: string_field(info, "authority")
            .or_else(|| string_field(info, "multisigAuthority")),
        source: string_field(info, "source"),
        destination: string_field(info, "destination"),
    })
}

/// Decode a raw token instruction, only transfers are of interest
fn decoded_transfer(accounts: &[String], data: &str) -> Option<TransferCandidate> {
    let bytes = bs58::decode(data).into_vec().ok()?;
    let (tag, rest) = bytes.split_first()?;
    let account = |i: usize| accounts.get(i).cloned();

    match *tag {
        TOKEN_IX_TRANSFER => Some(TransferCandidate {
            raw_amount: Some(read_u64_le(rest)?),
            decimals: None,
            mint: None,
            source: account(0),
            destination: account(1),
            authority: account(2),
        }),
        TOKEN_IX_TRANSFER_CHECKED => Some(TransferCandidate {
            raw_amount: Some(read_u64_le(rest)?),
            decimals: Some(*rest.get(8)?),
            source: account(0),
            mint: account(1),
            destination: account(2),
            authority: account(3),
        }),
        _ => None,
    }
}

fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(raw))
}

/// Amounts arrive as decimal strings, older nodes send numbers
fn amount_value(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn string_field(info: &Value, key: &str) -> Option<String> {
    info.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Transfer mint, else any token instruction carrying a mint, else token balances
fn resolve_mint(
    tx: &RawTransaction,
    candidate: &TransferCandidate,
    config: &NormalizerConfig,
) -> Option<String> {
    if let Some(mint) = &candidate.mint {
        return Some(mint.clone());
    }

    let from_instructions = tx.all_instructions().find_map(|ix| match ix {
        Instruction::Parsed {
            program,
            program_id,
            parsed,
        } if is_token_program_name(program) || config.is_token_program(program_id) => {
            parsed.get("info").and_then(|info| string_field(info, "mint"))
        }
        _ => None,
    });
    if from_instructions.is_some() {
        return from_instructions;
    }

    [&candidate.source, &candidate.destination]
        .into_iter()
        .flatten()
        .find_map(|account| tx.token_balance_for(account))
        .map(|balance| balance.mint.clone())
}

/// Explicit decimals, else the decimals recorded in token balances for the mint
///
/// `None` when nothing records them; raw base units would inflate the amount.
fn resolve_decimals(tx: &RawTransaction, candidate: &TransferCandidate, mint: &str) -> Option<u8> {
    if let Some(decimals) = candidate.decimals {
        return Some(decimals);
    }
    [&candidate.source, &candidate.destination]
        .into_iter()
        .flatten()
        .find_map(|account| tx.token_balance_for(account))
        .or_else(|| {
            tx.pre_token_balances
                .iter()
                .chain(tx.post_token_balances.iter())
                .find(|b| b.mint == mint)
        })
        .map(|b| b.decimals)
}
