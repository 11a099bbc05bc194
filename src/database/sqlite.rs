//! SQLite implementation of [`Persistence`]
//!
//! One connection behind a mutex; statements are short and the pipeline
//! writes at most a few rows per transfer.

use super::{window_start, Persistence, PersistenceResult, TokenVolume};
use crate::errors::PersistenceError;
use crate::logger::{self, LogTag};
use crate::rpc::EndpointDescriptor;
use crate::transactions::TransferEvent;
use crate::wallets::{WalletCategory, WalletRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA temp_store = MEMORY;
    PRAGMA busy_timeout = 30000;

    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        signature TEXT NOT NULL UNIQUE,
        token_address TEXT NOT NULL,
        token_name TEXT,
        amount REAL NOT NULL,
        raw_amount INTEGER NOT NULL,
        decimals INTEGER NOT NULL,
        sender TEXT NOT NULL,
        observed_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_token_time ON transactions(token_address, observed_at DESC);
    CREATE INDEX IF NOT EXISTS idx_transactions_time ON transactions(observed_at DESC);

    CREATE TABLE IF NOT EXISTS smart_wallets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT NOT NULL,
        category TEXT NOT NULL,
        transaction_count INTEGER NOT NULL DEFAULT 0,
        win_rate REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (address, category)
    );
    CREATE INDEX IF NOT EXISTS idx_smart_wallets_address ON smart_wallets(address);

    CREATE TABLE IF NOT EXISTS rpc_endpoints (
        name TEXT PRIMARY KEY,
        http_url TEXT NOT NULL,
        ws_url TEXT NOT NULL,
        priority INTEGER NOT NULL,
        response_time_ms INTEGER NOT NULL DEFAULT 0,
        success_rate INTEGER NOT NULL DEFAULT 100,
        is_active INTEGER NOT NULL DEFAULT 1,
        last_check TEXT NOT NULL
    );
"#;

/// Timestamps are stored as fixed-width RFC 3339 so text comparison orders them
fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(table: &'static str, value: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::CorruptRow {
            table,
            reason: format!("bad timestamp '{}': {}", value, e),
        })
}

struct TransactionRow {
    signature: String,
    token_mint: String,
    token_name: Option<String>,
    amount: f64,
    raw_amount: i64,
    decimals: i64,
    sender: String,
    observed_at: String,
}

impl TransactionRow {
    const COLUMNS: &'static str =
        "signature, token_address, token_name, amount, raw_amount, decimals, sender, observed_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            signature: row.get(0)?,
            token_mint: row.get(1)?,
            token_name: row.get(2)?,
            amount: row.get(3)?,
            raw_amount: row.get(4)?,
            decimals: row.get(5)?,
            sender: row.get(6)?,
            observed_at: row.get(7)?,
        })
    }

    fn into_event(self) -> PersistenceResult<TransferEvent> {
        Ok(TransferEvent {
            signature: self.signature,
            token_mint: self.token_mint,
            token_name: self.token_name,
            amount: self.amount,
            raw_amount: self.raw_amount as u64,
            decimals: self.decimals as u8,
            sender: self.sender,
            observed_at: parse_ts("transactions", &self.observed_at)?,
        })
    }
}

struct WalletRow {
    address: String,
    category: String,
    transaction_count: i64,
    win_rate: f64,
    created_at: String,
    updated_at: String,
}

impl WalletRow {
    const COLUMNS: &'static str =
        "address, category, transaction_count, win_rate, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            address: row.get(0)?,
            category: row.get(1)?,
            transaction_count: row.get(2)?,
            win_rate: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_record(self) -> PersistenceResult<WalletRecord> {
        let category =
            WalletCategory::from_str(&self.category).ok_or_else(|| PersistenceError::CorruptRow {
                table: "smart_wallets",
                reason: format!("unknown category '{}'", self.category),
            })?;
        Ok(WalletRecord {
            address: self.address,
            category,
            transaction_count: self.transaction_count.max(0) as u64,
            win_rate: self.win_rate,
            created_at: parse_ts("smart_wallets", &self.created_at)?,
            updated_at: parse_ts("smart_wallets", &self.updated_at)?,
        })
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Open {
                path: path.display().to_string(),
                reason: format!("Failed to create directory: {}", e),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| PersistenceError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let store = Self::with_connection(conn)?;

        logger::info(
            LogTag::Database,
            &format!("Opened database at {}", path.display()),
        );
        Ok(store)
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_events(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> PersistenceResult<Vec<TransferEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, TransactionRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(TransactionRow::into_event).collect()
    }
}

#[async_trait]
impl Persistence for SqliteStore {
    async fn save_transaction(&self, event: &TransferEvent) -> PersistenceResult<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO transactions
             (signature, token_address, token_name, amount, raw_amount, decimals, sender, observed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.signature,
                event.token_mint,
                event.token_name,
                event.amount,
                event.raw_amount as i64,
                event.decimals as i64,
                event.sender,
                ts(&event.observed_at),
                ts(&Utc::now()),
            ],
        )?;

        if inserted == 0 {
            logger::debug(
                LogTag::Database,
                &format!("Transaction {} already stored", event.signature),
            );
        }
        Ok(inserted > 0)
    }

    async fn save_wallet_record(&self, record: &WalletRecord) -> PersistenceResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO smart_wallets
             (address, category, transaction_count, win_rate, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(address, category) DO UPDATE SET
                transaction_count = excluded.transaction_count,
                win_rate = excluded.win_rate,
                updated_at = excluded.updated_at",
            params![
                record.address,
                record.category.as_str(),
                record.transaction_count as i64,
                record.win_rate,
                ts(&record.created_at),
                ts(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn find_wallet(
        &self,
        address: &str,
        category: WalletCategory,
    ) -> PersistenceResult<Option<WalletRecord>> {
        let row = {
            let conn = self.conn.lock();
            conn.query_row(
                &format!(
                    "SELECT {} FROM smart_wallets WHERE address = ?1 AND category = ?2",
                    WalletRow::COLUMNS
                ),
                params![address, category.as_str()],
                WalletRow::from_row,
            )
            .optional()?
        };
        row.map(WalletRow::into_record).transpose()
    }

    async fn find_wallets_by_address(&self, address: &str) -> PersistenceResult<Vec<WalletRecord>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM smart_wallets WHERE address = ?1 ORDER BY id",
                WalletRow::COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![address], WalletRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        rows.into_iter().map(WalletRow::into_record).collect()
    }

    async fn get_recent_transactions(
        &self,
        token_mint: &str,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>> {
        let since = ts(&window_start(window_minutes));
        self.query_events(
            &format!(
                "SELECT {} FROM transactions
                 WHERE token_address = ?1 AND observed_at >= ?2
                 ORDER BY observed_at DESC",
                TransactionRow::COLUMNS
            ),
            params![token_mint, since],
        )
    }

    async fn get_top_tokens_by_volume(
        &self,
        window_minutes: u64,
        limit: usize,
    ) -> PersistenceResult<Vec<TokenVolume>> {
        let since = ts(&window_start(window_minutes));
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT token_address, SUM(amount) AS volume, COUNT(*)
             FROM transactions
             WHERE observed_at >= ?1
             GROUP BY token_address
             ORDER BY volume DESC
             LIMIT ?2",
        )?;
        let volumes = stmt
            .query_map(params![since, limit as i64], |row| {
                Ok(TokenVolume {
                    token_mint: row.get(0)?,
                    volume: row.get(1)?,
                    transfer_count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(volumes)
    }

    async fn get_whale_transactions(
        &self,
        min_amount: f64,
        window_minutes: u64,
    ) -> PersistenceResult<Vec<TransferEvent>> {
        let since = ts(&window_start(window_minutes));
        self.query_events(
            &format!(
                "SELECT {} FROM transactions
                 WHERE amount >= ?1 AND observed_at >= ?2
                 ORDER BY observed_at DESC",
                TransactionRow::COLUMNS
            ),
            params![min_amount, since],
        )
    }

    async fn load_endpoints(&self) -> PersistenceResult<Vec<EndpointDescriptor>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(
                "SELECT name, http_url, ws_url, priority, response_time_ms, success_rate, is_active, last_check
                 FROM rpc_endpoints ORDER BY priority, name",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, bool>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter()
            .map(
                |(name, http_url, ws_url, priority, latency, rate, is_active, last_check)| {
                    Ok(EndpointDescriptor {
                        name,
                        http_url,
                        ws_url,
                        priority,
                        last_latency_ms: latency.max(0) as u64,
                        success_rate: rate.clamp(0, 100) as u8,
                        is_active,
                        last_checked_at: parse_ts("rpc_endpoints", &last_check)?,
                    })
                },
            )
            .collect()
    }

    async fn save_endpoints(&self, endpoints: &[EndpointDescriptor]) -> PersistenceResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for endpoint in endpoints {
            tx.execute(
                "INSERT INTO rpc_endpoints
                 (name, http_url, ws_url, priority, response_time_ms, success_rate, is_active, last_check)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(name) DO UPDATE SET
                    http_url = excluded.http_url,
                    ws_url = excluded.ws_url,
                    priority = excluded.priority,
                    response_time_ms = excluded.response_time_ms,
                    success_rate = excluded.success_rate,
                    is_active = excluded.is_active,
                    last_check = excluded.last_check",
                params![
                    endpoint.name,
                    endpoint.http_url,
                    endpoint.ws_url,
                    endpoint.priority,
                    endpoint.last_latency_ms as i64,
                    endpoint.success_rate as i64,
                    endpoint.is_active,
                    ts(&endpoint.last_checked_at),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
