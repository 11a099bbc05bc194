/// Error types shared across the ingestion pipeline
///
/// Irrelevant data (no transfer, amount below threshold) is never an error and
/// is modelled as `Option::None` by the callers instead.
use thiserror::Error;

// =============================================================================
// UPSTREAM LEDGER ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("{method} on {endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        endpoint: String,
        method: String,
        timeout_ms: u64,
    },

    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("RPC error {code} from {endpoint}: {message}")]
    Rpc {
        endpoint: String,
        code: i64,
        message: String,
    },

    #[error("All RPC endpoints failed ({attempted} attempted)")]
    AllEndpointsFailed { attempted: usize },

    #[error("No RPC endpoints registered")]
    NoEndpoints,
}

impl RpcError {
    /// HTTP 429 or the JSON-RPC rate limit code
    pub fn is_rate_limit(&self) -> bool {
        match self {
            RpcError::HttpStatus { status, .. } => *status == 429,
            RpcError::Rpc { code, .. } => *code == 429 || *code == -32005,
            _ => false,
        }
    }
}

// =============================================================================
// PERSISTENCE ERRORS
// =============================================================================

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to open database at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid config field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Missing required config field '{field}'")]
    Missing { field: String },

    #[error("Config already initialized")]
    AlreadyInitialized,
}
