/// Subsystem tags used to route and filter log lines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Connectivity,
    Ingestion,
    Transactions,
    Wallets,
    Analysis,
    Notifications,
    Database,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Rpc => "rpc".to_string(),
            LogTag::Connectivity => "connectivity".to_string(),
            LogTag::Ingestion => "ingestion".to_string(),
            LogTag::Transactions => "transactions".to_string(),
            LogTag::Wallets => "wallets".to_string(),
            LogTag::Analysis => "analysis".to_string(),
            LogTag::Notifications => "notifications".to_string(),
            LogTag::Database => "database".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uncolored label written to the log file
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Rpc => "RPC".to_string(),
            LogTag::Connectivity => "CONNECT".to_string(),
            LogTag::Ingestion => "INGEST".to_string(),
            LogTag::Transactions => "TX".to_string(),
            LogTag::Wallets => "WALLETS".to_string(),
            LogTag::Analysis => "ANALYSIS".to_string(),
            LogTag::Notifications => "NOTIFY".to_string(),
            LogTag::Database => "DB".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(s) => s.to_uppercase(),
        }
    }

    /// Parse a `--debug-<key>` suffix back into a tag
    pub fn from_debug_key(key: &str) -> Option<LogTag> {
        match key {
            "system" => Some(LogTag::System),
            "config" => Some(LogTag::Config),
            "rpc" => Some(LogTag::Rpc),
            "connectivity" => Some(LogTag::Connectivity),
            "ingestion" => Some(LogTag::Ingestion),
            "transactions" => Some(LogTag::Transactions),
            "wallets" => Some(LogTag::Wallets),
            "analysis" => Some(LogTag::Analysis),
            "notifications" => Some(LogTag::Notifications),
            "database" => Some(LogTag::Database),
            "test" => Some(LogTag::Test),
            _ => None,
        }
    }
}
