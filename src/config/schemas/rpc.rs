use crate::config_struct;

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// A statically configured upstream endpoint
    pub struct EndpointConfig {
        /// Human readable name, unique across the registry
        name: String = String::new(),

        /// JSON-RPC HTTP URL
        http_url: String = String::new(),

        /// Websocket URL (informational, polling does not use it)
        ws_url: String = String::new(),

        /// Failover tier, lower is preferred
        priority: i32 = 1,
    }
}

fn endpoint(name: &str, http: &str, ws: &str, priority: i32) -> EndpointConfig {
    EndpointConfig {
        name: name.to_string(),
        http_url: http.to_string(),
        ws_url: ws.to_string(),
        priority,
    }
}

/// Public mainnet endpoints used when neither config nor database provide any
pub fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        endpoint(
            "GenesysGo",
            "https://ssc-dao.genesysgo.net",
            "wss://ssc-dao.genesysgo.net",
            1,
        ),
        endpoint(
            "Serum",
            "https://solana-api.projectserum.com",
            "wss://solana-api.projectserum.com",
            1,
        ),
        endpoint(
            "Ankr",
            "https://rpc.ankr.com/solana",
            "wss://rpc.ankr.com/solana/ws",
            2,
        ),
        endpoint(
            "Triton",
            "https://free.rpcpool.com",
            "wss://free.rpcpool.com",
            2,
        ),
        endpoint(
            "Solana Default",
            "https://api.mainnet-beta.solana.com",
            "wss://api.mainnet-beta.solana.com",
            3,
        ),
    ]
}

config_struct! {
    /// Upstream ledger access configuration
    pub struct RpcConfig {
        /// Endpoints seeded into the registry on first start
        endpoints: Vec<EndpointConfig> = default_endpoints(),

        /// Seconds between poll ticks
        poll_interval_secs: u64 = 30,

        /// Maximum signatures fetched per program per tick
        batch_size: usize = 100,

        /// Timeout for getSignaturesForAddress
        signatures_timeout_secs: u64 = 10,

        /// Timeout for getTransaction
        transaction_timeout_secs: u64 = 10,

        /// Timeout for getBalance
        balance_timeout_secs: u64 = 5,

        /// Commitment level passed to every query
        commitment: String = "confirmed".to_string(),
    }
}
