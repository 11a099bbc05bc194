/// Upstream ledger access
///
/// - `types`: endpoint descriptors and signature listings
/// - `client`: the [`LedgerClient`] seam and its JSON-RPC implementation
/// - `registry`: prioritized endpoint list with health metadata
/// - `manager`: the single live connection and failover between endpoints
pub mod client;
pub mod manager;
pub mod registry;
pub mod types;

pub use crate::errors::RpcError;
pub use client::{ClientTimeouts, HttpConnector, HttpLedgerClient, LedgerClient};
pub use manager::{Connection, ConnectionManager, Connector};
pub use registry::EndpointRegistry;
pub use types::{EndpointDescriptor, SignatureInfo};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Convert a lamport balance to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
