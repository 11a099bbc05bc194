pub mod analysis;
pub mod arguments;
pub mod config;
pub mod connectivity;
pub mod database;
pub mod errors;
pub mod ingestion;
pub mod logger;
pub mod notifications;
pub mod paths;
pub mod rpc;
pub mod run;
pub mod services;
pub mod transactions;
pub mod wallets;

#[cfg(test)]
pub mod testing;
