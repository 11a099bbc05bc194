/// Wallet classification
///
/// - `types`: wallet records and categories
/// - `state`: token counters and per-address locks
/// - `classifier`: the per-transfer classification pipeline
pub mod classifier;
pub mod state;
pub mod types;

pub use classifier::{Classification, ClassifierConfig, WalletClassifier};
pub use state::WalletStateStore;
pub use types::{WalletCategory, WalletRecord};
