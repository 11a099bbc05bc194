/// Transaction model and instruction normalization
///
/// `types` mirrors the jsonParsed `getTransaction` shape we rely on,
/// `normalizer` reduces it to a [`types::TransferEvent`].
pub mod normalizer;
pub mod program_ids;
pub mod types;

pub use normalizer::{normalize, NormalizerConfig};
pub use types::{Instruction, RawTransaction, TransferEvent};
