//! Signature ingestion
//!
//! - `cursor`: per-program position in the signature history
//! - `scheduler`: interval and channel tick sources
//! - `poller`: the fetch, normalize and classify loop

pub mod cursor;
pub mod poller;
pub mod scheduler;

pub use cursor::IngestionCursor;
pub use poller::{Poller, PollerConfig, TickReport};
pub use scheduler::{channel_ticker, ChannelTicker, IntervalTicker, TickSender, Ticker};
