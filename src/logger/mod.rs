//! Structured logging for WhaleWatch
//!
//! Every subsystem logs through a tag so output can be filtered per module:
//!
//! ```rust
//! use whalewatch::logger::{self, LogTag};
//!
//! logger::info(LogTag::Ingestion, "Cursor advanced");
//! logger::warning(LogTag::Rpc, "Endpoint Ankr timed out");
//! logger::debug(LogTag::Transactions, "Inner instruction skipped"); // Only with --debug-transactions
//! logger::verbose(LogTag::Rpc, "Raw response: ..."); // Only with --verbose
//! ```
//!
//! Call [`init`] once at startup. Debug output for a tag is enabled with
//! `--debug-<tag>` (for example `--debug-rpc`), everything with `--verbose`.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line flags and open the log file
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when `--debug-<tag>` was passed for this tag.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, only shown with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Flush pending file writes, call during shutdown
pub fn flush() {
    file::flush_file_logging();
}
