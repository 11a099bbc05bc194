//! Level and tag filtering in front of the formatter

use super::config::{get_logger_config, is_debug_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Filtering rules, in order:
/// errors always pass; anything above `min_level` is dropped; debug needs the
/// tag's `--debug-<tag>` flag; a non-empty `enabled_tags` set restricts the rest.
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let config = get_logger_config();

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    if level > config.min_level {
        return false;
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag.to_debug_key()) {
        return false;
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    super::format::format_and_log(&tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};

    #[test]
    fn debug_requires_flag_and_errors_always_pass() {
        let mut config = LoggerConfig::default();
        config.debug_tags.insert("rpc".to_string());
        set_logger_config(config);

        assert!(should_log(&LogTag::Rpc, LogLevel::Debug));
        assert!(!should_log(&LogTag::Wallets, LogLevel::Debug));
        assert!(should_log(&LogTag::Wallets, LogLevel::Error));
        assert!(!should_log(&LogTag::Wallets, LogLevel::Verbose));

        set_logger_config(LoggerConfig::default());
    }
}
