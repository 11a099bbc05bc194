//! Configuration utilities - loading, environment overrides, validation and access
//!
//! Configuration errors are fatal at startup only; once [`init_config`] has
//! run the pipeline never re-reads the file.

use super::schemas::{Config, EndpointConfig};
use crate::errors::ConfigError;
use once_cell::sync::OnceCell;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Load configuration from the default path in the data directory
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from_path(&crate::paths::get_config_path())
}

/// Load configuration from a TOML file, falling back to defaults when it does not exist
///
/// Environment overrides are applied and the result is validated.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        parse_config(&contents, &path.display().to_string())?
    } else {
        eprintln!(
            "⚠️  Config file '{}' not found, using default values",
            path.display()
        );
        Config::default()
    };

    #[cfg(feature = "logging")]
    {
        let _ = dotenv::dotenv();
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Parse a TOML document into a [`Config`]
pub fn parse_config(contents: &str, origin: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(contents).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

fn parse_env_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidField {
        field: key.to_string(),
        reason: format!("invalid number value: {}", value),
    })
}

/// Apply environment variable overrides
///
/// `lookup` is injected so tests do not touch the process environment.
/// `SOLANA_RPC_ENDPOINT` is registered as the most preferred endpoint (priority 0).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("SOLANA_RPC_ENDPOINT") {
        let ws_url = lookup("SOLANA_WS_ENDPOINT").unwrap_or_else(|| {
            url.replacen("https://", "wss://", 1)
                .replacen("http://", "ws://", 1)
        });
        config.rpc.endpoints.retain(|e| e.name != "Env");
        config.rpc.endpoints.insert(
            0,
            EndpointConfig {
                name: "Env".to_string(),
                http_url: url,
                ws_url,
                priority: 0,
            },
        );
    }

    if let Some(v) = lookup("MIN_TRANSACTION_SIZE") {
        config.thresholds.min_transaction_size = parse_env_number("MIN_TRANSACTION_SIZE", &v)?;
    }
    if let Some(v) = lookup("MIN_TRANSACTIONS_FOR_TRENDING") {
        config.thresholds.min_transactions_for_trending =
            parse_env_number("MIN_TRANSACTIONS_FOR_TRENDING", &v)?;
    }
    if let Some(v) = lookup("MONITORING_TIMEFRAME_MINUTES") {
        config.thresholds.monitoring_timeframe_minutes =
            parse_env_number("MONITORING_TIMEFRAME_MINUTES", &v)?;
    }
    if let Some(v) = lookup("SMART_WALLET_MIN_BALANCE") {
        config.thresholds.smart_wallet_min_balance =
            parse_env_number("SMART_WALLET_MIN_BALANCE", &v)?;
    }
    if let Some(v) = lookup("MIN_WHALE_TRANSACTION_SOL") {
        config.analysis.min_whale_transaction = parse_env_number("MIN_WHALE_TRANSACTION_SOL", &v)?;
    }
    if let Some(v) = lookup("PATTERN_TIME_WINDOW_MINUTES") {
        config.analysis.time_window_minutes = parse_env_number("PATTERN_TIME_WINDOW_MINUTES", &v)?;
    }
    if let Some(v) = lookup("POLL_INTERVAL_SECS") {
        config.rpc.poll_interval_secs = parse_env_number("POLL_INTERVAL_SECS", &v)?;
    }
    if let Some(v) = lookup("BATCH_SIZE") {
        config.rpc.batch_size = parse_env_number("BATCH_SIZE", &v)?;
    }
    if let Some(v) = lookup("TELEGRAM_BOT_TOKEN") {
        config.notifications.telegram_bot_token = v;
    }
    if let Some(v) = lookup("TELEGRAM_CHAT_ID") {
        config.notifications.telegram_chat_id = v;
    }
    if let Some(v) = lookup("DISCORD_WEBHOOK_URL") {
        config.notifications.discord_webhook_url = v;
    }

    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Reject configurations the pipeline cannot run with
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.rpc.endpoints.is_empty() {
        return Err(ConfigError::Missing {
            field: "rpc.endpoints".to_string(),
        });
    }

    let mut names = std::collections::HashSet::new();
    for endpoint in &config.rpc.endpoints {
        if endpoint.name.is_empty() {
            return Err(invalid("rpc.endpoints.name", "endpoint name is empty"));
        }
        if !names.insert(endpoint.name.as_str()) {
            return Err(invalid(
                "rpc.endpoints.name",
                format!("duplicate endpoint name '{}'", endpoint.name),
            ));
        }
        url::Url::parse(&endpoint.http_url).map_err(|e| {
            invalid(
                "rpc.endpoints.http_url",
                format!("'{}': {}", endpoint.http_url, e),
            )
        })?;
    }

    if config.rpc.batch_size == 0 || config.rpc.batch_size > 1000 {
        return Err(invalid("rpc.batch_size", "must be between 1 and 1000"));
    }
    if config.rpc.poll_interval_secs == 0 {
        return Err(invalid("rpc.poll_interval_secs", "must be greater than 0"));
    }

    if config.monitor.programs.is_empty() {
        return Err(ConfigError::Missing {
            field: "monitor.programs".to_string(),
        });
    }
    for program in &config.monitor.programs {
        Pubkey::from_str(&program.address).map_err(|e| {
            invalid(
                "monitor.programs.address",
                format!("'{}': {}", program.address, e),
            )
        })?;
    }
    for token_program in &config.monitor.token_programs {
        Pubkey::from_str(token_program).map_err(|e| {
            invalid(
                "monitor.token_programs",
                format!("'{}': {}", token_program, e),
            )
        })?;
    }

    let t = &config.thresholds;
    if !(t.min_transaction_size >= 0.0) {
        return Err(invalid("thresholds.min_transaction_size", "must be >= 0"));
    }
    if !(t.smart_wallet_min_balance >= 0.0) {
        return Err(invalid("thresholds.smart_wallet_min_balance", "must be >= 0"));
    }
    if !(config.analysis.min_whale_transaction >= 0.0) {
        return Err(invalid("analysis.min_whale_transaction", "must be >= 0"));
    }
    if t.min_transactions_for_trending == 0 {
        return Err(invalid(
            "thresholds.min_transactions_for_trending",
            "must be greater than 0",
        ));
    }

    if config.connectivity.check_interval_secs == 0 {
        return Err(invalid(
            "connectivity.check_interval_secs",
            "must be greater than 0",
        ));
    }

    Ok(())
}

/// Install the validated configuration as the process-wide instance
pub fn init_config(config: Config) -> Result<(), ConfigError> {
    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when [`init_config`] has not run, which only
/// happens in tools and tests.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get().map(|lock| lock.read()) {
        Some(Ok(config)) => f(&config),
        _ => f(&Config::default()),
    }
}

/// Clone the configuration for use across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = parse_config(
            "[thresholds]\nsmart_wallet_min_balance = 100.0\n\n[rpc]\nbatch_size = 25\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.thresholds.smart_wallet_min_balance, 100.0);
        assert_eq!(config.thresholds.min_transaction_size, 10.0);
        assert_eq!(config.rpc.batch_size, 25);
        assert_eq!(config.rpc.poll_interval_secs, 30);
        assert_eq!(config.rpc.endpoints.len(), 5);
    }

    #[test]
    fn env_overrides_thresholds_and_endpoint() {
        let vars = env(&[
            ("SOLANA_RPC_ENDPOINT", "https://rpc.example.com"),
            ("MIN_TRANSACTION_SIZE", "25"),
            ("SMART_WALLET_MIN_BALANCE", "10000"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.thresholds.min_transaction_size, 25.0);
        assert_eq!(config.thresholds.smart_wallet_min_balance, 10000.0);
        let first = &config.rpc.endpoints[0];
        assert_eq!(first.name, "Env");
        assert_eq!(first.priority, 0);
        assert_eq!(first.ws_url, "wss://rpc.example.com");
    }

    #[test]
    fn env_override_rejects_non_numbers() {
        let vars = env(&[("MIN_TRANSACTIONS_FOR_TRENDING", "lots")]);
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.rpc.batch_size = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.monitor.programs[0].address = "not-a-pubkey".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.rpc.endpoints.clear();
        assert_eq!(
            validate(&config),
            Err(ConfigError::Missing {
                field: "rpc.endpoints".to_string()
            })
        );

        let mut config = Config::default();
        config.rpc.endpoints[1].name = config.rpc.endpoints[0].name.clone();
        assert!(validate(&config).is_err());
    }
}
