//! Outbound alerting
//!
//! Alerts are best effort: every configured channel gets the message once,
//! failures are logged and never retried.

mod discord;
#[cfg(feature = "telegram")]
mod telegram;

pub use discord::DiscordChannel;
#[cfg(feature = "telegram")]
pub use telegram::TelegramChannel;

use crate::analysis::PatternMatch;
use crate::config::NotificationsConfig;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures::future::join_all;
use std::time::Duration;

/// Maximum transfers listed per pattern in an alert
const MAX_LISTED_TRANSFERS: usize = 5;

/// What the classifier uses to raise an alert
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_alert(&self, message: &str);
}

/// A single delivery channel
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &str) -> Result<(), String>;
}

/// Fans an alert out to every channel concurrently
pub struct MultiChannelNotifier {
    channels: Vec<Box<dyn NotificationChannel>>,
    timeout: Duration,
}

impl MultiChannelNotifier {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>, timeout: Duration) -> Self {
        Self { channels, timeout }
    }

    /// Build the channels whose credentials are present
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
        if !config.enabled {
            return Self::new(channels, Duration::from_secs(config.send_timeout_secs));
        }

        #[cfg(feature = "telegram")]
        if config.telegram_configured() {
            match TelegramChannel::new(&config.telegram_bot_token, &config.telegram_chat_id) {
                Ok(channel) => channels.push(Box::new(channel)),
                Err(e) => logger::warning(
                    LogTag::Notifications,
                    &format!("Telegram channel disabled: {}", e),
                ),
            }
        }
        #[cfg(not(feature = "telegram"))]
        if config.telegram_configured() {
            logger::warning(
                LogTag::Notifications,
                "Telegram credentials set but the telegram feature is not compiled in",
            );
        }

        if config.discord_configured() {
            match DiscordChannel::new(&config.discord_webhook_url) {
                Ok(channel) => channels.push(Box::new(channel)),
                Err(e) => logger::warning(
                    LogTag::Notifications,
                    &format!("Discord channel disabled: {}", e),
                ),
            }
        }

        Self::new(channels, Duration::from_secs(config.send_timeout_secs))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl NotificationSender for MultiChannelNotifier {
    async fn send_alert(&self, message: &str) {
        if self.channels.is_empty() {
            logger::info(LogTag::Notifications, &format!("Alert: {}", message));
            return;
        }

        let deliveries = self.channels.iter().map(|channel| async move {
            let result = match tokio::time::timeout(self.timeout, channel.deliver(message)).await {
                Ok(result) => result,
                Err(_) => Err(format!("timed out after {}s", self.timeout.as_secs())),
            };
            (channel.name(), result)
        });

        for (name, result) in join_all(deliveries).await {
            match result {
                Ok(()) => logger::debug(
                    LogTag::Notifications,
                    &format!("Alert delivered via {}", name),
                ),
                Err(e) => logger::warning(
                    LogTag::Notifications,
                    &format!("Alert delivery via {} failed: {}", name, e),
                ),
            }
        }
    }
}

/// Escape text for Telegram HTML parse mode
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render detected patterns as an HTML alert
pub fn format_pattern_alert(matches: &[PatternMatch]) -> String {
    let mut message = String::from("<b>🐋 Pattern alert</b>\n");

    for pattern in matches {
        let token = pattern
            .transactions
            .iter()
            .find_map(|t| t.token_name.as_deref())
            .map(escape_html)
            .unwrap_or_else(|| pattern.token_mint.clone());

        message.push_str(&format!(
            "\n<b>{}</b> on <code>{}</code> ({} transfers)\n",
            pattern.kind.label(),
            token,
            pattern.transactions.len()
        ));

        for transfer in pattern.transactions.iter().take(MAX_LISTED_TRANSFERS) {
            message.push_str(&format!(
                "• {:.2} from <code>{}</code>\n",
                transfer.amount, transfer.sender
            ));
        }
        if pattern.transactions.len() > MAX_LISTED_TRANSFERS {
            message.push_str(&format!(
                "… and {} more\n",
                pattern.transactions.len() - MAX_LISTED_TRANSFERS
            ));
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PatternKind;
    use crate::database::contract;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingChannel {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationChannel for CountingChannel {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn deliver(&self, _message: &str) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn every_channel_gets_one_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = MultiChannelNotifier::new(
            vec![
                Box::new(CountingChannel {
                    calls: calls.clone(),
                    fail: true,
                }),
                Box::new(CountingChannel {
                    calls: calls.clone(),
                    fail: false,
                }),
            ],
            Duration::from_secs(1),
        );

        notifier.send_alert("hello").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unconfigured_notifier_has_no_channels() {
        let notifier = MultiChannelNotifier::from_config(&NotificationsConfig::default());
        assert!(notifier.channel_names().is_empty());
    }

    #[test]
    fn alert_lists_transfers() {
        let mut transfers: Vec<_> = (0..7)
            .map(|i| contract::event(&format!("s{}", i), "MintA", 1000.0 + i as f64, "W1"))
            .collect();
        transfers[0].token_name = Some("<Bonk>".to_string());
        let alert = format_pattern_alert(&[PatternMatch {
            kind: PatternKind::WhaleMovement,
            token_mint: "MintA".to_string(),
            transactions: transfers,
        }]);

        assert!(alert.contains("<b>Whale movement</b> on <code>&lt;Bonk&gt;</code> (7 transfers)"));
        assert!(alert.contains("• 1000.00 from <code>W1</code>"));
        assert!(alert.contains("… and 2 more"));
    }
}
