use crate::config_struct;

config_struct! {
    /// Alert delivery channels, a channel with empty credentials is skipped
    pub struct NotificationsConfig {
        enabled: bool = true,

        /// Telegram bot token from @BotFather
        telegram_bot_token: String = String::new(),

        /// Telegram chat receiving alerts
        telegram_chat_id: String = String::new(),

        /// Discord webhook URL
        discord_webhook_url: String = String::new(),

        /// Timeout for a single channel delivery
        send_timeout_secs: u64 = 10,
    }
}

impl NotificationsConfig {
    pub fn telegram_configured(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }

    pub fn discord_configured(&self) -> bool {
        !self.discord_webhook_url.is_empty()
    }
}
