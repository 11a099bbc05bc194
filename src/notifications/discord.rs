use super::NotificationChannel;
use async_trait::async_trait;
use serde_json::json;

/// Discord rejects webhook content longer than this
const DISCORD_CONTENT_LIMIT: usize = 2000;

/// Posts alerts to a Discord webhook
pub struct DiscordChannel {
    http: reqwest::Client,
    webhook_url: String,
}

impl DiscordChannel {
    pub fn new(webhook_url: &str) -> Result<Self, String> {
        url::Url::parse(webhook_url).map_err(|e| format!("Invalid webhook URL: {}", e))?;
        Ok(Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
        })
    }
}

/// Alerts are written for Telegram HTML; Discord speaks markdown
pub fn html_to_markdown(message: &str) -> String {
    let marked = message
        .replace("<b>", "**")
        .replace("</b>", "**")
        .replace("<code>", "`")
        .replace("</code>", "`");

    // any other tag is dropped, entities are decoded after so escaped brackets survive
    let mut stripped = String::with_capacity(marked.len());
    let mut in_tag = false;
    for c in marked.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let converted = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    converted.chars().take(DISCORD_CONTENT_LIMIT).collect()
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, message: &str) -> Result<(), String> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "content": html_to_markdown(message) }))
            .send()
            .await
            .map_err(|e| format!("Failed to send Discord message: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Discord webhook returned {}", response.status()));
        }
        Ok(())
    }
}
