use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::error::{NotifierError, Result};

#[derive(Debug, Deserialize)]
struct BotApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Minimal Telegram Bot API client; only `sendMessage` is needed.
pub struct TelegramBot {
    http: Client,
    send_message_url: String,
}

impl TelegramBot {
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NotifierError::Configuration("Telegram bot token is empty".into()));
        }
        if token.contains(char::is_whitespace) || token.contains('/') {
            return Err(NotifierError::Configuration(
                "Telegram bot token contains invalid characters".into(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Configuration(format!("failed to build Telegram client: {e}")))?;

        Ok(Self {
            http,
            send_message_url: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token),
        })
    }

    /// Sends `text` to `chat_id`. The URL embeds the token, so it is stripped
    /// from transport errors before they are reported.
    pub async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.send_message_url)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| NotifierError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let reply = response.json::<BotApiReply>().await.ok();

        match reply {
            Some(BotApiReply { ok: true, .. }) if status.is_success() => Ok(()),
            Some(BotApiReply { description: Some(description), .. }) => Err(NotifierError::Delivery(
                format!("Bot API answered {status}: {description}"),
            )),
            _ => Err(NotifierError::Delivery(format!("Bot API answered {status}"))),
        }
    }
}

/// Best-effort delivery: failures are logged and swallowed so a broken chat
/// never stops the poll loop.
pub async fn send_message(bot: &TelegramBot, chat_id: &str, message: &str) {
    info!(chat_id, "✉️ Sending message: {message}");
    match bot.send(chat_id, message).await {
        Ok(()) => debug!(chat_id, "Bot sent message: {message}"),
        Err(e) => error!(chat_id, error = %e, "❌ Telegram delivery failed"),
    }
}
