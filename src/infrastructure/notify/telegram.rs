use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use super::Notifier;
use crate::shared::errors::NotifyError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API reply envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage` client
pub struct TelegramNotifier {
    http_client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();
        if bot_token.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("bot token"));
        }
        if chat_id.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("chat id"));
        }

        Ok(Self {
            http_client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            api_base: api_base.into(),
            bot_token,
            chat_id,
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.bot_token)
    }
}

/// Map a Bot API reply to a delivery result, keeping the upstream description verbatim
pub fn interpret_response(status: StatusCode, body: &str) -> Result<(), NotifyError> {
    match serde_json::from_str::<TelegramResponse>(body) {
        Ok(reply) if reply.ok && status.is_success() => Ok(()),
        Ok(reply) => Err(NotifyError::Rejected(
            reply.description.unwrap_or_else(|| format!("HTTP {}", status)),
        )),
        Err(_) => Err(NotifyError::Rejected(format!("HTTP {}: {}", status, body.trim()))),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let params = [("chat_id", self.chat_id.as_str()), ("text", text), ("parse_mode", "HTML")];
        // the request URL embeds the bot token, keep it out of error text
        let response = self
            .http_client
            .post(self.send_message_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;
        match interpret_response(status, &body) {
            Ok(()) => {
                info!("✅ Message sent to {}", self.chat_id);
                Ok(())
            }
            Err(e) => {
                error!("❌ Telegram rejected message: {}", e);
                Err(e)
            }
        }
    }
}
