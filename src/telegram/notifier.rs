//! Outbound chat messages.
//!
//! [`Notifier`] is transport-agnostic; [`TelegramNotifier`] implements it via
//! teloxide and [`LogNotifier`] only logs (used when no bot token is set).

use async_trait::async_trait;
use teloxide::{prelude::*, types::ChatId};
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};

/// Telegram's hard limit on message length
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send(&self, chat_id: i64, text: &str) -> AppResult<()>;
}

/// Send and log failures; callers never see the error
pub async fn send_logged(notifier: &dyn Notifier, chat_id: i64, text: &str) {
    if let Err(e) = notifier.send(chat_id, text).await {
        warn!(chat_id, code = e.code_str(), "⚠️ Telegram send failed: {}", e.message);
    }
}

/// Cut to Telegram's length limit on a char boundary
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    out.push('…');
    out
}

pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    /// Creates a notifier using the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Point Telegram at `<base>/webhook`, with the secret header when set
    pub async fn register_webhook(&self, endpoint: &str, secret: Option<&str>) -> AppResult<()> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| AppError::invalid_value("WEBHOOK_URL", &e.to_string()))?;
        let mut req = self.bot.set_webhook(url).drop_pending_updates(true);
        if let Some(secret) = secret {
            req = req.secret_token(secret.to_string());
        }
        req.await.map_err(|e| {
            AppError::new(ErrorCode::TelegramWebhookFailed, format!("setWebhook failed: {}", e))
        })?;
        info!(endpoint = %endpoint, "🔔 Telegram webhook registered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.bot
            .send_message(ChatId(chat_id), truncate_message(text))
            .await
            .map_err(|e| AppError::telegram(e.to_string()))?;
        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> AppResult<()> {
        info!(chat_id, "💬 {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_notifier_new() {
        let _n = TelegramNotifier::new("dummy_token");
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("hi"), "hi");
        let long = "x".repeat(5000);
        let cut = truncate_message(&long);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_CHARS);
        assert!(cut.ends_with('…'));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.send(1, "hello").await.is_ok());
        send_logged(&LogNotifier, 1, "hello").await;
    }
}
