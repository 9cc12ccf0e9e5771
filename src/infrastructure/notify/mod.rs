//! Outbound notification channel

pub mod telegram;

use async_trait::async_trait;
use tracing::info;

use crate::shared::errors::NotifyError;

pub use telegram::TelegramNotifier;

/// Delivers a text message to a fixed destination
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempt delivery once
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Logs messages instead of delivering them (`--dry-run`)
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        info!("📝 Dry run, message not sent:\n{}", text);
        Ok(())
    }
}
