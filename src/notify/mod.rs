//! Chat delivery.
//!
//! Defines the `Notifier` trait with a Telegram implementation and a
//! log-only implementation used in dry-run mode.

pub mod format;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Abstraction over outbound chat channels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a preformatted message.
    async fn send(&self, text: &str) -> Result<()>;
}

/// Writes messages to the log instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!(chars = text.chars().count(), "Dry run, message not sent:\n{text}");
        Ok(())
    }
}
