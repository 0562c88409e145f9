use crate::error::NotifyError;
use async_trait::async_trait;
use tracing::{info, warn};

pub mod slack;

pub use slack::SlackNotifier;

/// Outbound chat notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sends `text` and swallows any failure; notification never affects a run.
pub async fn notify_best_effort(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.notify(text).await {
        Ok(()) => {
            info!("Notification sent");
            true
        }
        Err(err) => {
            warn!(error = %err, "Failed to send notification");
            false
        }
    }
}
