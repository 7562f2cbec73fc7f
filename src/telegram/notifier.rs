use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::error::WatchResult;

/// Trait that every notification sink must implement.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a plain text message to the channel.
    async fn send_text(&self, message: &str) -> WatchResult<()>;

    /// Post an image from disk with a caption.
    async fn send_photo(&self, photo_path: &Path, caption: &str) -> WatchResult<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Logs notifications instead of delivering them.
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send_text(&self, message: &str) -> WatchResult<()> {
        info!("[dry-run] text: {}", message);
        Ok(())
    }

    async fn send_photo(&self, photo_path: &Path, caption: &str) -> WatchResult<()> {
        info!("[dry-run] photo {}: {}", photo_path.display(), caption);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
