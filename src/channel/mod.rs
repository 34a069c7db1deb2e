//! Messaging channel the promotions are broadcast to.

pub mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use telegram::TelegramChannel;

/// Longest caption Telegram accepts on a photo.
pub const CAPTION_LIMIT: usize = 1024;

/// Send primitives of a broadcast destination. Bodies use HTML markup.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Send an image (URL or file id) with a caption.
    async fn send_photo(&self, photo: &str, caption: &str) -> Result<()>;
}
