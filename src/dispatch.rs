//! One dispatch cycle: pick the next pending promotion, post it, mark it sent.
//!
//! A cycle never loops and never retries. Running it again later is the
//! retry. Delivery happens before acknowledgement, so a crash between the two
//! costs at most one duplicate post and never a lost one.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{CatalogSource, PromotionalItem};
use crate::channel::{Channel, CAPTION_LIMIT};
use crate::render::{escape_html, render_caption, visible_len};
use crate::shortener::LinkShortener;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchOutcome {
    /// Delivered and acknowledged.
    Sent,
    /// Every row is already sent. Not an error.
    NothingPending,
    /// Channel rejected the post; the row stays pending.
    DeliveryFailed,
    /// Posted, but the status write failed; the next cycle may post it again.
    AckFailed,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::NothingPending => "nothing_pending",
            DispatchOutcome::DeliveryFailed => "delivery_failed",
            DispatchOutcome::AckFailed => "ack_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    pub item: Option<PromotionalItem>,
    /// Link that went into the post (shortened or original).
    pub link: Option<String>,
    /// Display text of the delivery or acknowledgement error.
    pub error: Option<String>,
}

impl DispatchResult {
    fn nothing_pending() -> Self {
        Self {
            outcome: DispatchOutcome::NothingPending,
            item: None,
            link: None,
            error: None,
        }
    }
}

/// Next item to post: the pending row with the lowest row number.
pub fn select_next(items: &[PromotionalItem]) -> Option<&PromotionalItem> {
    items
        .iter()
        .filter(|item| item.status.is_pending())
        .min_by_key(|item| item.row)
}

/// Post `greeting` as a text message. An empty greeting is a no-op.
pub async fn send_greeting(channel: &dyn Channel, greeting: &str) -> Result<bool> {
    let greeting = greeting.trim();
    if greeting.is_empty() {
        return Ok(false);
    }
    channel.send_text(&escape_html(greeting)).await?;
    Ok(true)
}

/// Runs dispatch cycles against explicitly provided collaborators.
pub struct Dispatcher<'a> {
    catalog: &'a dyn CatalogSource,
    channel: &'a dyn Channel,
    shortener: Option<&'a dyn LinkShortener>,
    greeting: Option<&'a str>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, channel: &'a dyn Channel) -> Self {
        Self {
            catalog,
            channel,
            shortener: None,
            greeting: None,
        }
    }

    pub fn with_shortener(mut self, shortener: &'a dyn LinkShortener) -> Self {
        self.shortener = Some(shortener);
        self
    }

    /// Opener posted right before the promotion. Only sent once the catalog
    /// was read and has a pending item; a failed greeting does not stop the
    /// cycle.
    pub fn with_greeting(mut self, greeting: &'a str) -> Self {
        self.greeting = Some(greeting);
        self
    }

    /// Link to post for `item`. Shortening failures fall back to the original.
    pub async fn resolve_link(&self, item: &PromotionalItem) -> String {
        let Some(shortener) = self.shortener else {
            return item.link.clone();
        };
        if item.link.trim().is_empty() {
            return item.link.clone();
        }

        match shortener.shorten(&item.link).await {
            Ok(short) => short,
            Err(e) => {
                warn!(row = item.row, link = %item.link, error = %e, "Shortening failed, using original link");
                item.link.clone()
            }
        }
    }

    /// Render the next pending item without sending or writing anything.
    pub async fn preview(&self) -> Result<Option<(PromotionalItem, String)>> {
        let items = self.catalog.load_snapshot().await?;
        let Some(item) = select_next(&items).cloned() else {
            return Ok(None);
        };
        let link = self.resolve_link(&item).await;
        let caption = render_caption(&item, &link);
        Ok(Some((item, caption)))
    }

    /// Perform one select → render → deliver → acknowledge pass.
    ///
    /// Only an unreadable catalog is returned as `Err`; delivery and
    /// acknowledgement failures are reported through the outcome.
    pub async fn run_once(&self) -> Result<DispatchResult> {
        let items = self.catalog.load_snapshot().await?;

        let Some(item) = select_next(&items).cloned() else {
            info!(rows = items.len(), "No pending promotions");
            return Ok(DispatchResult::nothing_pending());
        };

        if let Some(greeting) = self.greeting {
            match send_greeting(self.channel, greeting).await {
                Ok(true) => info!("Greeting sent"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Greeting failed"),
            }
        }

        let link = self.resolve_link(&item).await;
        let caption = render_caption(&item, &link);

        let delivery = if !item.image.is_empty() && visible_len(&caption) <= CAPTION_LIMIT {
            self.channel.send_photo(&item.image, &caption).await
        } else {
            self.channel.send_text(&caption).await
        };

        if let Err(e) = delivery {
            warn!(row = item.row, name = %item.name, error = %e, "Delivery failed, row stays pending");
            return Ok(DispatchResult {
                outcome: DispatchOutcome::DeliveryFailed,
                item: Some(item),
                link: Some(link),
                error: Some(e.to_string()),
            });
        }

        info!(row = item.row, name = %item.name, "Promotion sent");

        if let Err(e) = self.catalog.mark_sent(item.row).await {
            warn!(
                row = item.row,
                error = %e,
                "Promotion sent but status not recorded; next cycle may repeat it"
            );
            return Ok(DispatchResult {
                outcome: DispatchOutcome::AckFailed,
                item: Some(item),
                link: Some(link),
                error: Some(e.to_string()),
            });
        }

        Ok(DispatchResult {
            outcome: DispatchOutcome::Sent,
            item: Some(item),
            link: Some(link),
            error: None,
        })
    }
}

/// One cycle without link shortening.
pub async fn run_once(
    catalog: &dyn CatalogSource,
    channel: &dyn Channel,
) -> Result<DispatchResult> {
    Dispatcher::new(catalog, channel).run_once().await
}
