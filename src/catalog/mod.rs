//! Promotion catalog: spreadsheet rows with a per-row delivery status.
//!
//! The catalog is read as a header row followed by data rows. The header
//! decides which column holds which field, so operators can reorder columns
//! freely as long as the names stay the same.

pub mod memory;
pub mod sheets;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Status cell text that marks a row as delivered.
pub const DEFAULT_SENT_MARKER: &str = "ENVIADO";

/// Row of the header in a table handed to [`parse_table`]. Items start
/// right below it; the Sheets catalog shifts rows by where its range starts.
pub const HEADER_ROW: u32 = 1;

/// Read/write access to the promotion catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All rows with their current status, in sheet order.
    async fn load_snapshot(&self) -> Result<Vec<PromotionalItem>>;

    /// Flip a single row to `Sent`.
    ///
    /// Returns [`Error::UpdateConflict`] when the row no longer exists, now
    /// holds a different item, or is already marked as sent.
    async fn mark_sent(&self, row: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
}

impl DeliveryStatus {
    /// Interpret a status cell. Only the sent marker counts as sent.
    pub fn from_cell(cell: &str, sent_marker: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case(sent_marker.trim()) {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Pending
        }
    }

    pub fn is_pending(self) -> bool {
        self == DeliveryStatus::Pending
    }
}

/// One catalog row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionalItem {
    /// 1-based sheet row number; stable for the lifetime of the row.
    pub row: u32,
    pub name: String,
    pub old_price: String,
    pub promo_price: String,
    pub coupon: String,
    pub phrase: String,
    /// Image URL (or Telegram file id) sent along with the caption.
    pub image: String,
    pub link: String,
    pub status: DeliveryStatus,
}

/// Header names of the catalog columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub old_price: String,
    pub promo_price: String,
    pub coupon: String,
    pub phrase: String,
    pub image: String,
    pub link: String,
    pub status: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "NOME".to_string(),
            old_price: "VALOR_ANTIGO".to_string(),
            promo_price: "VALOR_PROMO".to_string(),
            coupon: "CUPOM".to_string(),
            phrase: "FRASE".to_string(),
            image: "IMAGEM".to_string(),
            link: "LINK".to_string(),
            status: "STATUS".to_string(),
        }
    }
}

/// Column indices resolved from a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: usize,
    pub old_price: Option<usize>,
    pub promo_price: usize,
    pub coupon: Option<usize>,
    pub phrase: Option<usize>,
    pub image: Option<usize>,
    pub link: usize,
    pub status: usize,
    /// Number of header cells.
    pub width: usize,
}

impl ColumnLayout {
    /// Resolve column positions. Name, promo price, link and status are required.
    pub fn resolve(header: &[String], names: &ColumnNames) -> Result<Self> {
        let find = |wanted: &str| {
            header
                .iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(wanted.trim()))
        };
        let require = |wanted: &str| {
            find(wanted).ok_or_else(|| {
                Error::SourceUnavailable(format!("header has no '{}' column", wanted))
            })
        };

        Ok(Self {
            name: require(&names.name)?,
            old_price: find(&names.old_price),
            promo_price: require(&names.promo_price)?,
            coupon: find(&names.coupon),
            phrase: find(&names.phrase),
            image: find(&names.image),
            link: require(&names.link)?,
            status: require(&names.status)?,
            width: header.len(),
        })
    }

    /// Build an item from one data row. Short rows read as empty cells.
    pub fn item(&self, row: u32, cells: &[String], sent_marker: &str) -> PromotionalItem {
        let cell = |idx: usize| cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();
        let optional = |idx: Option<usize>| idx.map(cell).unwrap_or_default();

        PromotionalItem {
            row,
            name: cell(self.name),
            old_price: optional(self.old_price),
            promo_price: cell(self.promo_price),
            coupon: optional(self.coupon),
            phrase: optional(self.phrase),
            image: optional(self.image),
            link: cell(self.link),
            status: DeliveryStatus::from_cell(&cell(self.status), sent_marker),
        }
    }
}

/// Parse a header-first table into items.
///
/// Fully blank rows are skipped but still consume a row number, so item
/// rows always match their position in the sheet.
pub fn parse_table(
    table: &[Vec<String>],
    names: &ColumnNames,
    sent_marker: &str,
) -> Result<(ColumnLayout, Vec<PromotionalItem>)> {
    let (header, rows) = table
        .split_first()
        .ok_or_else(|| Error::SourceUnavailable("sheet is empty, no header row".to_string()))?;

    let layout = ColumnLayout::resolve(header, names)?;
    let items = rows
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(idx, cells)| layout.item(HEADER_ROW + 1 + idx as u32, cells, sent_marker))
        .collect();

    Ok((layout, items))
}
