//! Google Sheets catalog (Sheets API v4 values endpoints).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_table, CatalogSource, ColumnLayout, ColumnNames, PromotionalItem, HEADER_ROW};
use crate::config::{DEFAULT_SHEET_RANGE, SHEETS_API_URL};
use crate::google_auth::TokenProvider;
use crate::{Error, Result};

static SPREADSHEET_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("spreadsheet url regex")
});

static A1_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{1,3})?([0-9]+)?(?::[A-Za-z]{0,3}[0-9]*)?$").expect("a1 range regex")
});

/// Extract the spreadsheet id from a sheet URL. A bare id is returned as is.
pub fn spreadsheet_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();
    if let Some(caps) = SPREADSHEET_URL_RE.captures(trimmed) {
        return Ok(caps[1].to_string());
    }
    if !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Ok(trimmed.to_string());
    }
    Err(Error::Config(format!(
        "'{}' is not a Google Sheets URL or spreadsheet id",
        url_or_id
    )))
}

/// A1 column letters for a 0-based column index (0 → A, 25 → Z, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 0-based column index of A1 column letters (A → 0, AA → 26).
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + (b.to_ascii_uppercase() - b'A') as usize + 1)
        - 1
}

/// Top-left corner of the configured range: the header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOrigin {
    /// Sheet-name prefix including the `!`, or empty for the first sheet.
    pub sheet: String,
    /// 0-based column of the first header cell.
    pub column: usize,
    /// 1-based sheet row of the header.
    pub row: u32,
}

impl RangeOrigin {
    /// Parse an A1 range such as `A:Z`, `B:I`, `A3:H`, `Promo!C2:J` or a bare
    /// sheet name. Missing column or row means column A or row 1.
    pub fn parse(range: &str) -> Result<Self> {
        let range = range.trim();
        let (sheet, cells) = match range.rfind('!') {
            Some(pos) => (range[..=pos].to_string(), &range[pos + 1..]),
            None if A1_RANGE_RE.is_match(range) => (String::new(), range),
            None => (format!("{}!", range), ""),
        };

        let caps = A1_RANGE_RE.captures(cells).ok_or_else(|| {
            Error::Config(format!("'{}' is not a valid A1 range", range))
        })?;
        let column = caps.get(1).map(|m| column_index(m.as_str())).unwrap_or(0);
        let row = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .ok()
                .filter(|r| *r >= 1)
                .ok_or_else(|| Error::Config(format!("'{}' has an invalid start row", range)))?,
            None => HEADER_ROW,
        };

        Ok(Self { sheet, column, row })
    }

    /// A1 address of `offset` columns right of the header start, on `row`.
    fn cell(&self, offset: usize, row: u32) -> String {
        format!("{}{}", column_letter(self.column + offset), row)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SheetsCatalog {
    http: Client,
    auth: Arc<dyn TokenProvider>,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    columns: ColumnNames,
    sent_marker: String,
    last_snapshot: Mutex<Option<LastSnapshot>>,
}

/// What the last snapshot saw, used to check a row before writing to it.
#[derive(Debug, Clone)]
struct LastSnapshot {
    layout: ColumnLayout,
    /// Name and link of every item, keyed by row.
    identities: HashMap<u32, (String, String)>,
}

impl SheetsCatalog {
    pub fn new(http: Client, auth: Arc<dyn TokenProvider>, sheet_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            auth,
            base_url: SHEETS_API_URL.to_string(),
            spreadsheet_id: spreadsheet_id(sheet_url)?,
            range: DEFAULT_SHEET_RANGE.to_string(),
            columns: ColumnNames::default(),
            sent_marker: super::DEFAULT_SENT_MARKER.to_string(),
            last_snapshot: Mutex::new(None),
        })
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// A1 range holding header and items. The header is the first row of the
    /// range. Without a sheet name the first visible sheet is used.
    pub fn with_range<S: Into<String>>(mut self, range: S) -> Self {
        self.range = range.into();
        self
    }

    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_sent_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.sent_marker = marker.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    async fn token(&self) -> Result<String> {
        self.auth
            .access_token()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("authentication failed: {}", e)))
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let token = self.token().await?;
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Sheets request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("failed to read Sheets response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!(
                "Sheets returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body: ValueRange = serde_json::from_str(&text)
            .map_err(|e| Error::SourceUnavailable(format!("invalid Sheets response: {}", e)))?;

        Ok(body
            .values
            .unwrap_or_default()
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn put_value(&self, cell: &str, value: &str) -> Result<()> {
        let token = self.token().await?;
        let body = ValueRangeUpdate {
            range: cell,
            major_dimension: "ROWS",
            values: [[value]],
        };

        let response = self
            .http
            .put(self.values_url(cell))
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Sheets update failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::SourceUnavailable(format!(
                "Sheets update returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    /// The last snapshot, loading one if none was taken yet.
    async fn last_snapshot(&self) -> Result<LastSnapshot> {
        if let Some(snapshot) = self.cached_snapshot() {
            return Ok(snapshot);
        }
        self.load_snapshot().await?;
        self.cached_snapshot()
            .ok_or_else(|| Error::SourceUnavailable("column layout unavailable".to_string()))
    }

    fn cached_snapshot(&self) -> Option<LastSnapshot> {
        self.last_snapshot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl CatalogSource for SheetsCatalog {
    async fn load_snapshot(&self) -> Result<Vec<PromotionalItem>> {
        let origin = RangeOrigin::parse(&self.range)?;
        let table = self.get_values(&self.range).await?;
        let (layout, mut items) = parse_table(&table, &self.columns, &self.sent_marker)?;

        // parse_table numbers rows as if the header sat on row 1.
        for item in &mut items {
            item.row += origin.row - HEADER_ROW;
        }

        debug!(
            spreadsheet = %self.spreadsheet_id,
            rows = items.len(),
            "Loaded catalog snapshot"
        );

        let identities = items
            .iter()
            .map(|item| (item.row, (item.name.clone(), item.link.clone())))
            .collect();
        if let Ok(mut guard) = self.last_snapshot.lock() {
            *guard = Some(LastSnapshot { layout, identities });
        }
        Ok(items)
    }

    async fn mark_sent(&self, row: u32) -> Result<()> {
        let origin = RangeOrigin::parse(&self.range)?;
        if row <= origin.row {
            return Err(Error::InvalidArgument(format!(
                "row {} is not an item row",
                row
            )));
        }

        let snapshot = self.last_snapshot().await?;
        let layout = &snapshot.layout;

        // Re-read the row right before writing so a concurrent edit is noticed.
        let current = self
            .get_values(&format!(
                "{}{}:{}",
                origin.sheet,
                origin.cell(0, row),
                origin.cell(layout.width.saturating_sub(1), row)
            ))
            .await?;
        let cells = current.into_iter().next().unwrap_or_default();
        if cells.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::UpdateConflict(format!("row {} no longer exists", row)));
        }

        // Rows shift up when an operator deletes a row above this one.
        let item = layout.item(row, &cells, &self.sent_marker);
        match snapshot.identities.get(&row) {
            Some((name, link)) if *name == item.name && *link == item.link => {}
            Some(_) => {
                return Err(Error::UpdateConflict(format!(
                    "row {} changed since the snapshot",
                    row
                )))
            }
            None => {
                return Err(Error::UpdateConflict(format!(
                    "row {} was not in the last snapshot",
                    row
                )))
            }
        }

        if !item.status.is_pending() {
            return Err(Error::UpdateConflict(format!("row {} already sent", row)));
        }

        let cell = format!("{}{}", origin.sheet, origin.cell(layout.status, row));
        self.put_value(&cell, &self.sent_marker).await?;

        info!(row, cell = %cell, "Marked row as sent");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: [[&'a str; 1]; 1],
}
