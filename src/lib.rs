//! Promotion broadcaster library
//!
//! Reads promotion rows from a Google Sheets catalog, posts the next pending
//! one to a Telegram channel and marks the row as sent:
//! - `catalog`: spreadsheet rows with a delivery status (Sheets or in-memory)
//! - `dispatch`: the single select → render → deliver → acknowledge cycle
//! - `channel`: Telegram Bot API delivery
//! - `shortener`: optional link shortening with fallback to the original link
//! - `config`: base64 credentials bundle and `promo.yml` settings

pub mod catalog;
pub mod channel;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod google_auth;
pub mod metrics;
pub mod render;
pub mod shortener;

// Re-export common types
pub use catalog::{CatalogSource, DeliveryStatus, PromotionalItem};
pub use channel::{Channel, TelegramChannel};
pub use config::{Config, Credentials, Settings};
pub use dispatch::{run_once, DispatchOutcome, DispatchResult, Dispatcher};
pub use error::{Error, Result};
pub use shortener::{HttpShortener, LinkShortener};
