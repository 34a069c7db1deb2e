//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI. `Services` wires the
//! configured collaborators once so commands only deal with the traits.

pub mod greet;
pub mod pending;
pub mod preview;
pub mod send;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::catalog::sheets::SheetsCatalog;
use crate::channel::TelegramChannel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::google_auth::ServiceAccountAuth;
use crate::shortener::HttpShortener;

/// Collaborators built from configuration.
pub struct Services {
    pub catalog: SheetsCatalog,
    pub channel: TelegramChannel,
    pub shortener: Option<HttpShortener>,
    pub greeting: String,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = &config.settings;
        let creds = &config.credentials;

        let http = Client::builder()
            .user_agent(format!("promo_dispatch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client error: {}", e)))?;

        let auth = Arc::new(ServiceAccountAuth::new(http.clone(), creds.api_sheets.clone()));
        let catalog = SheetsCatalog::new(http.clone(), auth, &creds.sheet_url)?
            .with_base_url(settings.sheets_api_url.clone())
            .with_range(settings.sheet_range.clone())
            .with_columns(settings.columns.clone())
            .with_sent_marker(settings.sent_marker.clone());

        let channel = TelegramChannel::new(
            http.clone(),
            creds.telegram.bot_token.clone(),
            creds.telegram.chat_id.clone(),
        )?
        .with_base_url(settings.telegram_api_url.clone());

        let shortener = match (&creds.shortener_url, settings.shorten_links) {
            (Some(url), true) => Some(HttpShortener::new(
                http,
                url.clone(),
                creds.shortener_token.clone(),
            )),
            _ => None,
        };

        Ok(Self {
            catalog,
            channel,
            shortener,
            greeting: settings.greeting.clone(),
        })
    }
}
