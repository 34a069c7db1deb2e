//! Configuration for the promotion dispatcher
//!
//! Secrets come from a base64 credentials bundle in `GSPREAD_JSON_BASE64`
//! (from the environment or a local `.env`). Tunables come from an optional
//! `promo.yml` settings file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::catalog::sheets::RangeOrigin;
use crate::catalog::{ColumnNames, DEFAULT_SENT_MARKER};
use crate::error::{Error, Result};

/// Env var holding the base64-encoded credentials JSON.
pub const CREDENTIALS_ENV: &str = "GSPREAD_JSON_BASE64";
pub const DEFAULT_SETTINGS_FILE: &str = "promo.yml";
pub const DEFAULT_GREETING: &str = "Fala pessoal! Promoções novas hoje!";
pub const DEFAULT_SHEET_RANGE: &str = "A:Z";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Google service account key, as exported from the cloud console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct TelegramCredentials {
    pub bot_token: String,
    /// Destination chat: numeric id (`-100…`) or `@channelname`.
    #[serde(rename = "chat_id_prod", deserialize_with = "deserialize_string_or_number")]
    pub chat_id: String,
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Decoded credentials bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub api_sheets: ServiceAccountKey,
    pub telegram: TelegramCredentials,
    /// Spreadsheet URL (or bare spreadsheet id).
    #[serde(rename = "planilha")]
    pub sheet_url: String,
    /// Link shortener endpoint; shortening is skipped when absent.
    #[serde(rename = "encurtador", default)]
    pub shortener_url: Option<String>,
    #[serde(rename = "encurtador_token", default)]
    pub shortener_token: Option<String>,
}

impl Credentials {
    /// Read and decode the bundle from `GSPREAD_JSON_BASE64`.
    pub fn from_env() -> Result<Self> {
        let encoded = std::env::var(CREDENTIALS_ENV).map_err(|_| {
            Error::Credentials(format!(
                "environment variable '{}' is not set (define it in the deployment or in .env)",
                CREDENTIALS_ENV
            ))
        })?;
        Self::decode(&encoded)
    }

    /// Decode a base64 bundle.
    pub fn decode(encoded: &str) -> Result<Self> {
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(Error::Credentials(format!("'{}' is empty", CREDENTIALS_ENV)));
        }

        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| Error::Credentials(format!("not valid base64: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| Error::Credentials(format!("decoded bundle is not UTF-8: {}", e)))?;

        Self::from_json(&json)
    }

    /// Parse the plain JSON bundle.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut creds: Credentials = serde_json::from_str(json)
            .map_err(|e| Error::Credentials(format!("invalid credentials JSON: {}", e)))?;

        // Keys pasted through env panels often carry literal "\n" sequences.
        creds.api_sheets.private_key = creds.api_sheets.private_key.replace("\\n", "\n");
        creds.shortener_url = creds.shortener_url.filter(|u| !u.trim().is_empty());
        creds.shortener_token = creds.shortener_token.filter(|t| !t.trim().is_empty());

        if creds.telegram.bot_token.trim().is_empty() {
            return Err(Error::Credentials("telegram.bot_token is empty".to_string()));
        }
        if creds.telegram.chat_id.trim().is_empty() {
            return Err(Error::Credentials("telegram.chat_id_prod is empty".to_string()));
        }
        if creds.sheet_url.trim().is_empty() {
            return Err(Error::Credentials("planilha is empty".to_string()));
        }

        Ok(creds)
    }
}

/// Tunables from `promo.yml`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub columns: ColumnNames,
    pub sent_marker: String,
    /// Opener sent before the promotion; empty disables it.
    pub greeting: String,
    pub sheet_range: String,
    pub http_timeout_secs: u64,
    pub shorten_links: bool,
    pub telegram_api_url: String,
    pub sheets_api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            sent_marker: DEFAULT_SENT_MARKER.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            sheet_range: DEFAULT_SHEET_RANGE.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            shorten_links: true,
            telegram_api_url: TELEGRAM_API_URL.to_string(),
            sheets_api_url: SHEETS_API_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, `promo.yml` in the working
    /// directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Settings = serde_yaml::from_str(content)?;
        let settings = settings.resolve_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve `${VAR}` placeholders in every text setting.
    fn resolve_env(mut self) -> Self {
        let columns = &mut self.columns;
        for name in [
            &mut columns.name,
            &mut columns.old_price,
            &mut columns.promo_price,
            &mut columns.coupon,
            &mut columns.phrase,
            &mut columns.image,
            &mut columns.link,
            &mut columns.status,
        ] {
            *name = resolve_env_string(std::mem::take(name));
        }
        self.sent_marker = resolve_env_string(self.sent_marker);
        self.greeting = resolve_env_string(self.greeting);
        self.sheet_range = resolve_env_string(self.sheet_range);
        self.telegram_api_url = resolve_env_string(self.telegram_api_url);
        self.sheets_api_url = resolve_env_string(self.sheets_api_url);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.sent_marker.trim().is_empty() {
            return Err(Error::Config("sent_marker must not be empty".to_string()));
        }
        if self.sheet_range.trim().is_empty() {
            return Err(Error::Config("sheet_range must not be empty".to_string()));
        }
        RangeOrigin::parse(&self.sheet_range)?;
        if self.http_timeout_secs == 0 {
            return Err(Error::Config("http_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Replace a `${VAR}` value with the environment variable, if set.
fn resolve_env_string(value: String) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        if let Ok(env_val) = std::env::var(var_name) {
            return env_val;
        }
    }
    value
}

/// Everything a dispatch run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub settings: Settings,
}

impl Config {
    /// Load the settings file and the credentials bundle. Call
    /// [`load_dotenv`] first to pick up a local `.env`.
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        let settings = Settings::load(settings_path)?;
        let credentials = Credentials::from_env()?;
        Ok(Self {
            credentials,
            settings,
        })
    }
}

/// Load .env file into environment variables using dotenvy
pub fn load_dotenv() {
    // Try to load from current directory first, then parent
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("../.env");
    }
}
