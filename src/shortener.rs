//! Optional link shortening before a promotion is posted.
//!
//! Talks to a batch shorten endpoint: `POST {"urls":[{"url": ...}]}` answered
//! with `{"summary": {...}, "items": [{"long_url", "code", "short_url"}]}`,
//! where a failed item carries an `error` object instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[async_trait]
pub trait LinkShortener: Send + Sync {
    /// Return a short URL for `url`.
    async fn shorten(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpShortener {
    http: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpShortener {
    pub fn new<S: Into<String>>(http: Client, endpoint: S, token: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl LinkShortener for HttpShortener {
    async fn shorten(&self, url: &str) -> Result<String> {
        let request = ShortenRequest {
            urls: vec![UrlItem { url }],
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::ShortenFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::ShortenFailed(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::ShortenFailed(format!(
                "shortener returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body: ShortenResponse = serde_json::from_str(&text)
            .map_err(|e| Error::ShortenFailed(format!("invalid response: {}", e)))?;

        match body.items.into_iter().next() {
            Some(ShortenResultItem::Success { short_url, .. }) if !short_url.trim().is_empty() => {
                Ok(short_url)
            }
            Some(ShortenResultItem::Success { .. }) => {
                Err(Error::ShortenFailed("empty short_url".to_string()))
            }
            Some(ShortenResultItem::Error { error, .. }) => Err(Error::ShortenFailed(format!(
                "{}: {}",
                error.code, error.message
            ))),
            None => Err(Error::ShortenFailed("response has no items".to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    urls: Vec<UrlItem<'a>>,
}

#[derive(Debug, Serialize)]
struct UrlItem<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    items: Vec<ShortenResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShortenResultItem {
    Success {
        #[allow(dead_code)]
        long_url: String,
        short_url: String,
    },
    Error {
        #[allow(dead_code)]
        long_url: String,
        error: ErrorInfo,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn shortener(server: &MockServer, token: Option<&str>) -> HttpShortener {
        HttpShortener::new(
            Client::new(),
            server.url("/api/shorten"),
            token.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn shorten_returns_short_url() {
        let server = MockServer::start_async().await;

        let shorten_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/shorten")
                .header("authorization", "Bearer s3cret")
                .json_body(serde_json::json!({ "urls": [ { "url": "http://x.test/a" } ] }));
            then.status(200).json_body(serde_json::json!({
                "summary": { "total": 1, "successful": 1, "failed": 0 },
                "items": [ {
                    "long_url": "http://x.test/a",
                    "code": "Ab12",
                    "short_url": "https://s.test/Ab12"
                } ]
            }));
        });

        let short = shortener(&server, Some("s3cret"))
            .shorten("http://x.test/a")
            .await
            .expect("short url");

        assert_eq!(short, "https://s.test/Ab12");
        shorten_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn shorten_surfaces_item_error() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/api/shorten");
            then.status(200).json_body(serde_json::json!({
                "summary": { "total": 1, "successful": 0, "failed": 1 },
                "items": [ {
                    "long_url": "notaurl",
                    "error": { "code": "VALIDATION_ERROR", "message": "Invalid URL format", "details": {} }
                } ]
            }));
        });

        let err = shortener(&server, None).shorten("notaurl").await.unwrap_err();

        assert!(matches!(err, Error::ShortenFailed(_)));
        assert!(err.to_string().contains("Invalid URL format"));
    }

    #[tokio::test]
    async fn shorten_surfaces_http_error() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/api/shorten");
            then.status(401).body("unauthorized");
        });

        let err = shortener(&server, None).shorten("http://x.test/a").await.unwrap_err();

        assert!(err.to_string().contains("HTTP 401"));
    }

    #[tokio::test]
    async fn shorten_rejects_empty_items() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/api/shorten");
            then.status(200).json_body(serde_json::json!({ "items": [] }));
        });

        let err = shortener(&server, None).shorten("http://x.test/a").await.unwrap_err();

        assert!(err.to_string().contains("no items"));
    }
}
