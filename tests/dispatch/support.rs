//! Recording fakes for the channel and shortener seams.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use promo_dispatch::catalog::{DeliveryStatus, PromotionalItem};
use promo_dispatch::{Channel, Error, LinkShortener, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Post {
    Text(String),
    Photo { photo: String, caption: String },
}

impl Post {
    pub fn body(&self) -> &str {
        match self {
            Post::Text(text) => text,
            Post::Photo { caption, .. } => caption,
        }
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    posts: Mutex<Vec<Post>>,
    fail: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    fn record(&self, post: Post) -> Result<()> {
        self.posts.lock().unwrap().push(post);
        if self.fail {
            return Err(Error::DeliveryFailed("403 Forbidden: bot was kicked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.record(Post::Text(text.to_string()))
    }

    async fn send_photo(&self, photo: &str, caption: &str) -> Result<()> {
        self.record(Post::Photo {
            photo: photo.to_string(),
            caption: caption.to_string(),
        })
    }
}

pub struct FailingShortener;

#[async_trait]
impl LinkShortener for FailingShortener {
    async fn shorten(&self, _url: &str) -> Result<String> {
        Err(Error::ShortenFailed("connection refused".to_string()))
    }
}

pub fn tenis() -> PromotionalItem {
    PromotionalItem {
        row: 2,
        name: "Tênis X".to_string(),
        old_price: "R$200".to_string(),
        promo_price: "R$99".to_string(),
        coupon: "FROG10".to_string(),
        phrase: "Corre que acaba!".to_string(),
        image: "http://img.test/tenis.jpg".to_string(),
        link: "http://x.test/a".to_string(),
        status: DeliveryStatus::Pending,
    }
}

pub fn sent(row: u32) -> PromotionalItem {
    PromotionalItem {
        row,
        name: format!("Produto {}", row),
        promo_price: "R$10".to_string(),
        link: format!("http://x.test/{}", row),
        status: DeliveryStatus::Sent,
        ..Default::default()
    }
}
