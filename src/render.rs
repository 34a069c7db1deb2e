//! Caption rendering for promotional posts (Telegram HTML parse mode).

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::catalog::PromotionalItem;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9A-Fa-f]+)|[A-Za-z]+);").expect("entity regex")
});

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Length of an HTML body as Telegram measures it: UTF-16 code units of the
/// text left after tags are removed and entities decoded.
pub fn visible_len(html: &str) -> usize {
    let text = TAG_RE.replace_all(html, "");
    let text = ENTITY_RE.replace_all(&text, |caps: &Captures| {
        caps.get(1)
            .and_then(|dec| dec.as_str().parse::<u32>().ok())
            .or_else(|| caps.get(2).and_then(|hex| u32::from_str_radix(hex.as_str(), 16).ok()))
            .and_then(char::from_u32)
            .unwrap_or('?')
            .to_string()
    });
    text.encode_utf16().count()
}

/// Render the post body for `item`, pointing at `link`.
///
/// `link` is passed separately because it may be a shortened form of
/// `item.link`. Lines for an empty phrase, old price or coupon are left out.
pub fn render_caption(item: &PromotionalItem, link: &str) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(12);

    if !item.phrase.is_empty() {
        lines.push(format!("{} 🐸", escape_html(&item.phrase)));
        lines.push(String::new());
    }

    lines.push(format!("<b>{}</b>", escape_html(&item.name)));
    lines.push(String::new());

    if !item.old_price.is_empty() {
        lines.push(format!("De: <s>{}</s>", escape_html(&item.old_price)));
        lines.push(String::new());
    }

    lines.push(format!("<b>Por: {} 😍</b>", escape_html(&item.promo_price)));
    if !item.coupon.is_empty() {
        lines.push(format!("<i>CUPOM: {} ✨</i>", escape_html(&item.coupon)));
    }

    lines.push(String::new());
    lines.push("Compre aqui:".to_string());
    lines.push(format!("🛍️ {}", escape_html(link)));

    lines.join("\n")
}
