//! Full-browser rendering as a last-resort strategy.
//!
//! A [`HeadlessRenderer`] hands back the serialized DOM after client-side
//! rendering settles; [`extract_rendered`] then runs the meta and price
//! selector queries over it. The Chromium implementation is behind the
//! `headless` feature.

#[cfg(feature = "headless")]
mod chromium;

use std::sync::LazyLock;

use futures::future::BoxFuture;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

use crate::fields::{clean_text, ProductFields};
use crate::price::RawPrice;
use crate::structured::{element_text, meta_content, IMAGE_META_KEYS};

#[cfg(feature = "headless")]
pub use chromium::ChromiumRenderer;

/// Price containers tried in order; the first element whose text has a
/// digit wins.
const PRICE_SELECTORS: [&str; 5] = [
    r#"[class*="price"]"#,
    r#"[class*="current-price"]"#,
    r#"[class*="product-price"]"#,
    r#"[data-sqe="price"]"#,
    "._3e_UQT",
];

static PRICE_SELECTOR_LIST: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    PRICE_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid price selector"))
        .collect()
});
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
static BRL_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"R\$\s*(\d+(?:[.,]\d+)*)").expect("valid amount regex"));
static ANY_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("valid amount regex"));

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("headless rendering is not enabled in this build")]
    Unavailable,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("browser error: {0}")]
    Browser(String),
}

/// The DOM of a page after client-side rendering.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
}

/// Renders one URL in an isolated browser.
///
/// Implementations own the browser for the duration of the call and must
/// release it before the returned future resolves, on success and failure.
pub trait HeadlessRenderer: Send + Sync {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, HeadlessError>>;
}

/// Title and image from meta tags (`og:` then `twitter:`, title falling back
/// to `<title>`); price from the first [`PRICE_SELECTORS`] match with a digit.
#[must_use]
pub fn extract_rendered(html: &str) -> ProductFields {
    let document = Html::parse_document(html);
    let mut fields = ProductFields::default();

    for key in ["og:title", "twitter:title"] {
        if let Some(content) = meta_content(&document, key) {
            fields.offer_title(&content);
        }
    }
    if let Some(title) = document.select(&TITLE).next() {
        fields.offer_title(&element_text(title));
    }
    for key in IMAGE_META_KEYS {
        if let Some(content) = meta_content(&document, key) {
            fields.offer_image(&content);
        }
    }

    let price_text = PRICE_SELECTOR_LIST.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find(|text| text.bytes().any(|b| b.is_ascii_digit()))
    });
    if let Some(text) = price_text {
        if let Some(amount) = price_amount(&text) {
            fields.offer_price(RawPrice::Text(amount));
        }
    }

    fields
}

/// Pulls the displayed amount out of a price container's text. Containers
/// often hold more than one number (`"R$ 49,90 R$ 59,90"`, `"12x de R$ 5,00"`),
/// so an `R$` amount is preferred over the first bare number.
fn price_amount(text: &str) -> Option<String> {
    let text = clean_text(text)?;
    BRL_AMOUNT_RE
        .captures(&text)
        .and_then(|c| c.get(1))
        .or_else(|| ANY_AMOUNT_RE.find(&text))
        .map(|m| m.as_str().to_owned())
}
