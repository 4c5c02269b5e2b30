//! Regex mining of script blobs and reader-proxy text.
//!
//! Each field has an ordered pattern table; the first pattern that matches
//! wins. Add or reorder entries here without touching the pipeline.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::fetch::is_absolute_http;
use crate::fields::ProductFields;
use crate::price::RawPrice;
use crate::structured::{element_text, SCRIPT};

/// Non-absolute image values longer than this are CDN content hashes.
const IMAGE_HASH_MIN_LEN: usize = 20;

/// How a captured price value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceEncoding {
    /// Marketplace keys: bare integers are scaled by 10^5.
    ScaledWhenInteger,
    Text,
}

struct PricePattern {
    name: &'static str,
    regex: Regex,
    encoding: PriceEncoding,
}

struct TextPattern {
    name: &'static str,
    regex: Regex,
}

// A JSON string body, escapes included.
const JSON_STR: &str = r#"((?:[^"\\]|\\.)+)"#;
const JSON_STR_MIN5: &str = r#"((?:[^"\\]|\\.){5,})"#;

fn price_key(key: &str) -> String {
    format!(r#"(?i)"{key}"\s*:\s*"?(\d+(?:[.,]\d+)*)"?"#)
}

static PRICE_PATTERNS: LazyLock<Vec<PricePattern>> = LazyLock::new(|| {
    let pattern = |name, regex: &str, encoding| PricePattern {
        name,
        regex: Regex::new(regex).expect("valid price regex"),
        encoding,
    };
    vec![
        pattern(
            "price_min",
            &price_key("price_min"),
            PriceEncoding::ScaledWhenInteger,
        ),
        pattern("price", &price_key("price"), PriceEncoding::Text),
        pattern("current_price", &price_key("current_price"), PriceEncoding::Text),
        pattern("final_price", &price_key("final_price"), PriceEncoding::Text),
        pattern(
            "price_before_discount",
            &price_key("price_before_discount"),
            PriceEncoding::ScaledWhenInteger,
        ),
        pattern(
            "brl_literal",
            r"R\$\s*(\d+(?:[.,]\d+)*)",
            PriceEncoding::Text,
        ),
    ]
});

static TITLE_PATTERNS: LazyLock<Vec<TextPattern>> = LazyLock::new(|| {
    let pattern = |name, regex: &str| TextPattern {
        name,
        regex: Regex::new(regex).expect("valid title regex"),
    };
    vec![
        pattern("name", &format!(r#"(?i)"name"\s*:\s*"{JSON_STR_MIN5}""#)),
        pattern("title", &format!(r#"(?i)"title"\s*:\s*"{JSON_STR_MIN5}""#)),
        pattern("reader_title", r"(?m)^Title:[ \t]*(\S.*?)[ \t]*\r?$"),
    ]
});

static IMAGE_PATTERNS: LazyLock<Vec<TextPattern>> = LazyLock::new(|| {
    let pattern = |name, regex: &str| TextPattern {
        name,
        regex: Regex::new(regex).expect("valid image regex"),
    };
    vec![
        pattern(
            "images_array",
            &format!(r#"(?i)"images?"\s*:\s*\[\s*"{JSON_STR}""#),
        ),
        pattern("image", &format!(r#"(?i)"image"\s*:\s*"{JSON_STR}""#)),
        pattern("markdown_image", r"!\[[^\]]*\]\((https?://[^\s)]+)\)"),
    ]
});

/// Mines `text` for price, title and image.
///
/// Image hashes are expanded against `cdn_base`. Never fails; fields that no
/// pattern matched stay `None`.
#[must_use]
pub fn mine_blob(text: &str, cdn_base: &str) -> ProductFields {
    let mut fields = ProductFields::default();

    for pattern in PRICE_PATTERNS.iter() {
        let Some(raw) = first_capture(&pattern.regex, text) else {
            continue;
        };
        let price = match pattern.encoding {
            PriceEncoding::ScaledWhenInteger => RawPrice::scaled_or_text(raw),
            PriceEncoding::Text => Some(RawPrice::Text(raw.to_owned())),
        };
        if let Some(price) = price {
            tracing::trace!(pattern = pattern.name, raw, "blob price match");
            fields.offer_price(price);
        }
        if fields.price.is_some() {
            break;
        }
    }

    for pattern in TITLE_PATTERNS.iter() {
        if let Some(raw) = first_capture(&pattern.regex, text) {
            tracing::trace!(pattern = pattern.name, "blob title match");
            fields.offer_title(&decode_json_string(raw));
            if fields.title.is_some() {
                break;
            }
        }
    }

    for pattern in IMAGE_PATTERNS.iter() {
        if let Some(raw) = first_capture(&pattern.regex, text) {
            tracing::trace!(pattern = pattern.name, "blob image match");
            fields.offer_image(&expand_image(&decode_json_string(raw), cdn_base));
            if fields.image.is_some() {
                break;
            }
        }
    }

    fields
}

/// Concatenated contents of every `<script>` element.
#[must_use]
pub fn script_text(document: &Html) -> String {
    document
        .select(&SCRIPT)
        .map(element_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrites a marketplace content hash to `<cdn_base>/file/<hash>`.
///
/// Absolute URLs are returned unchanged and protocol-relative ones get
/// `https:`. Short values and paths are left for the caller to resolve.
pub(crate) fn expand_image(value: &str, cdn_base: &str) -> String {
    let value = value.trim();
    if is_absolute_http(value) {
        return value.to_owned();
    }
    if let Some(rest) = value.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if looks_like_content_hash(value) {
        return cdn_file_url(cdn_base, value);
    }
    value.to_owned()
}

pub(crate) fn cdn_file_url(cdn_base: &str, hash: &str) -> String {
    format!("{}/file/{hash}", cdn_base.trim_end_matches('/'))
}

fn looks_like_content_hash(value: &str) -> bool {
    value.len() > IMAGE_HASH_MIN_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn first_capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decodes JSON string escapes (`\/`, `ç`, `\"`). Falls back to the
/// raw capture with escaped slashes fixed when the escapes are malformed.
fn decode_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\""))
        .unwrap_or_else(|_| raw.replace("\\/", "/"))
}
