//! Open Graph / Twitter meta tags and schema.org JSON-LD.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::fields::ProductFields;
use crate::price::RawPrice;

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("valid meta selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid h1 selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
pub(crate) static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

const TITLE_META_KEYS: [&str; 2] = ["og:title", "twitter:title"];
pub(crate) const IMAGE_META_KEYS: [&str; 2] = ["og:image", "twitter:image"];

/// Extracts title, image and price from a parsed page.
///
/// Title: `og:title` → `twitter:title` → first `<h1>` → `<title>`.
/// Image: `og:image` → `twitter:image`.
/// Price: first Product/Offer JSON-LD object carrying `offers.price`,
/// `offers.lowPrice` or `offers.highPrice`. JSON-LD objects also backfill a
/// still-missing title or image.
#[must_use]
pub fn extract_structured(document: &Html) -> ProductFields {
    let mut fields = ProductFields::default();

    for key in TITLE_META_KEYS {
        if let Some(content) = meta_content(document, key) {
            fields.offer_title(&content);
        }
    }
    if let Some(h1) = document.select(&H1).next() {
        fields.offer_title(&element_text(h1));
    }
    if let Some(title) = document.select(&TITLE).next() {
        fields.offer_title(&element_text(title));
    }

    for key in IMAGE_META_KEYS {
        if let Some(content) = meta_content(document, key) {
            fields.offer_image(&content);
        }
    }

    for block in jsonld_blocks(document) {
        let Ok(value) = serde_json::from_str::<Value>(&block) else {
            tracing::debug!("skipping unparseable JSON-LD block");
            continue;
        };
        for item in jsonld_candidates(value) {
            apply_product_node(&mut fields, &item);
        }
    }

    fields
}

/// Content of the first `<meta>` whose `property` or `name` equals `key`
/// (case-insensitive) and has non-blank content.
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    document.select(&META).find_map(|meta| {
        let el = meta.value();
        let matches = [el.attr("property"), el.attr("name"), el.attr("itemprop")]
            .into_iter()
            .flatten()
            .any(|k| k.trim().eq_ignore_ascii_case(key));
        if !matches {
            return None;
        }
        el.attr("content")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
    })
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Text of every `<script type="application/ld+json">` block.
fn jsonld_blocks(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT)
        .filter(|s| {
            s.value()
                .attr("type")
                .is_some_and(|t| t.to_ascii_lowercase().contains("ld+json"))
        })
        .map(element_text)
        .collect()
}

/// Flattens a JSON-LD document into candidate objects: top-level object,
/// array elements, and members of any `@graph` container.
fn jsonld_candidates(value: Value) -> Vec<Value> {
    let top = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut candidates = Vec::with_capacity(top.len());
    for item in top {
        if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
            candidates.extend(graph.iter().cloned());
        }
        candidates.push(item);
    }
    candidates
}

fn apply_product_node(fields: &mut ProductFields, item: &Value) {
    let is_offer = has_type(item, "Offer") || has_type(item, "AggregateOffer");
    let looks_like_product = has_type(item, "Product")
        || has_type(item, "ProductGroup")
        || item.get("product").is_some()
        || item.get("offers").is_some()
        || item.get("Offers").is_some()
        || is_offer;
    if !looks_like_product {
        return;
    }

    if fields.price.is_none() {
        let offers = item
            .get("offers")
            .or_else(|| item.get("Offers"))
            .or_else(|| is_offer.then_some(item));
        if let Some(price) = offers.and_then(offer_price) {
            fields.offer_price(price);
        }
    }

    if let Some(name) = item.get("name").and_then(Value::as_str) {
        fields.offer_title(name);
    }
    if let Some(image) = item.get("image").and_then(image_url) {
        fields.offer_image(&image);
    }
}

/// `price` → `lowPrice` → `highPrice` of an offer object, or of the first
/// offer in an array that has one.
fn offer_price(offers: &Value) -> Option<RawPrice> {
    if let Some(list) = offers.as_array() {
        return list.iter().find_map(offer_price);
    }
    ["price", "lowPrice", "highPrice"]
        .iter()
        .filter_map(|key| offers.get(*key))
        .find_map(RawPrice::from_json)
}

/// JSON-LD `image` may be a string, an array, or an `ImageObject`.
fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(_) => value
            .get("url")
            .or_else(|| value.get("contentUrl"))
            .and_then(image_url),
        _ => None,
    }
}

fn has_type(item: &Value, wanted: &str) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}
