//! Mapping of a marketplace item record onto [`ProductFields`].

use serde_json::Value;

use crate::blob::cdn_file_url;
use crate::fetch::is_absolute_http;
use crate::fields::ProductFields;
use crate::price::RawPrice;

/// Picks the item record out of an API response body: a non-null `item`
/// object, else a non-null `data` object (unwrapping `data.item` when the
/// endpoint nests it).
pub(crate) fn item_record(body: &Value) -> Option<&Value> {
    if let Some(item) = body.get("item").filter(|v| v.is_object()) {
        return Some(item);
    }
    let data = body.get("data").filter(|v| v.is_object())?;
    Some(data.get("item").filter(|v| v.is_object()).unwrap_or(data))
}

/// Title from `name`/`title`, price from `price_min` → `price` →
/// `price_max` (scaled by 10^5), image from `image` → `images[0]`.
pub(crate) fn item_fields(item: &Value, cdn_base: &str) -> ProductFields {
    let mut fields = ProductFields::default();

    for key in ["name", "title"] {
        if let Some(title) = item.get(key).and_then(Value::as_str) {
            fields.offer_title(title);
        }
    }

    for key in ["price_min", "price", "price_max"] {
        let price = item
            .get(key)
            .and_then(RawPrice::from_scaled_json)
            .filter(|p| !matches!(p, RawPrice::Scaled(n) if *n <= 0));
        if let Some(price) = price {
            fields.offer_price(price);
        }
    }

    let image = item
        .get("image")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            item.get("images")
                .and_then(Value::as_array)
                .and_then(|imgs| imgs.iter().find_map(Value::as_str))
        });
    if let Some(image) = image {
        fields.offer_image(&api_image_url(image, cdn_base));
    }

    fields
}

/// The item API only ever returns content hashes, so any non-absolute value
/// goes through the CDN template regardless of length.
fn api_image_url(value: &str, cdn_base: &str) -> String {
    let value = value.trim();
    if is_absolute_http(value) {
        value.to_owned()
    } else if let Some(rest) = value.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        cdn_file_url(cdn_base, value)
    }
}
