//! Marketplace item identifiers embedded in product URLs.

use std::sync::LazyLock;

use regex::Regex;

// `i.<shopid>.<itemid>` at the end of a path segment, e.g.
// `/Camiseta-Azul-i.111.222` or `/i.111.222?sp_atk=...`.
static ITEM_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/\-.])i\.(\d+)\.(\d+)(?:[/?#]|$)").expect("valid item path regex")
});

/// Shop and item ids of a marketplace product link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceIdentifier {
    pub shop_id: String,
    pub item_id: String,
}

/// Extracts the marketplace identifier from `url`.
///
/// Returns `None` when the URL does not follow the `i.<shop>.<item>` shape or
/// cannot be parsed at all; absence is the common case, not an error.
#[must_use]
pub fn parse_identifier(url: &str) -> Option<MarketplaceIdentifier> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let caps = ITEM_PATH_RE.captures(parsed.path())?;
    Some(MarketplaceIdentifier {
        shop_id: caps.get(1)?.as_str().to_owned(),
        item_id: caps.get(2)?.as_str().to_owned(),
    })
}
