//! Price normalization into the `"R$ 1.234,56"` display form.
//!
//! Every function here is total: unknown or empty input yields `""`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale factor of the marketplace's integer prices (`50000000` is R$ 500,00).
const MARKETPLACE_PRICE_SCALE: u32 = 5;

const CURRENCY_PREFIX: &str = "R$ ";

/// A price as found in the wild, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPrice {
    /// Integer scaled by 10^5, as returned by the marketplace item API.
    Scaled(i64),
    /// A typed amount already in currency units (JSON-LD numeric `price`).
    Number(Decimal),
    /// Free text such as `"R$ 1.234,56"`, `"49.90"` or `"4990"`.
    Text(String),
}

impl RawPrice {
    /// Formats the price for display; `""` when nothing usable remains.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Scaled(n) => from_scaled_integer(Some(*n)),
            Self::Number(d) => from_decimal(*d),
            Self::Text(s) => from_raw_text(s),
        }
    }

    /// Reads a JSON value in currency units. Strings stay textual.
    pub(crate) fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                let repr = n.to_string();
                Some(
                    Decimal::from_str(&repr)
                        .or_else(|_| Decimal::from_scientific(&repr))
                        .map_or_else(|_| Self::Text(repr), Self::Number),
                )
            }
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Reads a JSON value known to carry a scaled integer. Digit-only
    /// strings are accepted; anything else falls back to text.
    pub(crate) fn from_scaled_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Scaled),
            serde_json::Value::String(s) => Self::scaled_or_text(s),
            _ => None,
        }
    }

    /// `"50000000"` becomes `Scaled`, `"R$ 49,90"` stays `Text`.
    pub(crate) fn scaled_or_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Some(Self::Scaled(n));
            }
        }
        Some(Self::Text(trimmed.to_string()))
    }
}

/// Formats a marketplace scaled integer: `12345000` → `"R$ 123,45"`.
#[must_use]
pub fn from_scaled_integer(n: Option<i64>) -> String {
    match n {
        Some(n) => from_decimal(Decimal::new(n, MARKETPLACE_PRICE_SCALE)),
        None => String::new(),
    }
}

/// Formats an amount in currency units with two decimals and a comma.
#[must_use]
pub fn from_decimal(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{rounded:.2}").replace('.', ",");
    format!("{CURRENCY_PREFIX}{digits}")
}

/// Best-effort normalization of free-text prices.
///
/// Keeps only digits, commas and dots. When no separator survives and there
/// are at least three digits, the last two are taken as cents (`"1234"` →
/// `"R$ 12,34"`). Input that already has a separator is kept verbatim.
///
/// This is a heuristic: `"12345"` always reads as R$ 123,45 even when the
/// source meant whole reais.
#[must_use]
pub fn from_raw_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !stripped.bytes().any(|b| b.is_ascii_digit()) {
        return String::new();
    }

    if stripped.contains(',') || stripped.contains('.') || stripped.len() < 3 {
        return format!("{CURRENCY_PREFIX}{stripped}");
    }

    let (units, cents) = stripped.split_at(stripped.len() - 2);
    format!("{CURRENCY_PREFIX}{units},{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_integer_formats_with_comma() {
        assert_eq!(from_scaled_integer(Some(12_345_000)), "R$ 123,45");
        assert_eq!(from_scaled_integer(Some(50_000_000)), "R$ 500,00");
    }

    #[test]
    fn scaled_integer_absent_is_empty() {
        assert_eq!(from_scaled_integer(None), "");
    }

    #[test]
    fn scaled_integer_rounds_to_cents() {
        // 1.23456 → 1,23 ; 1.235 → 1,24
        assert_eq!(from_scaled_integer(Some(123_456)), "R$ 1,23");
        assert_eq!(from_scaled_integer(Some(123_500)), "R$ 1,24");
    }

    #[test]
    fn raw_text_without_separator_inserts_cents() {
        assert_eq!(from_raw_text("1234"), "R$ 12,34");
        assert_eq!(from_raw_text("12345"), "R$ 123,45");
    }

    #[test]
    fn raw_text_with_separator_is_kept() {
        assert_eq!(from_raw_text("R$ 1.234,56"), "R$ 1.234,56");
        assert_eq!(from_raw_text("49.90"), "R$ 49.90");
    }

    #[test]
    fn raw_text_empty_or_digitless_is_empty() {
        assert_eq!(from_raw_text(""), "");
        assert_eq!(from_raw_text("sob consulta"), "");
        assert_eq!(from_raw_text("R$ ,"), "");
    }

    #[test]
    fn raw_text_short_values_are_not_split() {
        assert_eq!(from_raw_text("45"), "R$ 45");
    }

    #[test]
    fn decimal_amounts_format_two_places() {
        assert_eq!(from_decimal(Decimal::new(999, 1)), "R$ 99,90");
        assert_eq!(from_decimal(Decimal::from(100)), "R$ 100,00");
    }

    #[test]
    fn raw_price_from_json_number_is_decimal() {
        let price = RawPrice::from_json(&serde_json::json!(129.9)).expect("price");
        assert_eq!(price.display(), "R$ 129,90");
    }

    #[test]
    fn raw_price_from_exponent_json_number_is_decimal() {
        let value: serde_json::Value = serde_json::from_str("1e21").expect("json");
        let price = RawPrice::from_json(&value).expect("price");
        assert!(matches!(price, RawPrice::Number(_)));
        assert_eq!(price.display(), "R$ 1000000000000000000000,00");
    }

    #[test]
    fn raw_price_from_json_string_is_text() {
        let price = RawPrice::from_json(&serde_json::json!("129,90")).expect("price");
        assert_eq!(price, RawPrice::Text("129,90".to_string()));
        assert!(RawPrice::from_json(&serde_json::json!("  ")).is_none());
        assert!(RawPrice::from_json(&serde_json::Value::Null).is_none());
    }

    #[test]
    fn scaled_or_text_detects_digit_strings() {
        assert_eq!(
            RawPrice::scaled_or_text("50000000"),
            Some(RawPrice::Scaled(50_000_000))
        );
        assert_eq!(
            RawPrice::scaled_or_text("49,90"),
            Some(RawPrice::Text("49,90".to_string()))
        );
        assert_eq!(RawPrice::scaled_or_text(""), None);
    }
}
