//! Partially-filled product fields passed between strategies.

use vitrine_core::{ExtractionMode, ProductRecord};

use crate::fetch::is_absolute_http;
use crate::price::RawPrice;

/// What one strategy managed to find. `None` means "keep looking".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<RawPrice>,
}

impl ProductFields {
    /// Sets the title unless one is already present. Whitespace is
    /// collapsed; blank values are ignored.
    pub fn offer_title(&mut self, raw: &str) {
        if self.title.is_none() {
            self.title = clean_text(raw);
        }
    }

    pub fn offer_image(&mut self, raw: &str) {
        if self.image.is_none() {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.image = Some(trimmed.to_string());
            }
        }
    }

    /// Sets the price unless one is already present. Values that normalize
    /// to an empty display string are ignored.
    pub fn offer_price(&mut self, price: RawPrice) {
        if self.price.is_none() && !price.display().is_empty() {
            self.price = Some(price);
        }
    }

    /// Fills every empty field from `other`.
    pub fn fill_from(&mut self, other: ProductFields) {
        if let Some(title) = other.title {
            self.offer_title(&title);
        }
        if let Some(image) = other.image {
            self.offer_image(&image);
        }
        if let Some(price) = other.price {
            self.offer_price(price);
        }
    }

    /// Usable signal means a title or a price; an image alone is not enough.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.title.is_some() || self.price.is_some()
    }

    /// Turns relative image references (`/img/a.jpg`, `//cdn/a.jpg`) into
    /// absolute URLs against the page they were found on.
    pub fn absolutize_image(&mut self, base_url: &str) {
        let Some(image) = self.image.as_deref() else {
            return;
        };
        if is_absolute_http(image) {
            return;
        }
        let joined = reqwest::Url::parse(base_url)
            .ok()
            .and_then(|base| base.join(&image.replace("&amp;", "&")).ok())
            .map(|u| u.to_string());
        if let Some(joined) = joined {
            self.image = Some(joined);
        }
    }

    #[must_use]
    pub fn into_record(self, mode: ExtractionMode, final_url: &str) -> ProductRecord {
        ProductRecord {
            mode,
            final_url: final_url.to_owned(),
            title: self.title.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            price: self.price.map(|p| p.display()).unwrap_or_default(),
        }
    }
}

/// Collapses runs of whitespace to one space and trims; `None` when blank.
pub(crate) fn clean_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offers_only_fill_empty_fields() {
        let mut fields = ProductFields::default();
        fields.offer_title("  Camiseta \n  Azul ");
        fields.offer_title("Other");
        assert_eq!(fields.title.as_deref(), Some("Camiseta Azul"));

        fields.offer_price(RawPrice::Text("sem preço".to_string()));
        assert!(fields.price.is_none(), "digitless price must be ignored");
        fields.offer_price(RawPrice::Text("4990".to_string()));
        fields.offer_price(RawPrice::Text("1".to_string()));
        assert_eq!(fields.price, Some(RawPrice::Text("4990".to_string())));
    }

    #[test]
    fn fill_from_keeps_existing_values() {
        let mut first = ProductFields {
            title: Some("A".to_string()),
            image: None,
            price: None,
        };
        first.fill_from(ProductFields {
            title: Some("B".to_string()),
            image: Some("https://img/b.jpg".to_string()),
            price: Some(RawPrice::Scaled(100_000)),
        });
        assert_eq!(first.title.as_deref(), Some("A"));
        assert_eq!(first.image.as_deref(), Some("https://img/b.jpg"));
        assert_eq!(first.price, Some(RawPrice::Scaled(100_000)));
    }

    #[test]
    fn image_alone_is_not_signal() {
        let fields = ProductFields {
            image: Some("https://img/a.jpg".to_string()),
            ..ProductFields::default()
        };
        assert!(!fields.has_signal());
    }

    #[test]
    fn absolutize_resolves_relative_and_protocol_relative() {
        let mut fields = ProductFields {
            image: Some("/img/a.jpg".to_string()),
            ..ProductFields::default()
        };
        fields.absolutize_image("https://loja.example.com/p/1");
        assert_eq!(
            fields.image.as_deref(),
            Some("https://loja.example.com/img/a.jpg")
        );

        let mut fields = ProductFields {
            image: Some("//cdn.example.com/a.jpg".to_string()),
            ..ProductFields::default()
        };
        fields.absolutize_image("https://loja.example.com/p/1");
        assert_eq!(fields.image.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn into_record_formats_price() {
        let record = ProductFields {
            title: Some("Shirt".to_string()),
            image: None,
            price: Some(RawPrice::Scaled(50_000_000)),
        }
        .into_record(ExtractionMode::Api, "https://x");
        assert_eq!(record.price, "R$ 500,00");
        assert_eq!(record.image, "");
        assert_eq!(record.mode, ExtractionMode::Api);
    }
}
