//! Wire shape returned by every extraction entry point.

use serde::{Deserialize, Serialize, Serializer};

/// Which strategy produced a [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Api,
    Structured,
    Blob,
    Readable,
    Headless,
    Simple,
}

impl ExtractionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Structured => "structured",
            Self::Blob => "blob",
            Self::Readable => "readable",
            Self::Headless => "headless",
            Self::Simple => "simple",
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical product card resolved from a link.
///
/// Every text field is either empty or final: `price` is always a formatted
/// display string such as `"R$ 49,90"`, never a raw number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub mode: ExtractionMode,
    pub final_url: String,
    pub title: String,
    pub image: String,
    pub price: String,
}

impl ProductRecord {
    /// A record carries usable signal when it has a title or a price.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        !self.title.is_empty() || !self.price.is_empty()
    }
}

/// Result of one extraction request.
///
/// Serializes to `{"ok":true,"mode":..,"finalUrl":..,"title":..,"image":..,"price":..}`
/// or `{"ok":false,"error":..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Found(ProductRecord),
    Failed { error: String },
}

impl ExtractionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }
}

impl From<ProductRecord> for ExtractionResult {
    fn from(record: ProductRecord) -> Self {
        Self::Found(record)
    }
}

#[derive(Serialize)]
struct FoundBody<'a> {
    ok: bool,
    #[serde(flatten)]
    record: &'a ProductRecord,
}

#[derive(Serialize)]
struct FailedBody<'a> {
    ok: bool,
    error: &'a str,
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(record) => FoundBody { ok: true, record }.serialize(serializer),
            Self::Failed { error } => FailedBody { ok: false, error }.serialize(serializer),
        }
    }
}
