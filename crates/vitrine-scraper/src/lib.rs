pub mod blob;
pub mod config;
pub mod error;
mod fetch;
pub mod fields;
pub mod headless;
pub mod identifier;
pub mod marketplace;
pub mod pipeline;
pub mod price;
pub mod reader;
mod redirect;
pub mod signature;
pub mod structured;

pub use config::ScraperConfig;
pub use error::ScraperError;
#[cfg(feature = "headless")]
pub use headless::ChromiumRenderer;
pub use headless::{HeadlessError, HeadlessRenderer, RenderedPage};
pub use identifier::{parse_identifier, MarketplaceIdentifier};
pub use pipeline::ExtractionPipeline;
pub use price::RawPrice;
pub use signature::v2_signature;
