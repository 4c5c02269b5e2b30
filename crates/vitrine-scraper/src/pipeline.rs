//! Strategy orchestration for one product link.

use std::sync::Arc;

use reqwest::Client;
use scraper::Html;
use vitrine_core::{ExtractionMode, ProductRecord};

use crate::blob::{mine_blob, script_text};
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::fetch::{build_client, FetchedPage};
use crate::fields::ProductFields;
use crate::headless::{extract_rendered, HeadlessError, HeadlessRenderer};
use crate::identifier::parse_identifier;
use crate::marketplace::MarketplaceApiClient;
use crate::reader::ReaderProxyClient;
use crate::redirect::RedirectResolver;
use crate::structured::extract_structured;

/// Runs the extraction strategies against one URL.
///
/// Holds the shared HTTP client, so one instance should serve every request.
/// Each call is independent: nothing is cached between runs.
pub struct ExtractionPipeline {
    config: ScraperConfig,
    client: Client,
    renderer: Option<Arc<dyn HeadlessRenderer>>,
}

impl ExtractionPipeline {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            client,
            renderer: None,
        })
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn HeadlessRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    #[must_use]
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Full cascade, first strategy with signal wins:
    ///
    /// 1. Follow redirects to the final URL.
    /// 2. Parse the marketplace identifier (final URL, then input URL).
    /// 3. Item API (v4, signed v2, reader-proxied).
    /// 4. Direct page: structured data, gaps filled from script blobs.
    /// 5. Reader-proxy text dump mined with regexes.
    ///
    /// Never fails. When every strategy comes back empty the record is
    /// `readable` with empty fields.
    pub async fn run(&self, url: &str) -> ProductRecord {
        let resolved = RedirectResolver::new(&self.client).resolve_page(url).await;
        let final_url = resolved.final_url.as_str();

        if let Some(id) = parse_identifier(final_url).or_else(|| parse_identifier(url)) {
            tracing::debug!(
                shop_id = %id.shop_id,
                item_id = %id.item_id,
                "marketplace item link"
            );
            if let Some(fields) = self.marketplace().fetch_item(&id, final_url).await {
                tracing::info!(url, final_url, mode = "api", "product extracted");
                return fields.into_record(ExtractionMode::Api, final_url);
            }
        }

        // The landing page from step 1 is the direct fetch; a failed
        // resolution is not retried.
        if let Some(body) = resolved.page.as_ref().and_then(FetchedPage::usable_body) {
            let (mode, fields) = self.page_fields(body, final_url);
            if fields.has_signal() {
                tracing::info!(url, final_url, mode = %mode, "product extracted");
                return fields.into_record(mode, final_url);
            }
        }

        let text = self.reader().fetch(final_url).await;
        let fields = mine_blob(&text, &self.config.marketplace_cdn_base);
        if fields.has_signal() {
            tracing::info!(url, final_url, mode = "readable", "product extracted");
        } else {
            tracing::warn!(url, final_url, "all extraction strategies came back empty");
        }
        fields.into_record(ExtractionMode::Readable, final_url)
    }

    /// Redirects plus one direct fetch, no API or proxy. Always `simple`.
    pub async fn run_simple(&self, url: &str) -> ProductRecord {
        let resolved = RedirectResolver::new(&self.client).resolve_page(url).await;
        let final_url = resolved.final_url.as_str();

        let fields = resolved
            .page
            .as_ref()
            .and_then(FetchedPage::usable_body)
            .map(|body| self.page_fields(body, final_url).1)
            .unwrap_or_default();
        tracing::info!(
            url,
            final_url,
            mode = "simple",
            found = fields.has_signal(),
            "simple extraction done"
        );
        fields.into_record(ExtractionMode::Simple, final_url)
    }

    /// Renders `url` in a browser and reads the settled DOM.
    ///
    /// # Errors
    ///
    /// - [`HeadlessError::Unavailable`] when no renderer is configured.
    /// - Any launch, navigation or timeout failure from the renderer.
    pub async fn run_headless(&self, url: &str) -> Result<ProductRecord, HeadlessError> {
        let renderer = self.renderer.as_ref().ok_or(HeadlessError::Unavailable)?;
        let rendered = renderer.render(url).await?;

        let mut fields = extract_rendered(&rendered.html);
        fields.absolutize_image(&rendered.final_url);
        tracing::info!(
            url,
            final_url = %rendered.final_url,
            mode = "headless",
            found = fields.has_signal(),
            "headless extraction done"
        );
        Ok(fields.into_record(ExtractionMode::Headless, &rendered.final_url))
    }

    fn marketplace(&self) -> MarketplaceApiClient<'_> {
        MarketplaceApiClient::new(
            &self.client,
            self.config.marketplace_api_base.as_deref(),
            &self.config.marketplace_cdn_base,
            self.reader(),
        )
    }

    fn reader(&self) -> ReaderProxyClient<'_> {
        ReaderProxyClient::new(&self.client, &self.config.reader_proxy_base)
    }

    /// Structured data first; blob mining fills the gaps. The mode names
    /// whichever of the two found signal first.
    fn page_fields(&self, body: &str, final_url: &str) -> (ExtractionMode, ProductFields) {
        let document = Html::parse_document(body);

        let mut fields = extract_structured(&document);
        let mode = if fields.has_signal() {
            ExtractionMode::Structured
        } else {
            ExtractionMode::Blob
        };
        let blob = mine_blob(&script_text(&document), &self.config.marketplace_cdn_base);
        fields.fill_from(blob);
        fields.absolutize_image(final_url);
        (mode, fields)
    }
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("config", &self.config)
            .field("headless", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
