//! Direct access to the marketplace's internal item API.
//!
//! Attempts, in order: v4 item endpoint, v2 item endpoint with the salted
//! signature header, then both URLs again through the reader proxy with the
//! item object recovered from the text dump. Every failure is swallowed.

mod fragment;
mod item;

use reqwest::header::{ACCEPT, REFERER};
use reqwest::Client;
use serde_json::Value;

use crate::blob::mine_blob;
use crate::error::ScraperError;
use crate::fields::ProductFields;
use crate::identifier::MarketplaceIdentifier;
use crate::reader::ReaderProxyClient;
use crate::signature::{v2_signature, SIGNATURE_HEADER};

use fragment::extract_item_fragment;
use item::{item_fields, item_record};

pub struct MarketplaceApiClient<'a> {
    client: &'a Client,
    api_base: Option<&'a str>,
    cdn_base: &'a str,
    reader: ReaderProxyClient<'a>,
}

impl<'a> MarketplaceApiClient<'a> {
    /// `api_base` overrides the API origin; when `None` the referer's origin
    /// is used, so regional marketplace domains keep working.
    #[must_use]
    pub fn new(
        client: &'a Client,
        api_base: Option<&'a str>,
        cdn_base: &'a str,
        reader: ReaderProxyClient<'a>,
    ) -> Self {
        Self {
            client,
            api_base,
            cdn_base,
            reader,
        }
    }

    /// Looks the item up; `None` when no route produced a title or price.
    pub async fn fetch_item(
        &self,
        id: &MarketplaceIdentifier,
        referer: &str,
    ) -> Option<ProductFields> {
        let Some(origin) = self.api_origin(referer) else {
            tracing::debug!(referer, "no API origin for referer; skipping item API");
            return None;
        };
        let v4 = v4_url(&origin, id);
        let v2 = v2_url(&origin, id);
        let signature = v2_signature(&id.item_id, &id.shop_id);

        let direct = [(&v4, None), (&v2, Some(signature.as_str()))];
        for (url, signature) in direct {
            match self.get_item_json(url, referer, signature).await {
                Ok(body) => {
                    let fields = item_record(&body).map(|item| item_fields(item, self.cdn_base));
                    match fields {
                        Some(fields) if fields.has_signal() => {
                            tracing::debug!(url, "item API returned a record");
                            return Some(fields);
                        }
                        Some(_) => tracing::debug!(url, "item API returned an empty record"),
                        None => tracing::debug!(url, "item API answered without an item"),
                    }
                }
                Err(e) => tracing::debug!(url, error = %e, "item API request failed"),
            }
        }

        for url in [&v4, &v2] {
            let text = self.reader.fetch(url).await;
            if let Some(fields) = self.fields_from_text(&text) {
                tracing::debug!(url, "recovered item through reader proxy");
                return Some(fields);
            }
        }

        None
    }

    fn api_origin(&self, referer: &str) -> Option<String> {
        if let Some(base) = self.api_base {
            return Some(base.trim_end_matches('/').to_owned());
        }
        reqwest::Url::parse(referer)
            .ok()
            .filter(|u| u.has_host())
            .map(|u| u.origin().ascii_serialization())
    }

    async fn get_item_json(
        &self,
        url: &str,
        referer: &str,
        signature: Option<&str>,
    ) -> Result<Value, ScraperError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(REFERER, referer)
            .header("x-api-source", "pc")
            .header("x-requested-with", "XMLHttpRequest");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("item API response from {url}"),
            source: e,
        })
    }

    /// Degraded parse of a reader-proxy dump: the balanced item object as
    /// JSON, else regex mining of whatever fragment was found.
    fn fields_from_text(&self, text: &str) -> Option<ProductFields> {
        let fragment = extract_item_fragment(text)?;
        let fields = match serde_json::from_str::<Value>(fragment) {
            Ok(item) => item_fields(&item, self.cdn_base),
            Err(_) => mine_blob(fragment, self.cdn_base),
        };
        fields.has_signal().then_some(fields)
    }
}

fn v4_url(origin: &str, id: &MarketplaceIdentifier) -> String {
    format!(
        "{origin}/api/v4/item/get?shopid={}&itemid={}",
        id.shop_id, id.item_id
    )
}

fn v2_url(origin: &str, id: &MarketplaceIdentifier) -> String {
    format!(
        "{origin}/api/v2/item/get?itemid={}&shopid={}",
        id.item_id, id.shop_id
    )
}
