//! Text rendering through a third-party reader proxy.
//!
//! The proxy renders the page server-side and answers with a plain-text dump
//! (`Title: ...`, `URL Source: ...`, markdown body). The response is mined
//! with regexes, never parsed as HTML.

use reqwest::Client;

use crate::fetch::fetch_text;

pub struct ReaderProxyClient<'a> {
    client: &'a Client,
    base: &'a str,
}

impl<'a> ReaderProxyClient<'a> {
    #[must_use]
    pub fn new(client: &'a Client, base: &'a str) -> Self {
        Self { client, base }
    }

    /// Fetches the proxy's rendering of `target`; `""` on any failure.
    pub async fn fetch(&self, target: &str) -> String {
        let url = proxy_url(self.base, target);
        match fetch_text(self.client, &url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(target, error = %e, "reader proxy fetch failed");
                String::new()
            }
        }
    }
}

/// `https://r.jina.ai` + `https://loja.com/p?x=1` → `https://r.jina.ai/http://loja.com/p?x=1`.
pub(crate) fn proxy_url(base: &str, target: &str) -> String {
    let trimmed = target.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    format!("{}/http://{without_scheme}", base.trim_end_matches('/'))
}
