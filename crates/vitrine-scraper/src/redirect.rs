//! Final-URL resolution for short links and tracking redirects.

use reqwest::Client;

use crate::fetch::{fetch_page, FetchedPage};

/// Outcome of following redirects for one link.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub final_url: String,
    /// The landing page, kept so the direct-fetch step does not download it again.
    pub(crate) page: Option<FetchedPage>,
}

pub struct RedirectResolver<'a> {
    client: &'a Client,
}

impl<'a> RedirectResolver<'a> {
    #[must_use]
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Follows redirects from `url`; keeps `url` as the final URL on any
    /// failure.
    pub(crate) async fn resolve_page(&self, url: &str) -> Resolved {
        match fetch_page(self.client, url).await {
            Ok(page) => {
                if page.final_url != url {
                    tracing::debug!(url, final_url = %page.final_url, "followed redirects");
                }
                Resolved {
                    final_url: page.final_url.clone(),
                    page: Some(page),
                }
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "redirect resolution failed; keeping input URL");
                Resolved {
                    final_url: url.to_owned(),
                    page: None,
                }
            }
        }
    }
}
