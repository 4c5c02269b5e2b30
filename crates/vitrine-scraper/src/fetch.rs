//! Low-level HTTP helpers shared by every strategy.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{Client, StatusCode};

use crate::config::ScraperConfig;
use crate::error::ScraperError;

const MAX_REDIRECTS: usize = 10;

/// Builds the per-pipeline HTTP client: browser UA, `pt-BR` language,
/// bounded timeouts and redirect following.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub(crate) fn build_client(config: &ScraperConfig) -> Result<Client, ScraperError> {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&config.accept_language) {
        Ok(value) => {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        Err(e) => {
            tracing::warn!(
                accept_language = config.accept_language,
                error = %e,
                "ignoring invalid Accept-Language value"
            );
        }
    }

    let client = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout.min(Duration::from_secs(10)))
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    Ok(client)
}

/// A page as seen after following redirects.
#[derive(Debug, Clone)]
pub(crate) struct FetchedPage {
    pub final_url: String,
    pub status: StatusCode,
    pub body: String,
}

impl FetchedPage {
    /// The body, if the final response was 2xx and non-blank.
    pub(crate) fn usable_body(&self) -> Option<&str> {
        if self.status.is_success() && !self.body.trim().is_empty() {
            Some(&self.body)
        } else {
            None
        }
    }
}

/// GET `url` following redirects. Non-2xx responses are returned, not
/// treated as errors, so callers can still read the final URL.
///
/// # Errors
///
/// - [`ScraperError::InvalidUrl`] when `url` is not an absolute URL.
/// - [`ScraperError::Http`] on network, TLS, timeout or body-read failure.
pub(crate) async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, ScraperError> {
    let response = client
        .get(parse_target(url)?)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await?;

    let final_url = response.url().to_string();
    let status = response.status();
    let body = response.text().await?;

    Ok(FetchedPage {
        final_url,
        status,
        body,
    })
}

/// GET `url` and return the body of a 2xx response.
///
/// # Errors
///
/// - [`ScraperError::InvalidUrl`] when `url` is not an absolute URL.
/// - [`ScraperError::UnexpectedStatus`] for any non-2xx status.
/// - [`ScraperError::Http`] on network failure.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, ScraperError> {
    let response = client
        .get(parse_target(url)?)
        .header(ACCEPT, "text/plain,text/markdown,*/*;q=0.8")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response.text().await?)
}

fn parse_target(url: &str) -> Result<reqwest::Url, ScraperError> {
    reqwest::Url::parse(url.trim()).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Returns `true` for absolute `http(s)://` URLs.
pub(crate) fn is_absolute_http(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
