//! Runtime knobs for the extraction pipeline.

use std::time::Duration;

use vitrine_core::{AppConfig, DEFAULT_USER_AGENT};

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    pub reader_proxy_base: String,
    pub marketplace_api_base: Option<String>,
    pub marketplace_cdn_base: String,
    pub headless_nav_timeout: Duration,
    pub headless_settle: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "pt-BR,pt;q=0.9".to_string(),
            reader_proxy_base: "https://r.jina.ai".to_string(),
            marketplace_api_base: None,
            marketplace_cdn_base: "https://cf.shopee.com.br".to_string(),
            headless_nav_timeout: Duration::from_secs(25),
            headless_settle: Duration::from_millis(2500),
        }
    }
}

impl ScraperConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            reader_proxy_base: config.reader_proxy_base.clone(),
            marketplace_api_base: config.marketplace_api_base.clone(),
            marketplace_cdn_base: config.marketplace_cdn_base.clone(),
            headless_nav_timeout: Duration::from_secs(config.headless_nav_timeout_secs),
            headless_settle: Duration::from_millis(config.headless_settle_ms),
        }
    }
}
