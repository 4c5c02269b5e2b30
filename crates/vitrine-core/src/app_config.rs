use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Bearer secret for the HTTP endpoints. `None` disables auth.
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub reader_proxy_base: String,
    /// Overrides the marketplace API origin. When unset the origin of the
    /// resolved product URL is used.
    pub marketplace_api_base: Option<String>,
    pub marketplace_cdn_base: String,
    pub headless_nav_timeout_secs: u64,
    pub headless_settle_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("accept_language", &self.accept_language)
            .field("reader_proxy_base", &self.reader_proxy_base)
            .field("marketplace_api_base", &self.marketplace_api_base)
            .field("marketplace_cdn_base", &self.marketplace_cdn_base)
            .field("headless_nav_timeout_secs", &self.headless_nav_timeout_secs)
            .field("headless_settle_ms", &self.headless_settle_ms)
            .finish()
    }
}
