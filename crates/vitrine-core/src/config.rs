use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop Chrome user agent sent on every outbound request unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values are treated the same as unset ones.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let base_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        validate_base_url(var, &raw)
    };

    let env = parse_environment(&or_default("VITRINE_ENV", "development"))?;
    let bind_addr = parse_addr("VITRINE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VITRINE_LOG_LEVEL", "info");
    let access_token = optional("ACCESS_TOKEN");

    let request_timeout_secs = parse_u64("VITRINE_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("VITRINE_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("VITRINE_ACCEPT_LANGUAGE", "pt-BR,pt;q=0.9");

    let reader_proxy_base = base_url("VITRINE_READER_PROXY_BASE", "https://r.jina.ai")?;
    let marketplace_api_base = optional("VITRINE_MARKETPLACE_API_BASE")
        .map(|raw| validate_base_url("VITRINE_MARKETPLACE_API_BASE", &raw))
        .transpose()?;
    let marketplace_cdn_base =
        base_url("VITRINE_MARKETPLACE_CDN_BASE", "https://cf.shopee.com.br")?;

    let headless_nav_timeout_secs = parse_u64("VITRINE_HEADLESS_NAV_TIMEOUT_SECS", "25")?;
    let headless_settle_ms = parse_u64("VITRINE_HEADLESS_SETTLE_MS", "2500")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        access_token,
        request_timeout_secs,
        user_agent,
        accept_language,
        reader_proxy_base,
        marketplace_api_base,
        marketplace_cdn_base,
        headless_nav_timeout_secs,
        headless_settle_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VITRINE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Requires an `http(s)://` base and strips any trailing slash so callers
/// can append paths with `format!("{base}/...")`.
fn validate_base_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("\"{raw}\" is not an http(s) URL"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
