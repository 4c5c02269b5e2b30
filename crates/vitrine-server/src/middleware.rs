use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use vitrine_core::{AppConfig, Environment, ExtractionResult};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-secret bearer auth. With no secret configured every request passes.
#[derive(Clone)]
pub struct AuthState {
    token: Option<Arc<str>>,
}

impl AuthState {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }

    /// Reads `ACCESS_TOKEN` from the loaded config. Running production
    /// without it is allowed but logged.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.access_token.is_none() {
            if config.env == Environment::Production {
                tracing::warn!("ACCESS_TOKEN not set; scrape endpoints are unauthenticated");
            } else {
                tracing::debug!("ACCESS_TOKEN not set; bearer auth disabled");
            }
        }
        Self::new(config.access_token.clone())
    }

    fn allows(&self, candidate: &str) -> bool {
        match self.token.as_deref() {
            Some(expected) => expected.as_bytes().ct_eq(candidate.as_bytes()).into(),
            None => true,
        }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("enabled", &self.token.is_some())
            .finish()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Rejects requests whose bearer token does not match `ACCESS_TOKEN`.
/// `OPTIONS` always passes so preflight never needs credentials.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));
    if auth.allows(token) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "rejected request with bad bearer token");
    (
        StatusCode::UNAUTHORIZED,
        Json(ExtractionResult::failure("unauthorized")),
    )
        .into_response()
}

/// The `Authorization` value with an optional, case-insensitive `Bearer`
/// prefix removed. A missing header reads as the empty token.
fn extract_bearer_token(value: Option<&HeaderValue>) -> &str {
    let raw = value.and_then(|v| v.to_str().ok()).unwrap_or_default();
    match raw.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        _ => raw,
    }
}
