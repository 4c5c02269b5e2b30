mod scrape;

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use vitrine_core::ExtractionResult;
use vitrine_scraper::ExtractionPipeline;

use crate::middleware::{request_id, require_bearer_auth, AuthState};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ExtractionPipeline>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    ok: bool,
    status: &'static str,
}

/// `{ok:false,error}` with the given status.
pub(super) fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ExtractionResult::failure(error))).into_response()
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/scrape", get(scrape::scrape).options(preflight))
        .route(
            "/api/scrape-headless",
            get(scrape::scrape_headless).options(preflight),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .with_state(state);
    with_common_layers(router)
}

/// Outermost first: tracing, request id, CORS, cache headers, then the panic
/// boundary so its 500 still carries CORS and cache headers.
fn with_common_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(request_id))
            .layer(build_cors())
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store, max-age=0"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("cdn-cache-control"),
                HeaderValue::from_static("no-store"),
            ))
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

async fn health() -> Json<HealthData> {
    Json(HealthData {
        ok: true,
        status: "ok",
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "internal error".to_string()
    };
    tracing::error!(panic = %message, "request handler panicked");
    failure(StatusCode::INTERNAL_SERVER_ERROR, message)
}
