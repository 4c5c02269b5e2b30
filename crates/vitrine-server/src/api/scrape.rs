use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use vitrine_core::ExtractionResult;

use super::{failure, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    u: Option<String>,
}

pub(super) async fn scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Response {
    let target = match target_url(query.u.as_deref()) {
        Ok(target) => target,
        Err(reason) => return failure(StatusCode::BAD_REQUEST, reason),
    };
    tracing::debug!(request_id = %req_id.0, url = target, "scrape requested");

    let record = state.pipeline.run(target).await;
    if !record.has_signal() {
        tracing::warn!(request_id = %req_id.0, url = target, "scrape returned an empty record");
    }
    (StatusCode::OK, Json(ExtractionResult::from(record))).into_response()
}

pub(super) async fn scrape_headless(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Response {
    let target = match target_url(query.u.as_deref()) {
        Ok(target) => target,
        Err(reason) => return failure(StatusCode::BAD_REQUEST, reason),
    };
    tracing::debug!(request_id = %req_id.0, url = target, "headless scrape requested");

    match state.pipeline.run_headless(target).await {
        Ok(record) => (StatusCode::OK, Json(ExtractionResult::from(record))).into_response(),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, url = target, error = %e, "headless scrape failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// The trimmed `u` parameter, which must be an absolute `http(s)` URL.
fn target_url(raw: Option<&str>) -> Result<&str, &'static str> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or("missing u")?;
    let parsed = reqwest::Url::parse(raw).map_err(|_| "invalid u")?;
    if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() {
        Ok(raw)
    } else {
        Err("invalid u")
    }
}
