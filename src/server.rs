//! HTTP surface: `GET /search`.
//!
//! A thin axum layer over the [`Aggregator`]. Response bodies are JSON in
//! every case, including errors, and carry `Cache-Control` headers so a
//! CDN or the browser can reuse them.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::orchestrator::Aggregator;
use crate::types::{ImageProvider, InfoboxEnvelope, Provider};

/// Web and image responses are cacheable for five minutes.
const CACHE_WEB: &str = "public, max-age=300";
/// Infobox content changes rarely; cache for an hour.
const CACHE_INFOBOX: &str = "public, max-age=3600";

/// Query parameters accepted by `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    /// 1-indexed page cursor; unparsable values fall back to 1.
    page: Option<String>,
    /// Provider subset, `images`, or `infobox`. Absent = all web providers.
    source: Option<String>,
    /// Narrows image mode to one provider.
    #[serde(rename = "imageSource")]
    image_source: Option<String>,
}

/// Build the application router.
pub fn router(aggregator: Arc<Aggregator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(search_handler).fallback(method_not_allowed))
        .with_state(aggregator)
        .layer(cors)
}

async fn search_handler(
    State(aggregator): State<Arc<Aggregator>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(query) = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Query parameter \"q\" is required",
        );
    };

    let page = params
        .page
        .as_deref()
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    match params.source.as_deref() {
        Some("infobox") => {
            // Only a blank query errors here, and that was rejected above.
            let infobox = aggregator.infobox(query).await.unwrap_or_default();
            cached_json(CACHE_INFOBOX, &InfoboxEnvelope { infobox })
        }
        Some("images") => {
            let source = params
                .image_source
                .as_deref()
                .and_then(ImageProvider::from_key);
            match aggregator.search_images(query, page, source).await {
                Ok(envelope) => cached_json(CACHE_WEB, &envelope),
                Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
            }
        }
        source => {
            // An unrecognised web source selects no providers: the
            // envelope then carries only the page cursor.
            let sources: Vec<Provider> = match source {
                None => Provider::all().to_vec(),
                Some(key) => Provider::from_key(key).into_iter().collect(),
            };
            match aggregator.search_web(query, page, &sources).await {
                Ok(envelope) => cached_json(CACHE_WEB, &envelope),
                Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
            }
        }
    }
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn cached_json<T: Serialize>(cache_control: &'static str, body: &T) -> Response {
    ([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
