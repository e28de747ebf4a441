//! Same-origin image proxy
//!
//! Product images live on external CDNs; the PDF preview and canvas
//! rendering in the UI need them same-origin. This endpoint relays the
//! bytes with a cache header. Failures map to 404 so broken image URLs
//! degrade to a missing image rather than an error page.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

const CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

/// GET /api/proxy-image?url=
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    if !query.url.starts_with("http://") && !query.url.starts_with("https://") {
        return not_found("url must be http(s)");
    }

    let response = match state.http.get(&query.url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Image proxy fetch failed for {}: {}", query.url, e);
            return not_found("image fetch failed");
        }
    };

    if !response.status().is_success() {
        tracing::warn!(
            "Image proxy upstream returned {} for {}",
            response.status(),
            query.url
        );
        return not_found("image fetch failed");
    }

    let content_type = upstream_content_type(response.headers());

    match response.bytes().await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
            bytes.to_vec(),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Image proxy body read failed for {}: {}", query.url, e);
            not_found("image fetch failed")
        }
    }
}

/// Content type reported by the upstream image host
///
/// Reads through reqwest's header types, which are a different `http` major
/// than axum's request/response side.
fn upstream_content_type(headers: &reqwest::header::HeaderMap) -> String {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string()
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_content_type_relayed_or_defaulted() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(upstream_content_type(&headers), "image/jpeg");

        headers.insert(reqwest::header::CONTENT_TYPE, "image/png".parse().unwrap());
        assert_eq!(upstream_content_type(&headers), "image/png");
    }
}
