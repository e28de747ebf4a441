//! Embedded web UI
//!
//! The UI ships inside the binary so the service is a single file to
//! deploy. Assets are embedded at compile time.

use axum::http::header;
use axum::response::{Html, IntoResponse};

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../ui/index.html"))
}

/// GET /static/app.js
pub async fn serve_app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        include_str!("../ui/app.js"),
    )
}
