//! HTTP API handlers for salesflow-web

pub mod catalog;
pub mod crm;
pub mod dossier;
pub mod health;
pub mod inventory;
pub mod projects;
pub mod proxy;
pub mod ui;
pub mod voice;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Shared handler error: maps the common error taxonomy onto HTTP statuses
/// with a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub salesflow_common::Error);

impl From<salesflow_common::Error> for ApiError {
    fn from(err: salesflow_common::Error) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(salesflow_common::Error::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use salesflow_common::Error;

        let (status, message) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {}", msg)),
            Error::Config(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Error::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };

        if status.is_server_error() {
            tracing::error!("API error: {}", self.0);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
