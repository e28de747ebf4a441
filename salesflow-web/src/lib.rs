//! salesflow-web library - HTTP service for the SalesFlow application
//!
//! Serves the embedded UI plus the catalog, inventory, dossier, project
//! persistence, voice extraction, and CRM bridge APIs.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;
pub mod services;

/// Uploaded audio notes can run a few minutes; allow up to 25 MB bodies
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Service configuration resolved at startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub images_dir: PathBuf,
    pub google_api_key: Option<String>,
    pub pipedrive_api_key: Option<String>,
    pub pipedrive_base_url: String,
    pub gemini_model: String,
    pub default_salesperson: String,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared outbound HTTP client (Gemini, Pipedrive, image proxy)
    pub http: reqwest::Client,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, http: reqwest::Client, config: ServiceConfig) -> Self {
        Self {
            db,
            http,
            config: Arc::new(config),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        .route("/api/catalog", get(api::catalog::search_catalog))
        .route("/api/catalog/facets", get(api::catalog::catalog_facets))
        .route(
            "/api/products",
            get(api::inventory::list_products).post(api::inventory::create_product),
        )
        .route(
            "/api/products/:id",
            put(api::inventory::update_product).delete(api::inventory::delete_product),
        )
        .route("/api/products/:id/image", post(api::inventory::upload_product_image))
        .route("/api/dossier/generate", post(api::dossier::generate_dossier))
        .route(
            "/api/dossiers",
            get(api::projects::list_dossiers).post(api::projects::save_dossier),
        )
        .route("/api/dossiers/check", get(api::projects::check_existing))
        .route(
            "/api/dossiers/:id",
            get(api::projects::load_dossier).delete(api::projects::delete_dossier),
        )
        .route("/api/voice/extract", post(api::voice::extract_deal))
        .route("/api/crm/deal", post(api::crm::create_deal))
        .route("/api/crm/voice-deal", post(api::crm::create_voice_deal))
        .route("/api/proxy-image", get(api::proxy::proxy_image));

    // UI and uploaded images (no API prefix)
    let public = Router::new()
        .route("/", get(api::ui::serve_index))
        .route("/static/app.js", get(api::ui::serve_app_js))
        .merge(api::health::health_routes());

    Router::new()
        .merge(api)
        .merge(public)
        .nest_service("/images", ServeDir::new(&state.config.images_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
