//! Integration tests for salesflow-web API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Catalog search with filters, facets, and pagination clamping
//! - Inventory CRUD and validation
//! - Dossier PDF generation
//! - Project persistence (save / check / load / delete)
//! - CRM gateway validation and missing-credential handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

use salesflow_web::{build_router, AppState, ServiceConfig};

/// Test helper: Create an in-memory database with the full schema
///
/// The pool is capped at one connection: each connection to `:memory:`
/// would otherwise get its own empty database.
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    salesflow_common::db::init::create_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

/// Test helper: Create app with test state (no external API keys)
///
/// Uploaded images land in a per-app temp directory kept for the test run.
fn setup_app(db: SqlitePool) -> axum::Router {
    let images_dir = tempfile::tempdir()
        .expect("Should create images dir")
        .keep();
    let state = AppState::new(
        db,
        reqwest::Client::new(),
        ServiceConfig {
            root_folder: std::env::temp_dir(),
            images_dir,
            google_api_key: None,
            pipedrive_api_key: None,
            pipedrive_base_url: "https://api.pipedrive.com/v1".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            default_salesperson: "Seller".to_string(),
        },
    );
    build_router(state)
}

/// Test helper: Create a bodyless request
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create a JSON request
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: Insert a product row directly
async fn seed_product(pool: &SqlitePool, sku: &str, name: &str, brand: &str, price: f64) {
    sqlx::query(
        "INSERT INTO products (guid, sku, name, brand, price, type, finish) \
         VALUES (?, ?, ?, ?, ?, 'Mixer', 'Chrome')",
    )
    .bind(format!("guid-{}", sku))
    .bind(sku)
    .bind(name)
    .bind(brand)
    .bind(price)
    .execute(pool)
    .await
    .expect("Should insert product");
}

fn sample_item(id: &str) -> Value {
    json!({
        "id": id,
        "sku": format!("SKU-{}", id),
        "name": "Basin Mixer",
        "price": 420.0,
        "image_url": "",
        "brand": "Vola",
        "description": "Single-lever basin mixer",
        "discount": 10.0,
        "note": "",
        "features": [],
    })
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_test_db().await);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "salesflow-web");
    assert!(body["version"].is_string());
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_catalog_empty() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(test_request("GET", "/api/catalog"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_catalog_pagination_and_clamping() {
    let db = setup_test_db().await;
    for i in 0..30 {
        seed_product(&db, &format!("SKU-{:03}", i), &format!("Product {:03}", i), "Vola", 100.0).await;
    }
    let app = setup_app(db);

    // Page 1 holds a full page
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/catalog?page=1"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 30);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["products"].as_array().unwrap().len(), 24);

    // Out-of-range page is clamped to the last page
    let response = app
        .oneshot(test_request("GET", "/api/catalog?page=99"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["products"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_catalog_filters_compose() {
    let db = setup_test_db().await;
    seed_product(&db, "VL-1", "Basin Mixer", "Vola", 420.0).await;
    seed_product(&db, "GE-1", "Shower System", "Gessi", 1200.0).await;
    seed_product(&db, "VL-2", "Kitchen Tap", "Vola", 380.0).await;
    let app = setup_app(db);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/catalog?brand=Vola&q=Mixer"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["products"][0]["sku"], "VL-1");

    // SKU is also searchable
    let response = app
        .oneshot(test_request("GET", "/api/catalog?q=GE-1"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["products"][0]["brand"], "Gessi");
}

#[tokio::test]
async fn test_catalog_facets() {
    let db = setup_test_db().await;
    seed_product(&db, "VL-1", "Basin Mixer", "Vola", 420.0).await;
    seed_product(&db, "GE-1", "Shower System", "Gessi", 1200.0).await;
    seed_product(&db, "VL-2", "Kitchen Tap", "Vola", 380.0).await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/catalog/facets"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["brands"], json!(["Gessi", "Vola"]));
    assert_eq!(body["types"], json!(["Mixer"]));
    assert_eq!(body["finishes"], json!(["Chrome"]));
}

// =============================================================================
// Inventory Tests
// =============================================================================

#[tokio::test]
async fn test_inventory_create_and_list() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({"sku": "VL-1", "name": "Basin Mixer", "brand": "Vola", "price": 420.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = extract_json(response.into_body()).await;
    assert_eq!(created["sku"], "VL-1");
    assert!(created["guid"].is_string());

    let response = app
        .oneshot(test_request("GET", "/api/products"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 1);
}

#[tokio::test]
async fn test_inventory_validation_rejections() {
    let app = setup_app(setup_test_db().await);

    // Blank name
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({"sku": "VL-1", "name": "  ", "brand": "Vola", "price": 420.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Negative price
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({"sku": "VL-1", "name": "Basin Mixer", "brand": "Vola", "price": -1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn test_inventory_duplicate_sku_rejected() {
    let db = setup_test_db().await;
    seed_product(&db, "VL-1", "Basin Mixer", "Vola", 420.0).await;
    let app = setup_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({"sku": "VL-1", "name": "Another", "brand": "Vola", "price": 100.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("VL-1"));
}

#[tokio::test]
async fn test_inventory_update_and_delete() {
    let db = setup_test_db().await;
    seed_product(&db, "VL-1", "Basin Mixer", "Vola", 420.0).await;
    let app = setup_app(db);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/products/guid-VL-1",
            json!({"sku": "VL-1", "name": "Basin Mixer 2", "brand": "Vola", "price": 450.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "Basin Mixer 2");
    assert_eq!(body["price"], 450.0);

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/api/products/guid-VL-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Gone now
    let response = app
        .oneshot(test_request("DELETE", "/api/products/guid-VL-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_image_upload_and_serve() {
    let db = setup_test_db().await;
    seed_product(&db, "VL-1", "Basin Mixer", "Vola", 420.0).await;
    let app = setup_app(db);

    let boundary = "XTESTBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"kind\"\r\n\r\nmain\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/products/guid-VL-1/image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/images/guid-VL-1-"));
    assert!(url.ends_with(".png"));

    // URL recorded on the product row
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/products?q=VL-1"))
        .await
        .unwrap();
    let listing = extract_json(response.into_body()).await;
    assert_eq!(listing["products"][0]["image_url"], json!(url));

    // And the stored file is served back through /images
    let response = app.oneshot(test_request("GET", &url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_inventory_update_unknown_product() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/products/no-such-guid",
            json!({"sku": "X", "name": "X", "brand": "X", "price": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Dossier Generation Tests
// =============================================================================

#[tokio::test]
async fn test_generate_rejects_empty_dossier() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/dossier/generate",
            json!({
                "sections": [{"id": "unassigned", "name": "Productos", "items": []}],
                "client_name": "Grupo Flora",
                "project_name": "Villa Flora",
                "date": "2025-03-01",
                "hide_prices": false,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_returns_pdf() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/dossier/generate",
            json!({
                "sections": [
                    {"id": "unassigned", "name": "Productos", "items": [sample_item("a")]},
                    {"id": "s1", "name": "Kitchen", "items": [sample_item("b")]},
                ],
                "client_name": "Grupo Flora",
                "project_name": "Villa Flora",
                "date": "2025-03-01",
                "hide_prices": true,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("Dossier_Grupo_Flora"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

// =============================================================================
// Project Persistence Tests
// =============================================================================

fn sample_snapshot() -> Value {
    json!({
        "sections": [
            {"id": "unassigned", "name": "Productos", "items": [sample_item("a")]},
            {"id": "s1", "name": "Kitchen", "items": []},
        ],
        "salesperson": "Seller",
    })
}

#[tokio::test]
async fn test_project_save_check_load_delete() {
    let app = setup_app(setup_test_db().await);

    // Nothing saved yet
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            "/api/dossiers/check?client_name=Grupo%20Flora&project_name=Villa",
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["exists"], false);

    // Save
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dossiers",
            json!({
                "client_name": "Grupo Flora",
                "project_name": "Villa",
                "snapshot": sample_snapshot(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let saved = extract_json(response.into_body()).await;
    let guid = saved["guid"].as_str().unwrap().to_string();

    // Check now reports the existing record
    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            "/api/dossiers/check?client_name=Grupo%20Flora&project_name=Villa",
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["dossier"]["guid"].as_str().unwrap(), guid);

    // Listing includes it
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/dossiers"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Load round-trips the snapshot and stamps saved_at
    let response = app
        .clone()
        .oneshot(test_request("GET", &format!("/api/dossiers/{}", guid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["client_name"], "Grupo Flora");
    assert_eq!(body["snapshot"]["sections"][0]["items"][0]["id"], "a");
    assert_eq!(body["snapshot"]["sections"][1]["name"], "Kitchen");
    assert!(body["snapshot"]["saved_at"].is_string());

    // Delete, then load reports 404
    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/api/dossiers/{}", guid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(test_request("GET", &format!("/api/dossiers/{}", guid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_save_overwrite() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dossiers",
            json!({
                "client_name": "Grupo Flora",
                "project_name": "Villa",
                "snapshot": sample_snapshot(),
            }),
        ))
        .await
        .unwrap();
    let guid = extract_json(response.into_body()).await["guid"]
        .as_str()
        .unwrap()
        .to_string();

    // Overwrite with a renamed project
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dossiers",
            json!({
                "client_name": "Grupo Flora",
                "project_name": "Villa Fase 2",
                "snapshot": sample_snapshot(),
                "overwrite_id": guid,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Still a single record
    let response = app
        .oneshot(test_request("GET", "/api/dossiers"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["project_name"], "Villa Fase 2");
}

#[tokio::test]
async fn test_project_save_requires_names() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/dossiers",
            json!({
                "client_name": " ",
                "project_name": "Villa",
                "snapshot": sample_snapshot(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// CRM Gateway Tests
// =============================================================================

#[tokio::test]
async fn test_crm_deal_requires_title_and_client() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/crm/deal",
            json!({"title": "", "client_name": "Carlos", "value": 100.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/crm/deal",
            json!({"title": "Deal", "client_name": "", "value": 100.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crm_deal_reports_missing_credentials() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/crm/deal",
            json!({"title": "Deal", "client_name": "Carlos", "value": 100.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("PIPEDRIVE_API_KEY"));
}

#[tokio::test]
async fn test_voice_extract_reports_missing_credentials() {
    let app = setup_app(setup_test_db().await);

    let boundary = "XTESTBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"note.webm\"\r\n\
         Content-Type: audio/webm\r\n\r\nnoise\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/voice/extract")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("GOOGLE_API_KEY"));
}

// =============================================================================
// UI Tests
// =============================================================================

#[tokio::test]
async fn test_ui_is_embedded() {
    let app = setup_app(setup_test_db().await);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("SalesFlow"));

    let response = app
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
