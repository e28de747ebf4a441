//! Inventory management: product CRUD and image upload

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use salesflow_common::db::models::Product;
use salesflow_common::Error;
use uuid::Uuid;

use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::{api::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub q: Option<String>,
    #[serde(default = "crate::api::catalog::default_page")]
    pub page: i64,
}

/// Product create/update payload
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub collection_name: Option<String>,
    pub finish: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tech_drawing_url: Option<String>,
}

impl ProductInput {
    fn validate(&self) -> Result<(), Error> {
        if self.sku.trim().is_empty() {
            return Err(Error::InvalidInput("sku is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("name is required".to_string()));
        }
        if self.brand.trim().is_empty() {
            return Err(Error::InvalidInput("brand is required".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidInput(
                "price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub total_results: i64,
    pub page: i64,
    pub total_pages: i64,
    pub products: Vec<Product>,
}

/// GET /api/products?q=&page=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let (where_clause, pattern) = match query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        Some(q) => (
            " WHERE name LIKE ? OR sku LIKE ? OR brand LIKE ?",
            Some(format!("%{}%", q.trim())),
        ),
        None => ("", None),
    };

    let count_sql = format!("SELECT COUNT(*) FROM products{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(p) = &pattern {
        count_query = count_query.bind(p).bind(p).bind(p);
    }
    let total_results = count_query.fetch_one(&state.db).await?;

    let pagination = calculate_pagination(total_results, query.page);

    let select_sql = format!(
        "SELECT {} FROM products{} ORDER BY updated_at DESC LIMIT ? OFFSET ?",
        Product::COLUMNS,
        where_clause
    );
    let mut select_query = sqlx::query(&select_sql);
    if let Some(p) = &pattern {
        select_query = select_query.bind(p).bind(p).bind(p);
    }
    let rows = select_query
        .bind(PAGE_SIZE)
        .bind(pagination.offset)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(InventoryResponse {
        total_results,
        page: pagination.page,
        total_pages: pagination.total_pages,
        products: rows.iter().map(Product::from_row).collect(),
    }))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    input.validate()?;

    let guid = Uuid::new_v4().to_string();
    let result = sqlx::query(
        "INSERT INTO products (guid, sku, name, brand, price, type, collection_name, finish, \
         description, image_url, tech_drawing_url) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(input.sku.trim())
    .bind(input.name.trim())
    .bind(input.brand.trim())
    .bind(input.price)
    .bind(&input.product_type)
    .bind(&input.collection_name)
    .bind(&input.finish)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(&input.tech_drawing_url)
    .execute(&state.db)
    .await;

    if let Err(err) = result {
        if is_unique_violation(&err) {
            return Err(Error::InvalidInput(format!(
                "a product with SKU '{}' already exists",
                input.sku.trim()
            ))
            .into());
        }
        return Err(err.into());
    }

    let product = fetch_product(&state, &guid).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    input.validate()?;

    let result = sqlx::query(
        "UPDATE products SET sku = ?, name = ?, brand = ?, price = ?, type = ?, \
         collection_name = ?, finish = ?, description = ?, image_url = ?, \
         tech_drawing_url = ?, updated_at = datetime('now') WHERE guid = ?",
    )
    .bind(input.sku.trim())
    .bind(input.name.trim())
    .bind(input.brand.trim())
    .bind(input.price)
    .bind(&input.product_type)
    .bind(&input.collection_name)
    .bind(&input.finish)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(&input.tech_drawing_url)
    .bind(&id)
    .execute(&state.db)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            Err(Error::NotFound(format!("product {}", id)).into())
        }
        Ok(_) => Ok(Json(fetch_product(&state, &id).await?)),
        Err(err) if is_unique_violation(&err) => Err(Error::InvalidInput(format!(
            "a product with SKU '{}' already exists",
            input.sku.trim()
        ))
        .into()),
        Err(err) => Err(err.into()),
    }
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE guid = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("product {}", id)).into());
    }

    tracing::info!("Deleted product {}", id);
    Ok(Json(json!({ "deleted": true })))
}

/// POST /api/products/:id/image
///
/// Multipart upload with a `file` field and an optional `kind` field
/// (`main` or `tech_drawing`, defaulting to `main`). The file is written
/// under the root folder's images directory with a random suffix and the
/// resulting `/images/...` URL is recorded on the product row.
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Ensure the product exists before writing anything to disk
    let _ = fetch_product(&state, &id).await?;

    let mut kind = String::from("main");
    let mut file_bytes: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("kind") => {
                kind = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("invalid kind field: {}", e)))?;
            }
            Some("file") => {
                let extension = field
                    .file_name()
                    .and_then(|n| n.rsplit('.').next())
                    .unwrap_or("jpg")
                    .to_ascii_lowercase();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("invalid file field: {}", e)))?;
                file_bytes = Some((bytes.to_vec(), extension));
            }
            _ => {}
        }
    }

    let (bytes, extension) = file_bytes
        .ok_or_else(|| Error::InvalidInput("missing 'file' field".to_string()))?;
    if bytes.is_empty() {
        return Err(Error::InvalidInput("uploaded file is empty".to_string()).into());
    }

    let column = match kind.as_str() {
        "main" => "image_url",
        "tech_drawing" => "tech_drawing_url",
        other => {
            return Err(Error::InvalidInput(format!(
                "kind must be 'main' or 'tech_drawing', got '{}'",
                other
            ))
            .into())
        }
    };

    let filename = format!("{}-{:08x}.{}", id, rand::random::<u32>(), extension);
    let path = state.config.images_dir.join(&filename);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(Error::from)?;

    let url = format!("/images/{}", filename);
    let sql = format!(
        "UPDATE products SET {} = ?, updated_at = datetime('now') WHERE guid = ?",
        column
    );
    sqlx::query(&sql)
        .bind(&url)
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!("Stored {} image for product {}: {}", kind, id, filename);
    Ok(Json(json!({ "url": url })))
}

async fn fetch_product(state: &AppState, guid: &str) -> Result<Product, ApiError> {
    let sql = format!("SELECT {} FROM products WHERE guid = ?", Product::COLUMNS);
    let row = sqlx::query(&sql)
        .bind(guid)
        .fetch_optional(&state.db)
        .await?;
    match row {
        Some(row) => Ok(Product::from_row(&row)),
        None => Err(Error::NotFound(format!("product {}", guid)).into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint"))
}
