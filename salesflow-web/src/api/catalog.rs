//! Catalog browsing: filtered, paginated, server-side product search

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;

use salesflow_common::db::models::Product;

use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::{api::ApiError, AppState};

/// Query parameters for catalog search
///
/// brand/type/finish are exact matches; `q` is a free-text match against
/// name, SKU, and collection name. Filtering happens in SQL, never by
/// loading the full product set into memory.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub finish: Option<String>,
    pub q: Option<String>,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

/// Catalog search response with results and pagination metadata
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub products: Vec<Product>,
}

/// Distinct filter values for the filter chips
#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub brands: Vec<String>,
    pub types: Vec<String>,
    pub finishes: Vec<String>,
}

/// GET /api/catalog?brand=&type=&finish=&q=&page=
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(brand) = query.brand.as_ref().filter(|s| !s.is_empty()) {
        conditions.push("brand = ?");
        binds.push(brand.clone());
    }
    if let Some(ptype) = query.product_type.as_ref().filter(|s| !s.is_empty()) {
        conditions.push("type = ?");
        binds.push(ptype.clone());
    }
    if let Some(finish) = query.finish.as_ref().filter(|s| !s.is_empty()) {
        conditions.push("finish = ?");
        binds.push(finish.clone());
    }
    if let Some(q) = query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        conditions.push("(name LIKE ? OR sku LIKE ? OR collection_name LIKE ?)");
        let pattern = format!("%{}%", q.trim());
        binds.push(pattern.clone());
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM products{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total_results = count_query.fetch_one(&state.db).await?;

    let pagination = calculate_pagination(total_results, query.page);

    let select_sql = format!(
        "SELECT {} FROM products{} ORDER BY name ASC LIMIT ? OFFSET ?",
        Product::COLUMNS,
        where_clause
    );
    let mut select_query = sqlx::query(&select_sql);
    for bind in &binds {
        select_query = select_query.bind(bind);
    }
    let rows = select_query
        .bind(PAGE_SIZE)
        .bind(pagination.offset)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(CatalogResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        products: rows.iter().map(Product::from_row).collect(),
    }))
}

/// GET /api/catalog/facets
///
/// Distinct brand/type/finish values present in the catalog.
pub async fn catalog_facets(
    State(state): State<AppState>,
) -> Result<Json<FacetsResponse>, ApiError> {
    Ok(Json(FacetsResponse {
        brands: distinct_values(&state, "brand").await?,
        types: distinct_values(&state, "type").await?,
        finishes: distinct_values(&state, "finish").await?,
    }))
}

async fn distinct_values(state: &AppState, column: &str) -> Result<Vec<String>, ApiError> {
    // Column names come from the fixed facet set above, never from input
    let sql = format!(
        "SELECT DISTINCT {col} FROM products WHERE {col} IS NOT NULL AND {col} != '' ORDER BY {col}",
        col = column
    );
    let rows = sqlx::query(&sql).fetch_all(&state.db).await?;
    Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
}
