//! Database row models

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A catalog product row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub guid: String,
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
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    /// Column list matching [`Product::from_row`], for SELECT statements
    pub const COLUMNS: &'static str = "guid, sku, name, brand, price, type, collection_name, \
         finish, description, image_url, tech_drawing_url, created_at, updated_at";

    /// Map a row selected with [`Product::COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            guid: row.get(0),
            sku: row.get(1),
            name: row.get(2),
            brand: row.get(3),
            price: row.get(4),
            product_type: row.get(5),
            collection_name: row.get(6),
            finish: row.get(7),
            description: row.get(8),
            image_url: row.get(9),
            tech_drawing_url: row.get(10),
            created_at: row.get(11),
            updated_at: row.get(12),
        }
    }
}

/// A persisted dossier snapshot row (listing shape; `data` is loaded separately)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierRecord {
    pub guid: String,
    pub client_name: String,
    pub project_name: String,
    pub salesperson: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DossierRecord {
    /// Column list matching [`DossierRecord::from_row`]
    pub const COLUMNS: &'static str =
        "guid, client_name, project_name, salesperson, created_at, updated_at";

    /// Map a row selected with [`DossierRecord::COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            guid: row.get(0),
            client_name: row.get(1),
            project_name: row.get(2),
            salesperson: row.get(3),
            created_at: row.get(4),
            updated_at: row.get(5),
        }
    }
}
