//! Integration tests for database initialization

use salesflow_common::db::{self, init::get_setting};

#[tokio::test]
async fn init_creates_database_file_and_tables() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("salesflow.db");

    let pool = db::init_database(&db_path).await.expect("Should init database");

    assert!(db_path.exists());

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .expect("Should list tables");

    for expected in ["products", "dossiers", "settings"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {}, got {:?}",
            expected,
            tables
        );
    }
}

#[tokio::test]
async fn init_seeds_default_settings() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = db::init_database(&dir.path().join("salesflow.db"))
        .await
        .expect("Should init database");

    let salesperson = get_setting(&pool, "default_salesperson", "")
        .await
        .expect("Should read setting");
    assert!(!salesperson.is_empty());

    let page_size = get_setting(&pool, "catalog_page_size", "0")
        .await
        .expect("Should read setting");
    assert_eq!(page_size, "24");
}

#[tokio::test]
async fn init_is_idempotent() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("salesflow.db");

    let pool = db::init_database(&db_path).await.expect("First init");
    sqlx::query("INSERT INTO products (guid, sku, name, brand, price) VALUES ('g1', 'SKU-1', 'Mixer', 'Axor', 100.0)")
        .execute(&pool)
        .await
        .expect("Should insert");
    drop(pool);

    // Re-running init against an existing database must not clobber data
    let pool = db::init_database(&db_path).await.expect("Second init");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .expect("Should count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn get_setting_falls_back_to_default_for_unknown_key() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = db::init_database(&dir.path().join("salesflow.db"))
        .await
        .expect("Should init database");

    let value = get_setting(&pool, "no_such_key", "fallback")
        .await
        .expect("Should read setting");
    assert_eq!(value, "fallback");
}
