//! Dossier project persistence: save, list, check, load, delete

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

use salesflow_common::db::models::DossierRecord;
use salesflow_common::dossier::Snapshot;
use salesflow_common::Error;
use uuid::Uuid;

use crate::{api::ApiError, AppState};

/// Most recent saved dossiers shown in the load dialog
const LIST_LIMIT: i64 = 20;

/// Body for POST /api/dossiers
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub client_name: String,
    pub project_name: String,
    pub snapshot: Snapshot,
    /// When set, replaces the named record instead of creating a new one
    pub overwrite_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    #[serde(flatten)]
    pub record: DossierRecord,
    pub snapshot: Snapshot,
}

/// GET /api/dossiers
pub async fn list_dossiers(
    State(state): State<AppState>,
) -> Result<Json<Vec<DossierRecord>>, ApiError> {
    let sql = format!(
        "SELECT {} FROM dossiers ORDER BY updated_at DESC LIMIT ?",
        DossierRecord::COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(LIST_LIMIT)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(rows.iter().map(DossierRecord::from_row).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub client_name: String,
    pub project_name: String,
}

/// GET /api/dossiers/check?client_name=&project_name=
///
/// Lets the UI ask "does a save for this client/project already exist?"
/// before deciding between overwrite and save-as-new.
pub async fn check_existing(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sql = format!(
        "SELECT {} FROM dossiers WHERE client_name = ? AND project_name = ? \
         ORDER BY updated_at DESC LIMIT 1",
        DossierRecord::COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&query.client_name)
        .bind(&query.project_name)
        .fetch_optional(&state.db)
        .await?;

    match row {
        Some(row) => Ok(Json(json!({
            "exists": true,
            "dossier": DossierRecord::from_row(&row),
        }))),
        None => Ok(Json(json!({ "exists": false }))),
    }
}

/// POST /api/dossiers
pub async fn save_dossier(
    State(state): State<AppState>,
    Json(mut request): Json<SaveRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if request.client_name.trim().is_empty() {
        return Err(Error::InvalidInput("client_name is required".to_string()).into());
    }
    if request.project_name.trim().is_empty() {
        return Err(Error::InvalidInput("project_name is required".to_string()).into());
    }

    request.snapshot.saved_at = Some(Utc::now());
    let data = serde_json::to_string(&request.snapshot)
        .map_err(|e| Error::Internal(format!("snapshot serialization failed: {}", e)))?;

    if let Some(overwrite_id) = &request.overwrite_id {
        let result = sqlx::query(
            "UPDATE dossiers SET client_name = ?, project_name = ?, salesperson = ?, \
             data = ?, updated_at = datetime('now') WHERE guid = ?",
        )
        .bind(request.client_name.trim())
        .bind(request.project_name.trim())
        .bind(&request.snapshot.salesperson)
        .bind(&data)
        .bind(overwrite_id)
        .execute(&state.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("dossier {}", overwrite_id)).into());
        }

        tracing::info!("Overwrote dossier {}", overwrite_id);
        return Ok((StatusCode::OK, Json(json!({ "guid": overwrite_id }))));
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO dossiers (guid, client_name, project_name, salesperson, data) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(request.client_name.trim())
    .bind(request.project_name.trim())
    .bind(&request.snapshot.salesperson)
    .bind(&data)
    .execute(&state.db)
    .await?;

    tracing::info!("Saved new dossier {}", guid);
    Ok((StatusCode::CREATED, Json(json!({ "guid": guid }))))
}

/// GET /api/dossiers/:id
pub async fn load_dossier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoadResponse>, ApiError> {
    let sql = format!(
        "SELECT {}, data FROM dossiers WHERE guid = ?",
        DossierRecord::COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("dossier {}", id)))?;

    let record = DossierRecord::from_row(&row);
    let data: String = row.get("data");
    let snapshot: Snapshot = serde_json::from_str(&data)
        .map_err(|e| Error::Internal(format!("stored snapshot is corrupt: {}", e)))?;

    Ok(Json(LoadResponse { record, snapshot }))
}

/// DELETE /api/dossiers/:id
pub async fn delete_dossier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM dossiers WHERE guid = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("dossier {}", id)).into());
    }

    tracing::info!("Deleted dossier {}", id);
    Ok(Json(json!({ "deleted": true })))
}
