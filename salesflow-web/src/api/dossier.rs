//! Dossier PDF generation endpoint

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use salesflow_common::dossier::Section;
use salesflow_common::Error;

use crate::services::renderer::{self, DossierDocument};
use crate::{api::ApiError, AppState};

/// Body for POST /api/dossier/generate
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub date: String,
    pub salesperson: Option<String>,
    #[serde(default)]
    pub hide_prices: bool,
}

/// POST /api/dossier/generate
///
/// Renders the dossier to PDF and returns it as an attachment. An empty
/// dossier (no items in any section) is rejected.
pub async fn generate_dossier(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let item_count: usize = request.sections.iter().map(|s| s.items.len()).sum();
    if item_count == 0 {
        return Err(Error::InvalidInput(
            "cannot generate a PDF from an empty dossier".to_string(),
        )
        .into());
    }

    let document = DossierDocument {
        sections: request.sections,
        client_name: request.client_name,
        project_name: request.project_name,
        date: request.date,
        salesperson: request
            .salesperson
            .unwrap_or_else(|| state.config.default_salesperson.clone()),
        hide_prices: request.hide_prices,
    };

    let filename = renderer::attachment_filename(&document.client_name, &document.project_name);
    let bytes = renderer::render_pdf(&document)
        .map_err(|e| Error::Internal(format!("PDF generation failed: {}", e)))?;

    tracing::info!(
        "Generated dossier PDF: {} items, {} bytes",
        item_count,
        bytes.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
