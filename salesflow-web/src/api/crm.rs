//! CRM gateway: deal creation in Pipedrive, manual and voice-driven

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use salesflow_common::Error;

use crate::services::gemini::GeminiClient;
use crate::services::pipedrive::{DealStatus, PipedriveClient};
use crate::{api::ApiError, AppState};

/// Body for POST /api/crm/deal
#[derive(Debug, Deserialize)]
pub struct DealRequest {
    pub title: String,
    #[serde(default)]
    pub value: f64,
    pub client_name: String,
    #[serde(default)]
    pub stage: String,
}

/// POST /api/crm/deal
///
/// Creates a deal for a person resolved (or created) by name. Person
/// resolution failure degrades to a deal without a person rather than
/// failing the request.
pub async fn create_deal(
    State(state): State<AppState>,
    Json(request): Json<DealRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.title.trim().is_empty() {
        return Err(Error::InvalidInput("title is required".to_string()).into());
    }
    if request.client_name.trim().is_empty() {
        return Err(Error::InvalidInput("client_name is required".to_string()).into());
    }

    let client = pipedrive_client(&state)?;

    let person_id = match resolve_person(&client, request.client_name.trim(), None).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("Person resolution failed, creating deal without person: {}", e);
            None
        }
    };

    let status = DealStatus::from_stage(&request.stage);
    let deal_id = client
        .create_deal(request.title.trim(), request.value, person_id, None, status)
        .await
        .map_err(|e| Error::Upstream(format!("deal creation failed: {}", e)))?;

    tracing::info!("Created deal {} ({})", deal_id, status.as_str());
    Ok(Json(json!({ "deal_id": deal_id, "person_id": person_id })))
}

/// POST /api/crm/voice-deal
///
/// Full pipeline: audio upload, Gemini extraction, organization and person
/// resolution, deal creation, then a note with the transcription. Steps
/// after deal creation are best-effort; there is no rollback of earlier
/// steps when a later one fails.
pub async fn create_voice_deal(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let google_key = state.config.google_api_key.clone().ok_or_else(|| {
        Error::Config("GOOGLE_API_KEY is not configured; voice deals are unavailable".to_string())
    })?;
    let client = pipedrive_client(&state)?;

    let (audio, mime_type) = super::voice::read_audio_field(multipart).await?;

    let gemini = GeminiClient::new(
        state.http.clone(),
        google_key,
        state.config.gemini_model.clone(),
    );
    let extraction = gemini
        .extract_deal(&audio, &mime_type)
        .await
        .map_err(|e| Error::Upstream(format!("voice extraction failed: {}", e)))?;

    let org_id = match &extraction.company_name {
        Some(name) => match resolve_organization(&client, name).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Organization resolution failed: {}", e);
                None
            }
        },
        None => None,
    };

    let person_id = match &extraction.client_name {
        Some(name) => match resolve_person(&client, name, org_id).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Person resolution failed: {}", e);
                None
            }
        },
        None => None,
    };

    let deal_id = client
        .create_deal(
            &extraction.title,
            extraction.value,
            person_id,
            org_id,
            DealStatus::Open,
        )
        .await
        .map_err(|e| Error::Upstream(format!("deal creation failed: {}", e)))?;

    let mut note_attached = false;
    if !extraction.note_content.trim().is_empty() {
        match client.add_note(deal_id, &extraction.note_content).await {
            Ok(()) => note_attached = true,
            Err(e) => tracing::warn!("Note attachment failed for deal {}: {}", deal_id, e),
        }
    }

    tracing::info!("Created voice deal {} ('{}')", deal_id, extraction.title);
    Ok(Json(json!({
        "deal_id": deal_id,
        "person_id": person_id,
        "org_id": org_id,
        "note_attached": note_attached,
        "extraction": extraction,
    })))
}

fn pipedrive_client(state: &AppState) -> Result<PipedriveClient, Error> {
    let api_key = state.config.pipedrive_api_key.clone().ok_or_else(|| {
        Error::Config("PIPEDRIVE_API_KEY is not configured; CRM features are unavailable".to_string())
    })?;
    Ok(PipedriveClient::new(
        state.http.clone(),
        api_key,
        state.config.pipedrive_base_url.clone(),
    ))
}

async fn resolve_person(
    client: &PipedriveClient,
    name: &str,
    org_id: Option<i64>,
) -> Result<i64, crate::services::pipedrive::PipedriveError> {
    match client.search_person(name).await? {
        Some(id) => Ok(id),
        None => client.create_person(name, org_id).await,
    }
}

async fn resolve_organization(
    client: &PipedriveClient,
    name: &str,
) -> Result<i64, crate::services::pipedrive::PipedriveError> {
    match client.search_organization(name).await? {
        Some(id) => Ok(id),
        None => client.create_organization(name).await,
    }
}
