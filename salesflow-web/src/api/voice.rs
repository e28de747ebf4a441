//! Voice note deal extraction endpoint

use axum::extract::{Multipart, State};
use axum::Json;

use salesflow_common::Error;

use crate::services::gemini::{DealExtraction, GeminiClient};
use crate::{api::ApiError, AppState};

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// POST /api/voice/extract
///
/// Multipart audio upload (`file` or `audio` field). The audio goes to
/// Gemini inline; the response is always a valid extraction, degrading to
/// a placeholder title with the raw text when the model output cannot be
/// parsed.
pub async fn extract_deal(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DealExtraction>, ApiError> {
    let api_key = state.config.google_api_key.clone().ok_or_else(|| {
        Error::Config("GOOGLE_API_KEY is not configured; voice extraction is unavailable".to_string())
    })?;

    let (audio, mime_type) = read_audio_field(multipart).await?;

    let client = GeminiClient::new(state.http.clone(), api_key, state.config.gemini_model.clone());
    let extraction = client
        .extract_deal(&audio, &mime_type)
        .await
        .map_err(|e| Error::Upstream(format!("voice extraction failed: {}", e)))?;

    tracing::info!(
        "Extracted deal from {} byte voice note: '{}'",
        audio.len(),
        extraction.title
    );
    Ok(Json(extraction))
}

/// Pull the audio bytes and mime type out of a multipart body
pub(crate) async fn read_audio_field(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, String), Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        if !matches!(field.name(), Some("file") | Some("audio")) {
            continue;
        }
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_AUDIO_MIME)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("invalid audio field: {}", e)))?;
        if bytes.is_empty() {
            return Err(Error::InvalidInput("audio file is empty".to_string()));
        }
        return Ok((bytes.to_vec(), mime_type));
    }

    Err(Error::InvalidInput(
        "missing 'file' or 'audio' multipart field".to_string(),
    ))
}
