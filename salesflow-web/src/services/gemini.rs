//! Google Gemini client for voice note deal extraction
//!
//! Sends the recorded audio inline (base64) with an extraction prompt and
//! parses the model's JSON reply. Model output is untrusted: replies wrapped
//! in markdown fences are unwrapped, and anything unparseable degrades to a
//! placeholder extraction carrying the raw text instead of failing.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Title used when the model reply cannot be parsed as an extraction
pub const UNPROCESSED_TITLE: &str = "Nota de Voz (Sin procesar)";

const EXTRACTION_PROMPT: &str = "Listen to this voice note from a salesperson and extract deal \
information. Respond with ONLY a JSON object, no prose, with these fields: \
\"title\" (short deal title), \"value\" (numeric deal amount, 0 if not mentioned), \
\"client_name\" (contact person name or null), \"company_name\" (organization name or null), \
\"note_content\" (a clean transcription/summary of the note). The note may be in Spanish.";

/// Errors from the Gemini API client
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gemini response contained no text")]
    EmptyResponse,
}

/// Structured deal data pulled out of a voice note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealExtraction {
    pub title: String,
    pub value: f64,
    pub client_name: Option<String>,
    pub company_name: Option<String>,
    pub note_content: String,
}

/// Client for the Gemini generateContent API
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
        }
    }

    /// Extract deal information from a recorded voice note
    pub async fn extract_deal(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<DealExtraction, GeminiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": EXTRACTION_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": encoded } }
                ]
            }]
        });

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.model, self.api_key
        );
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: Value = response.json().await?;
        let text = reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(GeminiError::EmptyResponse)?;

        Ok(parse_extraction(text))
    }
}

/// Parse a model reply into a [`DealExtraction`]
///
/// Markdown code fences are stripped first. If the remainder is not the
/// expected JSON object, the raw text becomes the note content under a
/// placeholder title rather than an error.
pub fn parse_extraction(raw: &str) -> DealExtraction {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() {
            return DealExtraction {
                title: value["title"]
                    .as_str()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(UNPROCESSED_TITLE)
                    .to_string(),
                value: coerce_number(&value["value"]),
                client_name: non_empty_string(&value["client_name"]),
                company_name: non_empty_string(&value["company_name"]),
                note_content: value["note_content"]
                    .as_str()
                    .unwrap_or(raw)
                    .to_string(),
            };
        }
    }

    DealExtraction {
        title: UNPROCESSED_TITLE.to_string(),
        value: 0.0,
        client_name: None,
        company_name: None,
        note_content: raw.to_string(),
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Opening fence may carry a language tag (```json)
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.trim();
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        // Models sometimes quote the amount ("1500" or "1,500.00")
        Value::String(s) => s.replace(',', "").trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_reply() {
        let raw = r#"{"title": "Proyecto Villa Flora", "value": 15000,
            "client_name": "Carlos Mendez", "company_name": "Grupo Flora",
            "note_content": "Cliente quiere griferia dorada"}"#;
        let extraction = parse_extraction(raw);
        assert_eq!(extraction.title, "Proyecto Villa Flora");
        assert_eq!(extraction.value, 15000.0);
        assert_eq!(extraction.client_name.as_deref(), Some("Carlos Mendez"));
        assert_eq!(extraction.company_name.as_deref(), Some("Grupo Flora"));
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "```json\n{\"title\": \"Deal\", \"value\": 500, \"note_content\": \"hi\"}\n```";
        let extraction = parse_extraction(raw);
        assert_eq!(extraction.title, "Deal");
        assert_eq!(extraction.value, 500.0);
        assert_eq!(extraction.note_content, "hi");
    }

    #[test]
    fn coerces_quoted_value() {
        let raw = r#"{"title": "Deal", "value": "1,500.50", "note_content": "x"}"#;
        assert_eq!(parse_extraction(raw).value, 1500.5);
    }

    #[test]
    fn malformed_reply_falls_back_to_raw_note() {
        let raw = "The client wants three shower systems, no JSON here.";
        let extraction = parse_extraction(raw);
        assert_eq!(extraction.title, UNPROCESSED_TITLE);
        assert_eq!(extraction.value, 0.0);
        assert_eq!(extraction.client_name, None);
        assert_eq!(extraction.note_content, raw);
    }

    #[test]
    fn null_and_empty_names_become_none() {
        let raw = r#"{"title": "Deal", "value": 1, "client_name": null,
            "company_name": "  ", "note_content": "x"}"#;
        let extraction = parse_extraction(raw);
        assert_eq!(extraction.client_name, None);
        assert_eq!(extraction.company_name, None);
    }

    #[test]
    fn missing_title_gets_placeholder() {
        let raw = r#"{"value": 10, "note_content": "x"}"#;
        assert_eq!(parse_extraction(raw).title, UNPROCESSED_TITLE);
    }
}
