//! Pipedrive CRM client
//!
//! Thin wrapper over the Pipedrive v1 REST API using the shared reqwest
//! client. Authentication is the `api_token` query parameter on every
//! request. Person and organization lookups are search-or-create.

use serde_json::{json, Value};
use thiserror::Error;

/// Errors from the Pipedrive API client
#[derive(Debug, Error)]
pub enum PipedriveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pipedrive API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Deal status derived from the requested pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStatus {
    Open,
    Won,
}

impl DealStatus {
    /// Map a stage label to a deal status: "Won" closes the deal, any other
    /// stage leaves it open.
    pub fn from_stage(stage: &str) -> Self {
        if stage == "Won" {
            DealStatus::Won
        } else {
            DealStatus::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Open => "open",
            DealStatus::Won => "won",
        }
    }
}

/// Client for the Pipedrive v1 API
pub struct PipedriveClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PipedriveClient {
    pub fn new(http: reqwest::Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}?api_token={}", self.base_url, path, self.api_key)
    }

    async fn check(response: reqwest::Response) -> Result<Value, PipedriveError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PipedriveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Find an existing person by name, returning its id
    pub async fn search_person(&self, name: &str) -> Result<Option<i64>, PipedriveError> {
        let url = format!(
            "{}&term={}&fields=name&limit=1",
            self.url("/persons/search"),
            urlencode(name)
        );
        let body = Self::check(self.http.get(&url).send().await?).await?;
        Ok(first_search_hit_id(&body))
    }

    /// Create a person, optionally attached to an organization
    pub async fn create_person(
        &self,
        name: &str,
        org_id: Option<i64>,
    ) -> Result<i64, PipedriveError> {
        let mut payload = json!({ "name": name });
        if let Some(org_id) = org_id {
            payload["org_id"] = json!(org_id);
        }
        let body = Self::check(
            self.http
                .post(self.url("/persons"))
                .json(&payload)
                .send()
                .await?,
        )
        .await?;
        created_id(&body)
    }

    /// Find an existing organization by name, returning its id
    pub async fn search_organization(&self, name: &str) -> Result<Option<i64>, PipedriveError> {
        let url = format!(
            "{}&term={}&fields=name&limit=1",
            self.url("/organizations/search"),
            urlencode(name)
        );
        let body = Self::check(self.http.get(&url).send().await?).await?;
        Ok(first_search_hit_id(&body))
    }

    /// Create an organization
    pub async fn create_organization(&self, name: &str) -> Result<i64, PipedriveError> {
        let body = Self::check(
            self.http
                .post(self.url("/organizations"))
                .json(&json!({ "name": name }))
                .send()
                .await?,
        )
        .await?;
        created_id(&body)
    }

    /// Create a deal
    pub async fn create_deal(
        &self,
        title: &str,
        value: f64,
        person_id: Option<i64>,
        org_id: Option<i64>,
        status: DealStatus,
    ) -> Result<i64, PipedriveError> {
        let mut payload = json!({
            "title": title,
            "value": value,
            "status": status.as_str(),
        });
        if let Some(person_id) = person_id {
            payload["person_id"] = json!(person_id);
        }
        if let Some(org_id) = org_id {
            payload["org_id"] = json!(org_id);
        }
        let body = Self::check(
            self.http
                .post(self.url("/deals"))
                .json(&payload)
                .send()
                .await?,
        )
        .await?;
        created_id(&body)
    }

    /// Attach a note to a deal
    pub async fn add_note(&self, deal_id: i64, content: &str) -> Result<(), PipedriveError> {
        Self::check(
            self.http
                .post(self.url("/notes"))
                .json(&json!({ "deal_id": deal_id, "content": content }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

fn first_search_hit_id(body: &Value) -> Option<i64> {
    body["data"]["items"][0]["item"]["id"].as_i64()
}

fn created_id(body: &Value) -> Result<i64, PipedriveError> {
    body["data"]["id"].as_i64().ok_or_else(|| PipedriveError::Api {
        status: 200,
        message: "response missing created id".to_string(),
    })
}

fn urlencode(value: &str) -> String {
    // Query-string encoding for search terms; names only need the basics
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
