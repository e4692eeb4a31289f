// ============================================================
// REVIEW SERVICE CLIENT
// ============================================================
// Wire types and HTTP client for the batch ingestion endpoint and
// the completion/status endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{IngestError, Result};
use crate::domain::table::RowRecord;

/// One batch call payload, exactly as the ingestion endpoint expects it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest<'a> {
    pub batch_id: &'a str,
    pub batch_number: u32,
    pub total_batches: u32,
    pub rows: &'a [RowRecord],
    /// Filter criteria passed through untouched.
    pub sources: &'a [String],
    /// Original upload name, informational only.
    pub file_name: &'a str,
    pub is_final: bool,
}

/// Acknowledgement for one batch. Non-final batches may carry a server
/// progress figure; the final batch may already carry the result
/// location when processing completed synchronously.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchAck {
    pub progress: Option<u8>,
    pub result_location: Option<String>,
}

/// What the status endpoint reports for a submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionStatus {
    pub ready: bool,
    pub result_location: Option<String>,
}

/// Client-side view of the review/processing service.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn submit_batch(&self, request: &BatchRequest<'_>) -> Result<BatchAck>;
    async fn fetch_status(&self, batch_id: &str) -> Result<CompletionStatus>;
}

pub struct HttpReviewApi {
    client: reqwest::Client,
    base_url: String,
    batch_path: String,
    status_path: String,
}

impl HttpReviewApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            batch_path: "/ingest/batch".to_string(),
            status_path: "/ingest/status".to_string(),
        }
    }

    /// Override the endpoint paths appended to the base URL.
    pub fn with_paths(
        mut self,
        batch_path: impl Into<String>,
        status_path: impl Into<String>,
    ) -> Self {
        self.batch_path = batch_path.into();
        self.status_path = status_path.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl ReviewApi for HttpReviewApi {
    async fn submit_batch(&self, request: &BatchRequest<'_>) -> Result<BatchAck> {
        let url = self.endpoint(&self.batch_path);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| IngestError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Transport(extract_error_message(status, &body)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| IngestError::Transport(format!("Failed to parse JSON: {}", e)))?;

        Ok(parse_batch_ack(&json))
    }

    async fn fetch_status(&self, batch_id: &str) -> Result<CompletionStatus> {
        let url = format!("{}/{}", self.endpoint(&self.status_path), batch_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Transport(extract_error_message(status, &body)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| IngestError::Transport(format!("Failed to parse JSON: {}", e)))?;

        Ok(parse_completion_status(&json))
    }
}

/// Extract the best available error detail from a failed response.
///
/// Three-level fallback, in order: structured error body fields, the
/// raw body text, the HTTP status phrase. The endpoint fails at
/// different layers (validation, unexpected exception, gateway) with
/// correspondingly different error shapes, so all three are needed.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = structured_error_message(&value) {
            return message;
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    )
}

fn structured_error_message(value: &Value) -> Option<String> {
    let base = value["error"]["message"]
        .as_str()
        .or_else(|| value["message"].as_str())
        .or_else(|| value["error"].as_str())?;

    let mut message = base.to_string();
    if let Some(details) = value["error"]["details"].as_str() {
        message.push_str(": ");
        message.push_str(details);
    }
    Some(message)
}

/// Progress and result location may come nested under `data` or at the
/// top level, depending on which server layer answered.
pub fn parse_batch_ack(value: &Value) -> BatchAck {
    let progress = value["data"]["progress"]
        .as_u64()
        .or_else(|| value["progress"].as_u64())
        .map(|p| p.min(100) as u8);

    BatchAck {
        progress,
        result_location: result_location(value),
    }
}

pub fn parse_completion_status(value: &Value) -> CompletionStatus {
    let location = result_location(value);

    let status_done = match value["data"]["status"]
        .as_str()
        .or_else(|| value["status"].as_str())
    {
        // No explicit status field: the location alone decides.
        None => true,
        Some(s) => {
            s.eq_ignore_ascii_case("complete")
                || s.eq_ignore_ascii_case("completed")
                || s.eq_ignore_ascii_case("ready")
                || s.eq_ignore_ascii_case("done")
        }
    };

    CompletionStatus {
        ready: location.is_some() && status_done,
        result_location: location,
    }
}

fn result_location(value: &Value) -> Option<String> {
    value["data"]["downloadUrl"]
        .as_str()
        .or_else(|| value["downloadUrl"].as_str())
        .map(|s| s.to_string())
}
