use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::endpoint::endpoint_url;

const ANALYZE_PATH: &str = "api/analyze";

pub const ANALYZE_FAILED_MESSAGE: &str = "Failed to research company. Please try again.";

/// Body of a single-shot analysis request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzePayload {
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_schema: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_notes: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid analyze url: {0}")]
    InvalidUrl(String),
}

impl AnalyzeError {
    /// What the user sees for any failure; the details only go to the log.
    pub fn user_message(&self) -> &'static str {
        ANALYZE_FAILED_MESSAGE
    }
}

/// Runs a whole analysis in one request/response exchange.
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    client: reqwest::Client,
    base: Url,
}

impl AnalyzeClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, AnalyzeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AnalyzeError::Network(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub async fn analyze(&self, payload: &AnalyzePayload, token: &str) -> Result<Value, AnalyzeError> {
        let url = endpoint_url(&self.base, ANALYZE_PATH)
            .map_err(|err| AnalyzeError::InvalidUrl(err.to_string()))?;
        engine_info!("analyze request for {:?}", payload.company);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|err| AnalyzeError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            engine_warn!("analyze failed with status {}", status);
            return Err(AnalyzeError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|err| AnalyzeError::Network(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| AnalyzeError::InvalidResponse(err.to_string()))
    }
}
