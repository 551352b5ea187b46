use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ExecutionResult, Token};
use crate::error::JudgeError;

/// One queued execution: a source/stdin pair bound to an execution
/// environment on the remote service.
#[derive(Serialize, Debug, Clone)]
pub struct BatchEntry {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
}

/// Seam between the judging pipeline and the remote execution service.
///
/// The production implementation talks HTTP; tests substitute a scripted
/// fake so the pipeline can be exercised without a network.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Submits all entries as one batch. Returns one token per entry, in
    /// entry order.
    async fn submit_batch(&self, entries: &[BatchEntry]) -> Result<Vec<Token>, JudgeError>;

    /// Fetches the current state of all tokens in one call.
    async fn fetch_batch(&self, tokens: &[Token]) -> Result<Vec<ExecutionResult>, JudgeError>;
}

/// HTTP client for a Judge0-compatible execution service.
///
/// The `reqwest::Client` is injected at construction so the same connection
/// pool is shared across requests and tests can point it anywhere.
pub struct Judge0Client {
    http: reqwest::Client,
    base_url: String,
}

impl Judge0Client {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    submissions: &'a [BatchEntry],
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: Token,
}

#[derive(Deserialize)]
struct BatchCreated {
    submissions: Vec<TokenEnvelope>,
}

#[derive(Deserialize)]
struct BatchStatus {
    submissions: Vec<ExecutionResult>,
}

#[async_trait]
impl ExecutionService for Judge0Client {
    async fn submit_batch(&self, entries: &[BatchEntry]) -> Result<Vec<Token>, JudgeError> {
        let url = format!("{}/submissions/batch?base64_encoded=false", self.base_url);
        log::debug!("Dispatching batch of {} executions to {url}", entries.len());

        let response = self
            .http
            .post(&url)
            .json(&BatchRequest {
                submissions: entries,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::DispatchFailed(format!(
                "batch submission rejected with {status}: {body}"
            )));
        }

        let created: BatchCreated = response.json().await?;
        if created.submissions.len() != entries.len() {
            return Err(JudgeError::DispatchFailed(format!(
                "expected {} tokens but the service returned {}",
                entries.len(),
                created.submissions.len()
            )));
        }

        Ok(created.submissions.into_iter().map(|s| s.token).collect())
    }

    async fn fetch_batch(&self, tokens: &[Token]) -> Result<Vec<ExecutionResult>, JudgeError> {
        let joined = tokens
            .iter()
            .map(|t| t.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/submissions/batch?tokens={joined}&base64_encoded=false",
            self.base_url
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::DispatchFailed(format!(
                "batch status query rejected with {status}: {body}"
            )));
        }

        let batch: BatchStatus = response.json().await?;
        Ok(batch.submissions)
    }
}
