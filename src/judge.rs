use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::config::JudgeConfig;
use crate::database as db;
use crate::error::{JudgeError, PollError};
use crate::judge0::{BatchEntry, ExecutionService, await_batch};
use crate::languages::Language;
use crate::verdict::{SubmissionVerdict, aggregate, aggregate_timed_out};

/// One (stdin, expected stdout) pair, read-only to the judging core.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TestCase {
    pub stdin: String,
    pub expected_output: String,
}

/// Immutable input to one judging request, assembled by the API layer.
#[derive(Debug, Clone)]
pub struct JudgingRequest {
    /// Idempotency key: retries with the same id replace, never duplicate.
    pub submission_id: String,
    pub user_id: String,
    pub problem_id: String,
    pub source_code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone)]
pub struct JudgeSettings {
    pub poll_interval: Duration,
    pub poll_deadline: Duration,
}

impl From<&JudgeConfig> for JudgeSettings {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            poll_deadline: config.poll_deadline(),
        }
    }
}

/// Coordinates one judging request end to end: dispatch, poll, aggregate,
/// persist, solved marker.
///
/// Requests for different submissions run fully in parallel; a duplicate
/// request for a submission already in flight is rejected with
/// `JudgingInProgress` instead of being processed twice.
pub struct Judger {
    service: Arc<dyn ExecutionService>,
    pool: SqlitePool,
    settings: JudgeSettings,
    inflight: Mutex<HashSet<String>>,
}

/// Releases the per-submission advisory slot on every exit path.
struct InflightSlot<'a> {
    judger: &'a Judger,
    id: String,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        self.judger.inflight.lock().remove(&self.id);
    }
}

impl Judger {
    pub fn new(service: Arc<dyn ExecutionService>, pool: SqlitePool, settings: JudgeSettings) -> Self {
        Self {
            service,
            pool,
            settings,
            inflight: Mutex::new(HashSet::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Judges a submission and persists the outcome.
    ///
    /// A polling deadline is a definitive judging outcome (a Timeout verdict,
    /// persisted); dispatch failures and caller cancellation are
    /// infrastructure errors and persist nothing.
    pub async fn judge(
        &self,
        request: JudgingRequest,
        cancel: CancellationToken,
    ) -> Result<SubmissionVerdict, JudgeError> {
        validate(&request)?;
        let language = resolve_language(&request.language)?;

        let _slot = self.claim(&request.submission_id)?;

        let verdict = self.evaluate(&request, language, &cancel).await?;

        db::save_verdict(
            &self.pool,
            &verdict,
            &request.user_id,
            &request.problem_id,
            language.name(),
            &request.source_code,
        )
        .await?;

        // Ordered after the verdict write; both are idempotent.
        if verdict.is_accepted() {
            db::mark_solved(&self.pool, &request.user_id, &request.problem_id).await?;
        }

        log::info!(
            "Submission {} judged: {}",
            verdict.submission_id,
            verdict.status.as_str()
        );

        Ok(verdict)
    }

    /// Runs the pipeline without persisting anything, for the "run code"
    /// flow where users try their solution against the sample cases.
    pub async fn run(
        &self,
        request: JudgingRequest,
        cancel: CancellationToken,
    ) -> Result<SubmissionVerdict, JudgeError> {
        validate(&request)?;
        let language = resolve_language(&request.language)?;
        self.evaluate(&request, language, &cancel).await
    }

    async fn evaluate(
        &self,
        request: &JudgingRequest,
        language: Language,
        cancel: &CancellationToken,
    ) -> Result<SubmissionVerdict, JudgeError> {
        let entries: Vec<BatchEntry> = request
            .test_cases
            .iter()
            .map(|case| BatchEntry {
                source_code: request.source_code.clone(),
                language_id: language.execution_id(),
                stdin: case.stdin.clone(),
            })
            .collect();

        let tokens = self.service.submit_batch(&entries).await?;
        log::debug!(
            "Submission {}: dispatched {} executions",
            request.submission_id,
            tokens.len()
        );

        let expected: Vec<String> = request
            .test_cases
            .iter()
            .map(|case| case.expected_output.clone())
            .collect();

        match await_batch(
            self.service.as_ref(),
            &tokens,
            self.settings.poll_interval,
            self.settings.poll_deadline,
            cancel,
        )
        .await
        {
            Ok(results) => Ok(aggregate(&request.submission_id, &expected, &results)),
            Err(PollError::DeadlineElapsed { partial }) => {
                log::warn!(
                    "Submission {}: polling deadline elapsed with {}/{} executions finished",
                    request.submission_id,
                    partial.iter().filter(|r| r.is_some()).count(),
                    partial.len()
                );
                Ok(aggregate_timed_out(&request.submission_id, &expected, &partial))
            }
            Err(PollError::Cancelled) => Err(JudgeError::Cancelled),
        }
    }

    fn claim(&self, submission_id: &str) -> Result<InflightSlot<'_>, JudgeError> {
        let mut inflight = self.inflight.lock();
        if !inflight.insert(submission_id.to_string()) {
            return Err(JudgeError::JudgingInProgress(submission_id.to_string()));
        }
        Ok(InflightSlot {
            judger: self,
            id: submission_id.to_string(),
        })
    }
}

fn validate(request: &JudgingRequest) -> Result<(), JudgeError> {
    if request.test_cases.is_empty() {
        return Err(JudgeError::InvalidRequest(
            "submission has no test cases".to_string(),
        ));
    }
    if request.source_code.trim().is_empty() {
        return Err(JudgeError::InvalidRequest(
            "source code is empty".to_string(),
        ));
    }
    Ok(())
}

fn resolve_language(name: &str) -> Result<Language, JudgeError> {
    Language::from_name(name).ok_or_else(|| JudgeError::UnsupportedLanguage(name.to_string()))
}
