use thiserror::Error;

use crate::judge0::ExecutionResult;

/// Error taxonomy of the judging pipeline.
///
/// Infrastructure failures are kept distinct from legitimate verdicts: a
/// `DispatchFailed` means "we could not judge your code right now" and never
/// turns into an Accepted/Rejected outcome.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Malformed input (empty test-case list, missing expected output).
    /// Not retryable, surfaced to the caller as a client error.
    #[error("invalid judging request: {0}")]
    InvalidRequest(String),

    /// Language not present in the registry. The dispatcher is never invoked.
    #[error("language '{0}' is not supported")]
    UnsupportedLanguage(String),

    /// Network failure or non-success response while talking to the remote
    /// execution service. Retryable by the caller; no verdict is persisted.
    #[error("failed to reach the execution service: {0}")]
    DispatchFailed(String),

    /// A concurrent judgement for the same submission id is already running.
    #[error("submission {0} is already being judged")]
    JudgingInProgress(String),

    /// The caller went away before polling completed. The remote executions
    /// keep running, but nothing is persisted.
    #[error("judging was cancelled by the caller")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        JudgeError::DispatchFailed(err.to_string())
    }
}

/// Outcome of a polling loop that did not finish cleanly.
#[derive(Debug)]
pub enum PollError {
    /// The deadline elapsed before every token turned terminal. `partial`
    /// holds the results in token order; `None` marks tokens still pending.
    DeadlineElapsed {
        partial: Vec<Option<ExecutionResult>>,
    },
    /// The caller's cancellation token fired.
    Cancelled,
}
