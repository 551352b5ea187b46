use serde::{Deserialize, Serialize};

use crate::judge0::{
    ExecutionResult, STATUS_ACCEPTED, STATUS_COMPILATION_ERROR, STATUS_TIME_LIMIT_EXCEEDED,
    STATUS_WRONG_ANSWER,
};

/// Submission-level outcome.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Compilation Error")]
    CompileError,
    #[serde(rename = "Time Limit Exceeded")]
    Timeout,
}

impl VerdictStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong Answer",
            Self::RuntimeError => "Runtime Error",
            Self::CompileError => "Compilation Error",
            Self::Timeout => "Time Limit Exceeded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Accepted" => Some(Self::Accepted),
            "Wrong Answer" => Some(Self::WrongAnswer),
            "Runtime Error" => Some(Self::RuntimeError),
            "Compilation Error" => Some(Self::CompileError),
            "Time Limit Exceeded" => Some(Self::Timeout),
            _ => None,
        }
    }
}

/// Pass/fail decision for one test case, immutable once computed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TestCaseVerdict {
    pub index: u32,
    pub passed: bool,
    pub stdout: String,
    pub expected_output: String,
    /// Execution status surfaced verbatim for diagnostics.
    pub status: String,
    pub stderr: String,
    pub compile_output: String,
    pub time_secs: f64,
    pub memory_kb: f64,
}

/// The aggregate result of one judging request. Re-judging creates a new
/// record; an existing one is never edited.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionVerdict {
    pub submission_id: String,
    pub status: VerdictStatus,
    pub test_cases: Vec<TestCaseVerdict>,
    /// Summed across all cases, for display only.
    pub total_time_secs: f64,
    pub total_memory_kb: f64,
}

impl SubmissionVerdict {
    pub fn is_accepted(&self) -> bool {
        self.status == VerdictStatus::Accepted
    }
}

/// Grading contract: exact match after trimming leading/trailing whitespace
/// from both sides. No semantic diffing.
fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

fn case_verdict(index: u32, expected: &str, result: &ExecutionResult) -> TestCaseVerdict {
    let stdout = result.stdout.clone().unwrap_or_default();
    // A non-success execution status fails the case regardless of output.
    let passed = result.status.id == STATUS_ACCEPTED && outputs_match(&stdout, expected);

    TestCaseVerdict {
        index,
        passed,
        stdout,
        expected_output: expected.to_string(),
        status: result.status.description.clone(),
        stderr: result.stderr.clone().unwrap_or_default(),
        compile_output: result.compile_output.clone().unwrap_or_default(),
        time_secs: result.time_secs(),
        memory_kb: result.memory_kb(),
    }
}

fn unfinished_case_verdict(index: u32, expected: &str) -> TestCaseVerdict {
    TestCaseVerdict {
        index,
        passed: false,
        stdout: String::new(),
        expected_output: expected.to_string(),
        status: "Did Not Finish".to_string(),
        stderr: String::new(),
        compile_output: String::new(),
        time_secs: 0.0,
        memory_kb: 0.0,
    }
}

fn reduce(cases: &[TestCaseVerdict], results: &[&ExecutionResult]) -> VerdictStatus {
    if cases.iter().all(|c| c.passed) {
        return VerdictStatus::Accepted;
    }

    // A compile error is submission-global: compilation happens once per
    // language even though the service reports it per case, so it outranks
    // whatever the first failing case says.
    if results
        .iter()
        .any(|r| r.status.id == STATUS_COMPILATION_ERROR)
    {
        return VerdictStatus::CompileError;
    }

    let first_failed = cases
        .iter()
        .position(|c| !c.passed)
        .and_then(|i| results.get(i));
    match first_failed {
        Some(result) => match result.status.id {
            // Ran fine but printed the wrong thing.
            STATUS_ACCEPTED | STATUS_WRONG_ANSWER => VerdictStatus::WrongAnswer,
            STATUS_TIME_LIMIT_EXCEEDED => VerdictStatus::Timeout,
            _ => VerdictStatus::RuntimeError,
        },
        None => VerdictStatus::RuntimeError,
    }
}

/// Reduces a complete set of terminal results into a submission verdict.
///
/// `expected` and `results` are in test-case order and must have the same
/// length; the output keeps that order.
pub fn aggregate(
    submission_id: &str,
    expected: &[String],
    results: &[ExecutionResult],
) -> SubmissionVerdict {
    let cases: Vec<TestCaseVerdict> = expected
        .iter()
        .zip(results.iter())
        .enumerate()
        .map(|(i, (exp, result))| case_verdict(i as u32, exp, result))
        .collect();

    let status = reduce(&cases, &results.iter().collect::<Vec<_>>());
    finish(submission_id, status, cases)
}

/// Builds the verdict for a batch whose polling deadline elapsed. Cases with
/// a terminal result keep it; the rest are marked failed as "Did Not Finish".
/// The overall status is always `Timeout`.
pub fn aggregate_timed_out(
    submission_id: &str,
    expected: &[String],
    partial: &[Option<ExecutionResult>],
) -> SubmissionVerdict {
    let cases: Vec<TestCaseVerdict> = expected
        .iter()
        .zip(partial.iter())
        .enumerate()
        .map(|(i, (exp, result))| match result {
            Some(result) => case_verdict(i as u32, exp, result),
            None => unfinished_case_verdict(i as u32, exp),
        })
        .collect();

    finish(submission_id, VerdictStatus::Timeout, cases)
}

fn finish(
    submission_id: &str,
    status: VerdictStatus,
    cases: Vec<TestCaseVerdict>,
) -> SubmissionVerdict {
    let total_time_secs = cases.iter().map(|c| c.time_secs).sum();
    let total_memory_kb = cases.iter().map(|c| c.memory_kb).sum();

    SubmissionVerdict {
        submission_id: submission_id.to_string(),
        status,
        test_cases: cases,
        total_time_secs,
        total_memory_kb,
    }
}
