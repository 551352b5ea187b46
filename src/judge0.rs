mod client;
mod poller;

pub use client::{BatchEntry, ExecutionService, Judge0Client};
pub use poller::await_batch;

use serde::{Deserialize, Serialize};

// Status ids fixed by the remote execution service. 1 and 2 are the only
// non-terminal states; everything above is final.
pub const STATUS_IN_QUEUE: u32 = 1;
pub const STATUS_PROCESSING: u32 = 2;
pub const STATUS_ACCEPTED: u32 = 3;
pub const STATUS_WRONG_ANSWER: u32 = 4;
pub const STATUS_TIME_LIMIT_EXCEEDED: u32 = 5;
pub const STATUS_COMPILATION_ERROR: u32 = 6;

/// Opaque handle identifying one queued execution on the remote service.
///
/// Lives from dispatch until poll completion; never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Token(pub String);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusInfo {
    pub id: u32,
    pub description: String,
}

/// Terminal (or in-flight) outcome of one execution, as reported by the
/// remote service. `time` is a decimal string of seconds, `memory` is in KB;
/// both are null while the execution is still queued.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExecutionResult {
    pub token: Token,
    pub status: StatusInfo,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub memory: Option<f64>,
}

impl ExecutionResult {
    /// Whether the remote service will not change this result any further.
    pub fn is_terminal(&self) -> bool {
        self.status.id != STATUS_IN_QUEUE && self.status.id != STATUS_PROCESSING
    }

    /// Elapsed wall time in seconds, zero while unreported.
    pub fn time_secs(&self) -> f64 {
        self.time
            .as_deref()
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    pub fn memory_kb(&self) -> f64 {
        self.memory.unwrap_or(0.0)
    }
}
