//! Execution result types

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in result summaries
pub const EXECUTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a job did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Process exited with a non-zero status
    ExitCode(i32),
    /// Process was terminated by a signal
    Signal,
    /// Process exceeded its timeout and was killed
    Timeout(Duration),
    /// Process could not be started
    Spawn(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ExitCode(code) => write!(f, "exited with code {}", code),
            FailureKind::Signal => write!(f, "terminated by signal"),
            FailureKind::Timeout(limit) => write!(f, "timed out after {:?}", limit),
            FailureKind::Spawn(err) => write!(f, "failed to start: {}", err),
        }
    }
}

/// Immutable outcome of one job execution
///
/// Built by the process runner; callers only read it.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub(crate) job_name: String,
    pub(crate) command: String,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) success: bool,
    pub(crate) exit_code: Option<i32>,
    pub(crate) failure: Option<FailureKind>,
    pub(crate) started_at: DateTime<Local>,
    pub(crate) duration: Duration,
}

impl JobResult {
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Display form of the command that ran
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// True iff the process exited with status zero
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn failure(&self) -> Option<&FailureKind> {
        self.failure.as_ref()
    }

    /// Wall clock time the job was started
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.failure, Some(FailureKind::Timeout(_)))
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            job_name: self.job_name.clone(),
            command: self.command.clone(),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            success: if self.success { "Yes" } else { "No" }.to_string(),
            execution_time: self.started_at.format(EXECUTION_TIME_FORMAT).to_string(),
        }
    }
}

/// Flat, presentation-ready view of a job result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub job_name: String,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// "Yes" or "No"
    pub success: String,
    pub execution_time: String,
}

/// Snapshot of a completed pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub success: bool,
    pub total: usize,
    pub failed: usize,
    pub results: Vec<ResultSummary>,
}

impl PipelineReport {
    pub fn from_results(run_id: &str, results: &[JobResult]) -> Self {
        let failed = results.iter().filter(|r| !r.success).count();
        Self {
            run_id: run_id.to_string(),
            success: failed == 0,
            total: results.len(),
            failed,
            results: results.iter().map(JobResult::summary).collect(),
        }
    }
}
