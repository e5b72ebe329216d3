//! Pipeline execution engine module
//!
//! This module contains:
//! - `executor` - The pipeline executor
//! - `process` - Child process spawning with streamed output
//! - `notify` - Failure notification channels
//! - `result` - Job result, summary and report types

pub mod executor;
pub mod notify;
pub mod process;
pub mod result;

pub use executor::{ExecutorOptions, PipelineExecutor};
pub use notify::{LogNotifier, NoopNotifier, Notifier, NotifyError, WebhookNotifier};
pub use process::{run_job, OutputLine, OutputStream};
pub use result::{FailureKind, JobResult, PipelineReport, ResultSummary};
