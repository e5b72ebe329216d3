//! # Regression Runner
//!
//! A pipeline engine for running regression test suites made of shell
//! commands and interpreted scripts.
//!
//! ## Features
//!
//! - **Stages** - Named groups of jobs run one after another or concurrently
//! - **Stage dependencies** - Stages wait for the stages they depend on
//! - **Captured output** - Every job records stdout, stderr, exit status and start time
//! - **Failure notifications** - Each failed job is reported through a pluggable notifier
//! - **Declarative suites** - Test suites in YAML or JSON compile into pipelines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regression_runner::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let suite_yaml = r#"
//! name: smoke
//! cases:
//!   - name: basics
//!     actions:
//!       - name: say hello
//!         script_path: "echo hello"
//!         script_kind: shell
//!       - name: check version
//!         script_path: scripts/version.py
//!         args: ["--short"]
//! "#;
//!
//!     let suite = SuiteLoader::from_yaml_str(suite_yaml)?;
//!     let pipeline = suite.to_pipeline(CaseOrdering::Independent)?;
//!
//!     let mut executor = PipelineExecutor::new(pipeline);
//!     let report = executor.execute().await?;
//!
//!     println!("Pipeline completed: success={}", report.success);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod pipeline;
pub mod suite;

// Re-export main types
pub use engine::{
    run_job, ExecutorOptions, FailureKind, JobResult, LogNotifier, NoopNotifier, Notifier,
    NotifyError, OutputLine, OutputStream, PipelineExecutor, PipelineReport, ResultSummary,
    WebhookNotifier,
};
pub use pipeline::{
    Job, JobCommand, Pipeline, PipelineError, Stage, StageMode, StuckStage,
    UnsatisfiableDependencyError,
};
pub use suite::{
    CaseOrdering, LoadError, NotificationConfig, RunnerConfig, ScriptKind, SuiteLoader,
    TestAction, TestCase, TestSuite,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{
        ExecutorOptions, JobResult, Notifier, PipelineExecutor, PipelineReport, ResultSummary,
    };
    pub use crate::pipeline::{Job, Pipeline, PipelineError, Stage, StageMode};
    pub use crate::suite::{
        CaseOrdering, RunnerConfig, ScriptKind, SuiteLoader, TestAction, TestCase, TestSuite,
    };
}
