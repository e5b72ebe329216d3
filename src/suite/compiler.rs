//! TestSuite to Pipeline compiler
//!
//! One sequential stage per test case, one job per action. Interpreted
//! scripts become a direct `interpreter script args...` invocation; `shell`
//! actions become a shell command line with the arguments appended.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::{TestAction, TestSuite};
use crate::pipeline::{Job, JobCommand, Pipeline, PipelineError, Stage};

/// How compiled test cases are ordered relative to each other
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseOrdering {
    /// No dependencies between cases
    #[default]
    Independent,
    /// Each case waits for the case declared before it
    Chained,
}

impl TestAction {
    pub fn command(&self) -> JobCommand {
        match self.script_kind.interpreter() {
            Some(interpreter) => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.script_path.clone());
                args.extend(self.args.iter().cloned());
                JobCommand::Argv {
                    program: interpreter.to_string(),
                    args,
                }
            }
            None => {
                let mut line = self.script_path.clone();
                for arg in &self.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                JobCommand::Shell(line)
            }
        }
    }
}

impl TestSuite {
    /// Compile the suite into a pipeline.
    ///
    /// Fails only on duplicate case names or duplicate action names within a
    /// case.
    pub fn to_pipeline(&self, ordering: CaseOrdering) -> Result<Pipeline, PipelineError> {
        let mut pipeline = Pipeline::new();
        let mut previous: Option<&str> = None;

        for case in &self.cases {
            let mut stage = Stage::sequential(case.name.as_str());
            for action in &case.actions {
                stage.add_job(self.compile_action(action))?;
            }

            let dependencies: Vec<&str> = match (ordering, previous) {
                (CaseOrdering::Chained, Some(prev)) => vec![prev],
                _ => Vec::new(),
            };
            pipeline.add_stage(stage, dependencies)?;
            previous = Some(case.name.as_str());
        }

        Ok(pipeline)
    }

    fn compile_action(&self, action: &TestAction) -> Job {
        let mut job = Job::new(action.name.as_str(), action.command())
            .with_envs(self.env.clone())
            .with_envs(action.env.clone());
        if let Some(dir) = &self.working_dir {
            job = job.with_working_dir(dir);
        }
        if let Some(ms) = action.timeout {
            job = job.with_timeout(Duration::from_millis(ms));
        }
        job
    }
}
