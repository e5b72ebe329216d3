//! Stage definitions

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::job::Job;
use crate::engine::result::JobResult;

/// How the jobs of a stage are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageMode {
    /// One job at a time in declaration order
    #[default]
    Sequential,
    /// All jobs started together, stage completes when every job finished
    Parallel,
}

/// A named group of jobs sharing one concurrency mode
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    mode: StageMode,
    pub(crate) jobs: Vec<Job>,
    pub(crate) results: Vec<JobResult>,
}

impl Stage {
    pub fn new(name: impl Into<String>, mode: StageMode) -> Self {
        Self {
            name: name.into(),
            mode,
            jobs: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn sequential(name: impl Into<String>) -> Self {
        Self::new(name, StageMode::Sequential)
    }

    pub fn parallel(name: impl Into<String>) -> Self {
        Self::new(name, StageMode::Parallel)
    }

    /// Append a job; names must be unique within the stage
    pub fn add_job(&mut self, job: Job) -> Result<(), PipelineError> {
        if self.jobs.iter().any(|j| j.name() == job.name()) {
            return Err(PipelineError::DuplicateJob {
                stage: self.name.clone(),
                job: job.name().to_string(),
            });
        }
        self.jobs.push(job);
        Ok(())
    }

    pub fn with_job(mut self, job: Job) -> Result<Self, PipelineError> {
        self.add_job(job)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> StageMode {
        self.mode
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name() == name)
    }

    /// Results in the order jobs completed
    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.jobs.iter().all(Job::has_run)
    }

    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
