//! Pipeline Executor - Runs a pipeline and collects results
//!
//! This is the main engine that:
//! 1. Resolves the stage order from the dependency map
//! 2. Runs each stage's jobs sequentially or in parallel
//! 3. Attaches results to jobs, stages and the run-wide result list
//! 4. Sends a notification for every failed job
//! 5. Produces the flat report handed to callers
//!
//! The stage order is resolved before anything is spawned, so a pipeline
//! with unsatisfiable dependencies fails without running a single job.
//! Job failures never abort the run: every job of every stage always runs
//! and always produces a result.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::engine::notify::{failure_body, failure_subject, LogNotifier, Notifier};
use crate::engine::process::{run_job, OutputLine};
use crate::engine::result::{FailureKind, JobResult, PipelineReport, ResultSummary};
use crate::pipeline::{Pipeline, PipelineError, StageMode};

/// Tunables applied to every job of a run
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Timeout for jobs that do not set their own
    pub default_timeout: Option<Duration>,

    /// Upper bound on concurrently running jobs in a parallel stage
    pub max_parallel: Option<usize>,
}

pub struct PipelineExecutor {
    pipeline: Pipeline,
    notifier: Arc<dyn Notifier>,
    options: ExecutorOptions,
    observer: Option<UnboundedSender<OutputLine>>,
    results: Vec<JobResult>,
    run_id: String,
}

impl PipelineExecutor {
    /// Executor that reports failures to the log
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            notifier: Arc::new(LogNotifier),
            options: ExecutorOptions::default(),
            observer: None,
            results: Vec::new(),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Stream of output lines from every job, delivered as they are read
    pub fn subscribe_output(&mut self) -> UnboundedReceiver<OutputLine> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }

    /// Run every stage in dependency order.
    ///
    /// Results from an earlier call are discarded.
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub async fn execute(&mut self) -> Result<PipelineReport, PipelineError> {
        let passes = match self.pipeline.schedule() {
            Ok(passes) => passes,
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        };

        self.reset();
        info!(
            "Starting pipeline run {} ({} stages, {} jobs)",
            self.run_id,
            self.pipeline.len(),
            self.pipeline.job_count()
        );

        for (pass_no, pass) in passes.into_iter().enumerate() {
            debug!(pass = pass_no + 1, stages = pass.len(), "Scheduling pass");
            for stage_idx in pass {
                self.execute_stage(stage_idx).await;
            }
        }

        let report = self.report();
        if report.success {
            info!("Pipeline run {} passed ({} jobs)", self.run_id, report.total);
        } else {
            warn!(
                "Pipeline run {} finished with {} of {} jobs failing",
                self.run_id, report.failed, report.total
            );
        }
        Ok(report)
    }

    fn reset(&mut self) {
        self.results.clear();
        for stage in &mut self.pipeline.stages {
            stage.results.clear();
            for job in &mut stage.jobs {
                job.clear_result();
            }
        }
    }

    async fn execute_stage(&mut self, stage_idx: usize) {
        let stage = &self.pipeline.stages[stage_idx];
        info!(
            "Executing stage: {} ({:?}, {} jobs)",
            stage.name(),
            stage.mode(),
            stage.jobs().len()
        );

        match stage.mode() {
            StageMode::Sequential => self.run_sequential(stage_idx).await,
            StageMode::Parallel => self.run_parallel(stage_idx).await,
        }
    }

    async fn run_sequential(&mut self, stage_idx: usize) {
        for job_idx in 0..self.pipeline.stages[stage_idx].jobs.len() {
            let result = {
                let job = &self.pipeline.stages[stage_idx].jobs[job_idx];
                let timeout = job.timeout.or(self.options.default_timeout);
                run_job(job, timeout, self.observer.clone()).await
            };

            if !result.success {
                notify_failure(self.notifier.as_ref(), &result).await;
            }
            self.record(stage_idx, job_idx, result);
        }
    }

    async fn run_parallel(&mut self, stage_idx: usize) {
        let semaphore = self
            .options
            .max_parallel
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, JobResult)>();

        let jobs = &self.pipeline.stages[stage_idx].jobs;
        let handles: Vec<_> = jobs
            .iter()
            .enumerate()
            .map(|(job_idx, job)| {
                let job = job.clone();
                let timeout = job.timeout.or(self.options.default_timeout);
                let observer = self.observer.clone();
                let notifier = Arc::clone(&self.notifier);
                let semaphore = semaphore.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    let result = run_job(&job, timeout, observer).await;
                    if !result.success {
                        notify_failure(notifier.as_ref(), &result).await;
                    }
                    // Send order is completion order
                    let _ = tx.send((job_idx, result));
                })
            })
            .collect();
        drop(tx);

        let joined = join_all(handles).await;

        let mut completed = Vec::with_capacity(joined.len());
        while let Ok(entry) = rx.try_recv() {
            completed.push(entry);
        }

        for (job_idx, outcome) in joined.into_iter().enumerate() {
            if let Err(e) = outcome {
                let job = &self.pipeline.stages[stage_idx].jobs[job_idx];
                error!("Worker for job '{}' did not finish: {}", job.name(), e);
                let result = JobResult {
                    job_name: job.name().to_string(),
                    command: job.command_line().to_string(),
                    stdout: String::new(),
                    stderr: format!("Worker task failed: {}", e),
                    success: false,
                    exit_code: None,
                    failure: Some(FailureKind::Spawn(e.to_string())),
                    started_at: chrono::Local::now(),
                    duration: Duration::ZERO,
                };
                notify_failure(self.notifier.as_ref(), &result).await;
                completed.push((job_idx, result));
            }
        }

        for (job_idx, result) in completed {
            self.record(stage_idx, job_idx, result);
        }
    }

    fn record(&mut self, stage_idx: usize, job_idx: usize, result: JobResult) {
        let stage = &mut self.pipeline.stages[stage_idx];
        stage.jobs[job_idx].attach_result(result.clone());
        stage.results.push(result.clone());
        self.results.push(result);
    }

    /// All results of the run, in the order they were recorded
    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn result_for(&self, job_name: &str) -> Option<&JobResult> {
        self.results.iter().find(|r| r.job_name == job_name)
    }

    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failed(&self) -> Vec<&JobResult> {
        self.results.iter().filter(|r| !r.success).collect()
    }

    /// Flat per-job summaries for a presentation layer
    pub fn summaries(&self) -> Vec<ResultSummary> {
        self.results.iter().map(JobResult::summary).collect()
    }

    pub fn report(&self) -> PipelineReport {
        PipelineReport::from_results(&self.run_id, &self.results)
    }
}

async fn notify_failure(notifier: &dyn Notifier, result: &JobResult) {
    let subject = failure_subject(result);
    let body = failure_body(result);
    match notifier.send(&subject, &body).await {
        Ok(()) => info!("Failure notification sent for job '{}'", result.job_name),
        Err(e) => error!(
            "Failed to send notification for job '{}': {}",
            result.job_name, e
        ),
    }
}
