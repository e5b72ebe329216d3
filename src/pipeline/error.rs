//! Pipeline construction and scheduling errors

/// A stage that could never become eligible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckStage {
    pub stage: String,
    /// Prerequisites that never completed (cyclic or never registered)
    pub unmet: Vec<String>,
}

/// Raised when a scheduling pass makes no progress while stages remain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsatisfiable stage dependencies: {}", describe(.stuck))]
pub struct UnsatisfiableDependencyError {
    pub stuck: Vec<StuckStage>,
}

impl UnsatisfiableDependencyError {
    pub fn stage_names(&self) -> Vec<&str> {
        self.stuck.iter().map(|s| s.stage.as_str()).collect()
    }
}

fn describe(stuck: &[StuckStage]) -> String {
    stuck
        .iter()
        .map(|s| format!("'{}' waits on [{}]", s.stage, s.unmet.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("Duplicate job name '{job}' in stage '{stage}'")]
    DuplicateJob { stage: String, job: String },

    #[error(transparent)]
    UnsatisfiableDependency(#[from] UnsatisfiableDependencyError),
}
