//! Pipeline graph
//!
//! Holds the stages in declaration order plus the stage dependency map, and
//! resolves the order stages run in. Resolution repeatedly scans the stages
//! in declaration order and picks every stage whose prerequisites have all
//! run; a stage picked earlier in a pass satisfies stages later in the same
//! pass. A pass that picks nothing while stages remain means a cycle or a
//! prerequisite that was never registered.

use std::collections::{HashMap, HashSet};

use super::error::{PipelineError, StuckStage, UnsatisfiableDependencyError};
use super::stage::Stage;

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub(crate) stages: Vec<Stage>,
    dependencies: HashMap<String, Vec<String>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage with the names of stages that must finish first.
    ///
    /// Prerequisites may name stages registered later.
    pub fn add_stage<I, S>(&mut self, stage: Stage, dependencies: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.stage(stage.name()).is_some() {
            return Err(PipelineError::DuplicateStage(stage.name().to_string()));
        }

        let mut deps: Vec<String> = Vec::new();
        for dep in dependencies {
            let dep = dep.into();
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        self.dependencies.insert(stage.name().to_string(), deps);
        self.stages.push(stage);
        Ok(())
    }

    /// Register a stage that is immediately runnable
    pub fn add_independent_stage(&mut self, stage: Stage) -> Result<(), PipelineError> {
        self.add_stage(stage, std::iter::empty::<String>())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn job_count(&self) -> usize {
        self.stages.iter().map(|s| s.jobs().len()).sum()
    }

    /// Stage names grouped by the scheduling pass that picks them
    pub fn execution_order(&self) -> Result<Vec<Vec<String>>, UnsatisfiableDependencyError> {
        Ok(self
            .schedule()?
            .into_iter()
            .map(|pass| {
                pass.into_iter()
                    .map(|idx| self.stages[idx].name().to_string())
                    .collect()
            })
            .collect())
    }

    /// Stage indices grouped by scheduling pass
    pub(crate) fn schedule(&self) -> Result<Vec<Vec<usize>>, UnsatisfiableDependencyError> {
        let mut executed: HashSet<&str> = HashSet::new();
        let mut passes: Vec<Vec<usize>> = Vec::new();

        while executed.len() < self.stages.len() {
            let mut pass = Vec::new();

            for (idx, stage) in self.stages.iter().enumerate() {
                if executed.contains(stage.name()) {
                    continue;
                }

                let ready = self
                    .dependencies_of(stage.name())
                    .iter()
                    .all(|dep| executed.contains(dep.as_str()));

                if ready {
                    executed.insert(stage.name());
                    pass.push(idx);
                }
            }

            if pass.is_empty() {
                let stuck = self
                    .stages
                    .iter()
                    .filter(|s| !executed.contains(s.name()))
                    .map(|s| StuckStage {
                        stage: s.name().to_string(),
                        unmet: self
                            .dependencies_of(s.name())
                            .iter()
                            .filter(|dep| !executed.contains(dep.as_str()))
                            .cloned()
                            .collect(),
                    })
                    .collect();
                return Err(UnsatisfiableDependencyError { stuck });
            }

            passes.push(pass);
        }

        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Job;

    fn stage(name: &str) -> Stage {
        Stage::sequential(name)
            .with_job(Job::shell(format!("{}-job", name), "true"))
            .unwrap()
    }

    #[test]
    fn test_independent_stages_single_pass() {
        let mut pipeline = Pipeline::new();
        pipeline.add_independent_stage(stage("a")).unwrap();
        pipeline.add_independent_stage(stage("b")).unwrap();
        pipeline.add_independent_stage(stage("c")).unwrap();

        let order = pipeline.execution_order().unwrap();
        assert_eq!(order, vec![vec!["a", "b", "c"]]);
        assert_eq!(pipeline.job_count(), 3);
    }

    #[test]
    fn test_declaration_order_chain_in_one_pass() {
        let mut pipeline = Pipeline::new();
        pipeline.add_independent_stage(stage("setup")).unwrap();
        pipeline.add_stage(stage("tests"), ["setup"]).unwrap();
        pipeline.add_stage(stage("cleanup"), ["tests"]).unwrap();

        let order = pipeline.execution_order().unwrap();
        assert_eq!(order, vec![vec!["setup", "tests", "cleanup"]]);
    }

    #[test]
    fn test_forward_reference_needs_second_pass() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(stage("report"), ["tests"]).unwrap();
        pipeline.add_stage(stage("tests"), ["setup"]).unwrap();
        pipeline.add_independent_stage(stage("setup")).unwrap();

        let order = pipeline.execution_order().unwrap();
        assert_eq!(order, vec![vec!["setup"], vec!["tests"], vec!["report"]]);
    }

    #[test]
    fn test_diamond() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(stage("bottom"), ["left", "right"]).unwrap();
        pipeline.add_stage(stage("left"), ["top"]).unwrap();
        pipeline.add_stage(stage("right"), ["top"]).unwrap();
        pipeline.add_independent_stage(stage("top")).unwrap();

        let order = pipeline.execution_order().unwrap();
        assert_eq!(order, vec![vec!["top"], vec!["left", "right"], vec!["bottom"]]);
    }

    #[test]
    fn test_cycle_is_unsatisfiable() {
        let mut pipeline = Pipeline::new();
        pipeline.add_independent_stage(stage("ok")).unwrap();
        pipeline.add_stage(stage("a"), ["b"]).unwrap();
        pipeline.add_stage(stage("b"), ["a"]).unwrap();

        let err = pipeline.execution_order().unwrap_err();
        assert_eq!(
            err.stuck,
            vec![
                StuckStage {
                    stage: "a".to_string(),
                    unmet: vec!["b".to_string()],
                },
                StuckStage {
                    stage: "b".to_string(),
                    unmet: vec!["a".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_missing_dependency_is_unsatisfiable() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(stage("tests"), ["setup"]).unwrap();

        let err = pipeline.execution_order().unwrap_err();
        assert_eq!(err.stage_names(), vec!["tests"]);
        assert_eq!(err.stuck[0].unmet, vec!["setup"]);
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.add_independent_stage(stage("same")).unwrap();

        let err = pipeline.add_independent_stage(stage("same")).unwrap_err();
        assert_eq!(err, PipelineError::DuplicateStage("same".to_string()));
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_dependencies_deduplicated() {
        let mut pipeline = Pipeline::new();
        pipeline.add_independent_stage(stage("a")).unwrap();
        pipeline.add_stage(stage("b"), ["a", "a"]).unwrap();

        assert_eq!(pipeline.dependencies_of("b"), &["a".to_string()]);
        assert!(pipeline.dependencies_of("a").is_empty());
        assert!(pipeline.dependencies_of("unknown").is_empty());
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert!(pipeline.execution_order().unwrap().is_empty());
    }
}
