mod common;

use common::*;
use regression_runner::prelude::*;
use regression_runner::{LoadError, NotificationConfig};
use std::sync::Arc;

#[test]
fn test_compile_two_cases() {
    let suite = TestSuite::new(
        "Sample Test Suite",
        vec![
            TestCase::new(
                "Test Case 1",
                vec![
                    TestAction::new("List Directory", "list_dir.sh", ScriptKind::Bash),
                    TestAction::new("Print Working Directory", "print_pwd.py", ScriptKind::Python),
                ],
            ),
            TestCase::new(
                "Test Case 2",
                vec![TestAction::new("Echo Hello", "echo_hello.sh", ScriptKind::Bash)
                    .with_args(["Hello"])],
            ),
        ],
    );

    let pipeline = suite.to_pipeline(CaseOrdering::Independent).unwrap();

    assert_eq!(pipeline.len(), 2);
    assert_eq!(pipeline.job_count(), 3);
    assert_eq!(pipeline.stages()[0].jobs().len(), 2);
    assert_eq!(pipeline.stages()[1].jobs().len(), 1);
    for stage in pipeline.stages() {
        assert_eq!(stage.mode(), StageMode::Sequential);
        assert!(pipeline.dependencies_of(stage.name()).is_empty());
    }
}

#[test]
fn test_load_suite_from_directory_file() {
    let dir = create_test_dir();
    write_suite(dir.path(), "suite.yaml", &passing_suite("smoke"));

    let suite = SuiteLoader::load_file(&dir.path().join("suite.yaml")).unwrap();
    assert_eq!(suite.name, "smoke");
    assert_eq!(suite.cases.len(), 2);
    assert_eq!(suite.action_count(), 3);
}

#[test]
fn test_load_invalid_yaml() {
    let dir = create_test_dir();
    write_suite(dir.path(), "bad.yaml", "name: [unterminated");

    let err = SuiteLoader::load_file(&dir.path().join("bad.yaml")).unwrap_err();
    assert!(matches!(err, LoadError::Yaml { .. }));
    assert!(err.to_string().contains("bad.yaml"));
}

#[test]
fn test_runner_config_from_directory() {
    let dir = create_test_dir();
    write_runner_config(
        dir.path(),
        r#"
job_timeout: 5000
max_parallel: 2
ordering: chained
notification:
  type: none
"#,
    );

    let config = RunnerConfig::load(dir.path().join("runner.yaml")).unwrap();
    assert_eq!(config.ordering, CaseOrdering::Chained);
    assert_eq!(config.notification, NotificationConfig::None);
    assert_eq!(config.executor_options().max_parallel, Some(2));
}

#[tokio::test]
async fn test_run_loaded_suite() {
    let dir = create_test_dir();
    write_suite(dir.path(), "suite.yaml", &passing_suite("smoke"));

    let mut suite = SuiteLoader::load_file(&dir.path().join("suite.yaml")).unwrap();
    suite.working_dir = Some(dir.path().to_path_buf());

    let pipeline = suite.to_pipeline(CaseOrdering::Chained).unwrap();
    assert_eq!(
        pipeline.execution_order().unwrap(),
        vec![vec!["Test Case 1", "Test Case 2"]]
    );

    let mut executor = PipelineExecutor::new(pipeline);
    let report = executor.execute().await.unwrap();

    assert!(report.success);
    assert_eq!(report.total, 3);
    assert_eq!(report.results[0].stdout, "hello\n");
    assert_eq!(report.results[2].command, "echo Hello");
    assert_eq!(report.results[2].stdout, "Hello\n");
}

#[tokio::test]
async fn test_failing_suite_notifies_once() {
    let suite = SuiteLoader::from_yaml_str(&failing_suite("broken")).unwrap();
    let pipeline = suite.to_pipeline(CaseOrdering::Independent).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut executor = PipelineExecutor::new(pipeline).with_notifier(notifier.clone());
    let report = executor.execute().await.unwrap();

    assert!(!report.success);
    assert_eq!(report.failed, 1);
    assert_eq!(
        notifier.subjects(),
        vec!["Job Failure Notification: fail_cmd".to_string()]
    );
}
