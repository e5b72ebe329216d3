#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use regression_runner::{Notifier, NotifyError};
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_suite(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write suite file");
}

pub fn write_runner_config(dir: &Path, content: &str) {
    fs::write(dir.join("runner.yaml"), content).expect("Failed to write runner.yaml");
}

/// Two cases of shell actions that all succeed
pub fn passing_suite(name: &str) -> String {
    format!(
        r#"
name: {}
cases:
  - name: Test Case 1
    actions:
      - name: greet
        script_path: "echo hello"
        script_kind: shell
      - name: where
        script_path: "pwd"
        script_kind: shell
  - name: Test Case 2
    actions:
      - name: echo_arg
        script_path: "echo"
        script_kind: shell
        args: [Hello]
"#,
        name
    )
}

/// One case whose second action exits non-zero
pub fn failing_suite(name: &str) -> String {
    format!(
        r#"
name: {}
cases:
  - name: broken
    actions:
      - name: echo_ok
        script_path: "echo ok"
        script_kind: shell
      - name: fail_cmd
        script_path: "exit 3"
        script_kind: shell
"#,
        name
    )
}

/// Notifier that keeps every subject it is handed
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
