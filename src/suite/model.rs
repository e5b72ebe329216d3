//! TestSuite, TestCase and TestAction definitions
//!
//! Declarative description of a regression suite. These types only exist as
//! compiler input; see [`crate::suite::compiler`] for the translation into a
//! [`crate::pipeline::Pipeline`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How an action's script is launched
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScriptKind {
    #[default]
    Python,
    Bash,
    Sh,
    /// The script path is itself a shell command line. Unrecognised kind
    /// strings (`executable`, `cmd`, ...) land here too.
    Shell,
    /// Any other interpreter, written `interpreter:<program>`
    Interpreter(String),
}

impl ScriptKind {
    /// Interpreter executable, `None` for literal shell commands
    pub fn interpreter(&self) -> Option<&str> {
        match self {
            ScriptKind::Python => Some("python"),
            ScriptKind::Bash => Some("bash"),
            ScriptKind::Sh => Some("sh"),
            ScriptKind::Shell => None,
            ScriptKind::Interpreter(program) => Some(program.as_str()),
        }
    }
}

const INTERPRETER_PREFIX: &str = "interpreter:";

impl From<String> for ScriptKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "python" => ScriptKind::Python,
            "bash" => ScriptKind::Bash,
            "sh" => ScriptKind::Sh,
            "shell" => ScriptKind::Shell,
            other => match other.strip_prefix(INTERPRETER_PREFIX) {
                Some(program) if !program.is_empty() => {
                    ScriptKind::Interpreter(program.to_string())
                }
                _ => ScriptKind::Shell,
            },
        }
    }
}

impl From<ScriptKind> for String {
    fn from(kind: ScriptKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Shell => f.write_str("shell"),
            ScriptKind::Interpreter(program) => write!(f, "{}{}", INTERPRETER_PREFIX, program),
            other => f.write_str(other.interpreter().unwrap_or_default()),
        }
    }
}

/// A single scripted step of a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAction {
    pub name: String,

    #[serde(alias = "script")]
    pub script_path: String,

    #[serde(default, alias = "script_type", alias = "kind")]
    pub script_kind: ScriptKind,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for this action
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Timeout in milliseconds
    pub timeout: Option<u64>,
}

impl TestAction {
    pub fn new(name: impl Into<String>, script_path: impl Into<String>, kind: ScriptKind) -> Self {
        Self {
            name: name.into(),
            script_path: script_path.into(),
            script_kind: kind,
            args: Vec::new(),
            env: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<TestAction>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, actions: Vec<TestAction>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,

    /// Directory every action runs in (default: the runner's cwd)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Environment variables available to every action
    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, cases: Vec<TestCase>) -> Self {
        Self {
            name: name.into(),
            working_dir: None,
            env: HashMap::new(),
            cases,
        }
    }

    pub fn action_count(&self) -> usize {
        self.cases.iter().map(|c| c.actions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_deserialize() {
        let yaml = r#"
name: Sample Test Suite
env:
  TARGET: staging
cases:
  - name: Test Case 1
    actions:
      - name: List Directory
        script_path: list_dir.sh
        script_kind: bash
      - name: Print Working Directory
        script: print_pwd.py
  - name: Test Case 2
    actions:
      - name: Echo Hello
        script_path: echo_hello.sh
        script_type: bash
        args: [Hello]
        timeout: 5000
"#;

        let suite: TestSuite = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(suite.name, "Sample Test Suite");
        assert_eq!(suite.cases.len(), 2);
        assert_eq!(suite.action_count(), 3);
        assert_eq!(suite.env.get("TARGET"), Some(&"staging".to_string()));

        let first = &suite.cases[0].actions;
        assert_eq!(first[0].script_kind, ScriptKind::Bash);
        assert_eq!(first[1].script_kind, ScriptKind::Python);
        assert_eq!(first[1].script_path, "print_pwd.py");

        let echo = &suite.cases[1].actions[0];
        assert_eq!(echo.args, vec!["Hello"]);
        assert_eq!(echo.timeout, Some(5000));
    }

    #[test]
    fn test_script_kind_strings() {
        assert_eq!(ScriptKind::from("shell".to_string()), ScriptKind::Shell);
        assert_eq!(
            ScriptKind::from("interpreter:node".to_string()),
            ScriptKind::Interpreter("node".to_string())
        );
        assert_eq!(ScriptKind::from("executable".to_string()), ScriptKind::Shell);
        assert_eq!(ScriptKind::from("cmd".to_string()), ScriptKind::Shell);
        assert_eq!(ScriptKind::from("interpreter:".to_string()), ScriptKind::Shell);
        assert_eq!(ScriptKind::Python.interpreter(), Some("python"));
        assert_eq!(ScriptKind::Shell.interpreter(), None);
        assert_eq!(
            ScriptKind::Interpreter("ruby".into()).to_string(),
            "interpreter:ruby"
        );
        assert_eq!(ScriptKind::Interpreter("ruby".into()).interpreter(), Some("ruby"));

        let yaml = serde_yaml::to_string(&ScriptKind::Sh).unwrap();
        assert_eq!(yaml.trim(), "sh");
    }
}
