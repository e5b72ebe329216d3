//! Test suite definitions
//!
//! This module contains the declarative input side:
//! - `model` - TestSuite, TestCase, TestAction and ScriptKind
//! - `compiler` - Translation of a suite into a Pipeline
//! - `loader` - Load suites from YAML or JSON files
//! - `runner_config` - Run settings loaded from runner.yaml

pub mod compiler;
pub mod loader;
pub mod model;
pub mod runner_config;

pub use compiler::CaseOrdering;
pub use loader::{LoadError, SuiteLoader};
pub use model::{ScriptKind, TestAction, TestCase, TestSuite};
pub use runner_config::{NotificationConfig, RunnerConfig};
