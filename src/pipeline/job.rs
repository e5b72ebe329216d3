//! Job definitions
//!
//! A job is one external process invocation tracked by the pipeline. The
//! command line is fixed when the job is built; the executor only attaches
//! the [`JobResult`] once the process has finished.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::result::JobResult;

/// How a job's process is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCommand {
    /// Command line interpreted by `sh -c`
    Shell(String),

    /// Program launched directly with an argument vector
    Argv { program: String, args: Vec<String> },
}

impl JobCommand {
    pub fn shell(command: impl Into<String>) -> Self {
        JobCommand::Shell(command.into())
    }

    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JobCommand::Argv {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program and arguments handed to the OS
    pub fn program_and_args(&self) -> (&str, Vec<&str>) {
        match self {
            JobCommand::Shell(line) => ("sh", vec!["-c", line.as_str()]),
            JobCommand::Argv { program, args } => {
                (program.as_str(), args.iter().map(String::as_str).collect())
            }
        }
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobCommand::Shell(line) => f.write_str(line),
            JobCommand::Argv { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A unit of work: one named process invocation
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    command: JobCommand,
    command_line: String,

    /// Variables layered over the inherited environment
    pub env: HashMap<String, String>,

    /// Start from an empty environment instead of inheriting the host's
    pub clear_env: bool,

    pub working_dir: Option<PathBuf>,

    /// Overrides the executor's default job timeout
    pub timeout: Option<Duration>,

    result: Option<JobResult>,
}

impl Job {
    pub fn new(name: impl Into<String>, command: JobCommand) -> Self {
        let command_line = command.to_string();
        Self {
            name: name.into(),
            command,
            command_line,
            env: HashMap::new(),
            clear_env: false,
            working_dir: None,
            timeout: None,
            result: None,
        }
    }

    /// Job running a command line through the shell
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(name, JobCommand::shell(command))
    }

    /// Job running an environment setup script, arguments appended to the
    /// command line
    pub fn environment_setup(
        name: impl Into<String>,
        setup_script: impl Into<String>,
        args: &[String],
    ) -> Self {
        let mut command = setup_script.into();
        if !args.is_empty() {
            command.push(' ');
            command.push_str(&args.join(" "));
        }
        Self::shell(name, command)
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_envs(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn with_clear_env(mut self) -> Self {
        self.clear_env = true;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &JobCommand {
        &self.command
    }

    /// Display form of the command, assembled once at construction
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Result of the last run; `None` until the job has executed
    pub fn result(&self) -> Option<&JobResult> {
        self.result.as_ref()
    }

    pub fn has_run(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn attach_result(&mut self, result: JobResult) {
        self.result = Some(result);
    }

    pub(crate) fn clear_result(&mut self) {
        self.result = None;
    }
}
