//! Process execution for jobs
//!
//! Spawns a job's command as a child process and reads stdout and stderr
//! line by line while it runs. Every line is logged as it arrives and can be
//! forwarded to an observer, so long-running jobs are visible before they
//! finish.
//!
//! Lines are buffered through a channel rather than inside the reader tasks:
//! a reader that has to be aborted (a background grandchild keeping the pipe
//! open) still leaves everything it read so far in the result. Output that is
//! not valid UTF-8 is decoded lossily; pipes are always drained to EOF.
//!
//! On unix each job runs in its own process group, and a timeout kills the
//! whole group so commands started by `sh -c` die with it.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::result::{FailureKind, JobResult};
use crate::pipeline::Job;

/// How long readers may keep draining pipes after the process is gone
const READER_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of job output, without its trailing newline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub job: String,
    pub stream: OutputStream,
    pub line: String,
}

enum Outcome {
    Exited(ExitStatus),
    TimedOut(Duration),
    WaitFailed(std::io::Error),
}

/// Run a job to completion and capture its result.
///
/// Never fails: spawn errors, timeouts and non-zero exits all become a
/// failed [`JobResult`].
pub async fn run_job(
    job: &Job,
    timeout: Option<Duration>,
    observer: Option<UnboundedSender<OutputLine>>,
) -> JobResult {
    let started_at = Local::now();
    let clock = Instant::now();
    let (program, args) = job.command().program_and_args();

    info!("Executing job: {}", job.name());
    debug!(job = %job.name(), command = %job.command_line(), "Spawning process");

    let mut cmd = Command::new(program);
    cmd.args(&args);
    if job.clear_env {
        cmd.env_clear();
    }
    cmd.envs(&job.env);
    if let Some(dir) = &job.working_dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!("Job '{}' could not be started: {}", job.name(), e);
            return JobResult {
                job_name: job.name().to_string(),
                command: job.command_line().to_string(),
                stdout: String::new(),
                stderr: format!("Failed to start '{}': {}", program, e),
                success: false,
                exit_code: None,
                failure: Some(FailureKind::Spawn(e.to_string())),
                started_at,
                duration: clock.elapsed(),
            };
        }
    };

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(
            job.name(),
            OutputStream::Stdout,
            stdout,
            line_tx.clone(),
            observer.clone(),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(
            job.name(),
            OutputStream::Stderr,
            stderr,
            line_tx.clone(),
            observer,
        ));
    }
    drop(line_tx);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => Outcome::Exited(status),
            Ok(Err(e)) => Outcome::WaitFailed(e),
            Err(_) => {
                warn!("Job '{}' exceeded timeout of {:?}, killing", job.name(), limit);
                kill_job(&mut child, job.name()).await;
                Outcome::TimedOut(limit)
            }
        },
        None => match child.wait().await {
            Ok(status) => Outcome::Exited(status),
            Err(e) => Outcome::WaitFailed(e),
        },
    };

    let deadline = tokio::time::Instant::now() + READER_GRACE;
    for mut handle in readers {
        if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
            debug!(job = %job.name(), "Output pipe still open after exit, abandoning reader");
            handle.abort();
        }
    }

    let mut stdout = String::new();
    let mut stderr = String::new();
    while let Ok(line) = line_rx.try_recv() {
        let buffer = match line.stream {
            OutputStream::Stdout => &mut stdout,
            OutputStream::Stderr => &mut stderr,
        };
        buffer.push_str(&line.line);
        buffer.push('\n');
    }

    let (exit_code, failure) = match outcome {
        Outcome::Exited(status) => match status.code() {
            Some(0) => (Some(0), None),
            Some(code) => (Some(code), Some(FailureKind::ExitCode(code))),
            None => (None, Some(FailureKind::Signal)),
        },
        Outcome::TimedOut(limit) => {
            stderr.push_str(&format!("Process timed out after {:?}\n", limit));
            (None, Some(FailureKind::Timeout(limit)))
        }
        Outcome::WaitFailed(e) => {
            stderr.push_str(&format!("Failed to wait for process: {}\n", e));
            (None, Some(FailureKind::Spawn(e.to_string())))
        }
    };

    let success = failure.is_none();
    match &failure {
        None => info!("Job '{}' completed successfully", job.name()),
        Some(kind) => error!("Job '{}' failed: {}", job.name(), kind),
    }

    JobResult {
        job_name: job.name().to_string(),
        command: job.command_line().to_string(),
        stdout,
        stderr,
        success,
        exit_code,
        failure,
        started_at,
        duration: clock.elapsed(),
    }
}

/// Kill the job's process group (or just the child off unix) and reap it
async fn kill_job(child: &mut Child, job: &str) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // Group id equals the child's pid
        if let Some(pid) = child.id() {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                warn!("Failed to kill process group of job '{}': {}", job, e);
            }
        }
    }

    if let Err(e) = child.kill().await {
        warn!("Failed to kill job '{}': {}", job, e);
    }
}

/// One raw line without its terminator, invalid UTF-8 replaced
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if raw[..end].ends_with(b"\n") {
        end -= 1;
        if raw[..end].ends_with(b"\r") {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn spawn_reader<R>(
    job: &str,
    stream: OutputStream,
    reader: R,
    buffer: UnboundedSender<OutputLine>,
    observer: Option<UnboundedSender<OutputLine>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let job = job.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&raw);
                    match stream {
                        OutputStream::Stdout => info!("  [{}] [STDOUT] {}", job, line),
                        OutputStream::Stderr => warn!("  [{}] [STDERR] {}", job, line),
                    }
                    let line = OutputLine {
                        job: job.clone(),
                        stream,
                        line,
                    };
                    if let Some(observer) = &observer {
                        // A dropped subscriber must not stop capture
                        let _ = observer.send(line.clone());
                    }
                    let _ = buffer.send(line);
                }
                Err(e) => {
                    warn!("Failed reading {:?} of job '{}': {}", stream, job, e);
                    break;
                }
            }
        }
    })
}
