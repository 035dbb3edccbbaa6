//! Spawning and timing external executables under a deadline.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

const MIN_POLL: Duration = Duration::from_micros(50);
const MAX_POLL: Duration = Duration::from_millis(10);

/// One invocation of an executable.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub inherit_output: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: None,
            inherit_output: false,
        }
    }

    pub fn with_args(mut self, args: &[String]) -> Self {
        self.args = args.to_vec();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How a bounded run ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited on its own.
    Exited { status: ExitStatus, elapsed: Duration },
    /// The deadline passed and the process was killed.
    TimedOut { elapsed: Duration },
    /// The process could not be started or waited on.
    SpawnFailed(io::Error),
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited { status, .. } if status.success())
    }
}

/// Resolves the program for a working directory.
///
/// Relative paths with a directory part (`./omp`, `bin/mpi`) are taken
/// relative to `working_dir`, since the child runs there. Bare names are
/// left for `PATH` lookup.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use matbench_benchmark::process::resolve_program;
///
/// let wd = Path::new("/work");
/// assert_eq!(resolve_program(Path::new("./omp"), wd), Path::new("/work/./omp"));
/// assert_eq!(resolve_program(Path::new("/usr/bin/env"), wd), Path::new("/usr/bin/env"));
/// assert_eq!(resolve_program(Path::new("mpirun"), wd), Path::new("mpirun"));
/// ```
pub fn resolve_program(program: &Path, working_dir: &Path) -> PathBuf {
    if program.is_relative() && program.components().count() > 1 {
        working_dir.join(program)
    } else {
        program.to_path_buf()
    }
}

/// Makes `path` absolute against the current directory.
pub(crate) fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Runs an invocation to completion or until its timeout, measuring wall
/// time from spawn to exit.
///
/// The child runs in `working_dir`; the harness's own directory is never
/// changed. On timeout the child is killed and reaped before returning.
pub fn run_bounded(invocation: &Invocation) -> ProcessOutcome {
    let program = resolve_program(&invocation.program, &invocation.working_dir);
    let mut command = Command::new(&program);
    command
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null());
    if !invocation.inherit_output {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }

    debug!(
        event = "spawn",
        command = %invocation.command_line(),
        working_dir = %invocation.working_dir.display(),
    );

    let start = Instant::now();
    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ProcessOutcome::SpawnFailed(e),
    };
    wait_with_deadline(child, start, invocation.timeout)
}

fn wait_with_deadline(
    mut child: Child,
    start: Instant,
    timeout: Option<Duration>,
) -> ProcessOutcome {
    // A timeout too large to represent as an instant never expires.
    let Some(deadline) = timeout.and_then(|t| start.checked_add(t)) else {
        return match child.wait() {
            Ok(status) => ProcessOutcome::Exited {
                status,
                elapsed: start.elapsed(),
            },
            Err(e) => ProcessOutcome::SpawnFailed(e),
        };
    };

    let mut poll = MIN_POLL;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return ProcessOutcome::Exited {
                    status,
                    elapsed: start.elapsed(),
                }
            }
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    kill_and_reap(&mut child);
                    return ProcessOutcome::TimedOut {
                        elapsed: start.elapsed(),
                    };
                }
                thread::sleep(poll.min(deadline - now));
                poll = (poll * 2).min(MAX_POLL);
            }
            Err(e) => {
                kill_and_reap(&mut child);
                return ProcessOutcome::SpawnFailed(e);
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(event = "kill_failed", pid = child.id(), error = %e);
    }
    let _ = child.wait();
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
