//! Optional build step run before any trial.

use std::path::Path;

use matbench_config::BuildConfig;
use tracing::info;

use crate::error::{BenchError, Result};
use crate::process::{absolute, run_bounded, Invocation, ProcessOutcome};

/// Runs the configured build command to completion.
///
/// The build inherits the harness's output so compiler messages stay
/// visible. Any failure aborts the benchmark.
pub fn run_build(build: &BuildConfig) -> Result<()> {
    let Some((program, args)) = build.command.split_first() else {
        return Err(BenchError::BuildFailure("empty build command".to_string()));
    };
    let working_dir = build.working_dir.as_deref().unwrap_or(Path::new("."));
    let working_dir = absolute(working_dir).map_err(|e| BenchError::io(working_dir, e))?;

    let invocation = Invocation::new(program, &working_dir)
        .with_args(args)
        .with_inherit_output(true);
    info!(event = "build_start", command = %invocation.command_line());

    match run_bounded(&invocation) {
        ProcessOutcome::Exited { status, elapsed } if status.success() => {
            info!(event = "build_end", duration_ms = elapsed.as_millis() as u64);
            Ok(())
        }
        ProcessOutcome::Exited { status, .. } => Err(BenchError::BuildFailure(format!(
            "'{}' exited with {}",
            invocation.command_line(),
            status
        ))),
        ProcessOutcome::TimedOut { .. } => Err(BenchError::BuildFailure(format!(
            "'{}' timed out",
            invocation.command_line()
        ))),
        ProcessOutcome::SpawnFailed(e) => Err(BenchError::BuildFailure(format!(
            "could not start '{}': {}",
            invocation.command_line(),
            e
        ))),
    }
}
