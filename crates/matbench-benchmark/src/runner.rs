//! Trial runners.
//!
//! [`TrialRunner`] drives a per-trial executable: for each trial it writes
//! fresh operands, runs the executable once, and verifies what it wrote.
//! [`BatchRunner`] drives an executable that loops over every size itself
//! and reports its own timings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use matbench_config::{BenchConfig, ImplementationConfig};
use matbench_core::codec::{load_role, save_role};
use matbench_core::{
    first_mismatch, generate_operands, matrices_equal, reference_product, CompareMode,
    FileConvention, FileRole, Matrix, ValueRange,
};
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::error::{BenchError, Result};
use crate::process::{absolute, run_bounded, Invocation, ProcessOutcome};
use crate::result::{TrialLogBuilder, TrialOutcome, TrialRecord};
use crate::timing::{group_by_size, load_timings};

/// Settings shared by every trial of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSettings {
    pub trial_count: usize,
    pub warmup_count: usize,
    pub value_range: ValueRange,
    pub compare_mode: CompareMode,
    pub timeout: Duration,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            trial_count: matbench_config::DEFAULT_TRIAL_COUNT,
            warmup_count: 0,
            value_range: ValueRange::default(),
            compare_mode: CompareMode::default(),
            timeout: Duration::from_secs(matbench_config::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TrialSettings {
    /// Extracts the trial settings from a configuration.
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        Ok(Self {
            trial_count: config.trial_count,
            warmup_count: config.warmup_count,
            value_range: config.value_range()?,
            compare_mode: config.compare_mode(),
            timeout: config.timeout(),
        })
    }

    pub fn with_trial_count(mut self, count: usize) -> Self {
        self.trial_count = count;
        self
    }

    pub fn with_warmup_count(mut self, count: usize) -> Self {
        self.warmup_count = count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_compare_mode(mut self, mode: CompareMode) -> Self {
        self.compare_mode = mode;
        self
    }
}

/// Paths of the three exchange files for one multiplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePaths {
    pub matrix_a: PathBuf,
    pub matrix_b: PathBuf,
    pub result: PathBuf,
}

impl ExchangePaths {
    /// `matrixA.txt`, `matrixB.txt` and `resultMatrix.txt` in `dir`.
    pub fn per_trial(dir: &Path) -> Self {
        Self {
            matrix_a: dir.join(format!("{}.txt", FileRole::MatrixA.stem())),
            matrix_b: dir.join(format!("{}.txt", FileRole::MatrixB.stem())),
            result: dir.join(format!("{}.txt", FileRole::Result.stem())),
        }
    }

    /// `matrixA_<size>.txt` and friends in `dir`.
    pub fn per_size(dir: &Path, size: usize) -> Self {
        Self {
            matrix_a: dir.join(format!("{}_{}.txt", FileRole::MatrixA.stem(), size)),
            matrix_b: dir.join(format!("{}_{}.txt", FileRole::MatrixB.stem(), size)),
            result: dir.join(format!("{}_{}.txt", FileRole::Result.stem(), size)),
        }
    }

    fn write_operands(&self, a: &Matrix, b: &Matrix, convention: &FileConvention) -> Result<()> {
        save_role(a, &self.matrix_a, FileRole::MatrixA, convention)?;
        save_role(b, &self.matrix_b, FileRole::MatrixB, convention)?;
        Ok(())
    }

    fn clear_result(&self) -> Result<()> {
        remove_stale(&self.result)
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BenchError::io(path, e)),
    }
}

/// Verdict on a result file.
enum Verdict {
    Correct,
    Wrong(String),
    Missing,
}

fn verify_result(
    path: &Path,
    expected: &Matrix,
    convention: &FileConvention,
    mode: CompareMode,
) -> Verdict {
    let actual = match load_role(path, FileRole::Result, convention) {
        Ok(matrix) => matrix,
        Err(e) if e.is_not_found() => return Verdict::Missing,
        Err(e) => return Verdict::Wrong(e.to_string()),
    };
    if matrices_equal(&actual, expected, mode) {
        return Verdict::Correct;
    }
    let detail = match first_mismatch(&actual, expected, mode) {
        Some(m) => format!(
            "first mismatch at ({}, {}): got {}, expected {}",
            m.row, m.col, m.actual, m.expected
        ),
        None => format!(
            "result is {}x{}, expected {}x{}",
            actual.rows(),
            actual.cols(),
            expected.rows(),
            expected.cols()
        ),
    };
    Verdict::Wrong(detail)
}

fn product(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    Ok(reference_product(a, b)?)
}

/// Runs per-trial executables.
///
/// # Examples
///
/// ```no_run
/// use matbench_benchmark::{TrialLogBuilder, TrialRunner, TrialSettings};
/// use matbench_config::ImplementationConfig;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let implementation =
///     ImplementationConfig::new("single", "./single").with_working_dir("build");
/// let runner = TrialRunner::new(&implementation, TrialSettings::default()).unwrap();
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let mut log = TrialLogBuilder::new();
/// runner.run_sweep(&[2, 4, 8], &mut rng, &mut log).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TrialRunner {
    id: String,
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    convention: FileConvention,
    inherit_output: bool,
    settings: TrialSettings,
}

impl TrialRunner {
    /// Creates a runner, creating the working directory if needed.
    pub fn new(implementation: &ImplementationConfig, settings: TrialSettings) -> Result<Self> {
        let working_dir = implementation.working_dir();
        fs::create_dir_all(&working_dir).map_err(|e| BenchError::io(&working_dir, e))?;
        let working_dir = absolute(&working_dir).map_err(|e| BenchError::io(&working_dir, e))?;

        Ok(Self {
            id: implementation.id.clone(),
            program: implementation.program.clone(),
            args: implementation.args.clone(),
            working_dir,
            convention: implementation.convention(),
            inherit_output: implementation.inherit_output,
            settings,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn settings(&self) -> &TrialSettings {
        &self.settings
    }

    /// Exchange files in the working directory.
    pub fn paths(&self) -> ExchangePaths {
        ExchangePaths::per_trial(&self.working_dir)
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.program, &self.working_dir)
            .with_args(&self.args)
            .with_timeout(self.settings.timeout)
            .with_inherit_output(self.inherit_output)
    }

    /// Runs one trial: generate, invoke, time, verify.
    ///
    /// Executable misbehavior becomes a failed record. Only harness faults,
    /// such as an unwritable working directory, are returned as errors.
    pub fn run_trial<R: Rng + ?Sized>(
        &self,
        size: usize,
        trial_index: usize,
        rng: &mut R,
    ) -> Result<TrialRecord> {
        trace!(
            event = "trial_start",
            implementation = %self.id,
            size,
            trial = trial_index,
        );
        let paths = self.paths();
        let (a, b) = generate_operands(size, size, size, size, self.settings.value_range, rng)?;
        paths.write_operands(&a, &b, &self.convention)?;
        paths.clear_result()?;

        let outcome = run_bounded(&self.invocation());
        let elapsed = match outcome {
            ProcessOutcome::Exited { status, elapsed } if status.success() => elapsed,
            ProcessOutcome::Exited { status, .. } => {
                return Ok(self.failed(
                    size,
                    trial_index,
                    TrialOutcome::ExecutableFailure {
                        code: status.code(),
                    },
                    status.to_string(),
                ));
            }
            ProcessOutcome::TimedOut { elapsed } => {
                return Ok(self.failed(
                    size,
                    trial_index,
                    TrialOutcome::Timeout,
                    format!("killed after {:.3}s", elapsed.as_secs_f64()),
                ));
            }
            ProcessOutcome::SpawnFailed(e) => {
                return Ok(self.failed(
                    size,
                    trial_index,
                    TrialOutcome::ExecutableFailure { code: None },
                    e.to_string(),
                ));
            }
        };

        let expected = product(&a, &b)?;
        let elapsed_seconds = elapsed.as_secs_f64();
        let record = match verify_result(
            &paths.result,
            &expected,
            &self.convention,
            self.settings.compare_mode,
        ) {
            Verdict::Correct => {
                TrialRecord::completed(&self.id, size, trial_index, elapsed_seconds, true)
            }
            Verdict::Wrong(detail) => {
                warn!(
                    event = "trial_failed",
                    implementation = %self.id,
                    size,
                    trial = trial_index,
                    outcome = "incorrect",
                    detail = %detail,
                );
                TrialRecord::completed(&self.id, size, trial_index, elapsed_seconds, false)
            }
            Verdict::Missing => {
                return Ok(self.failed(
                    size,
                    trial_index,
                    TrialOutcome::MissingArtifact,
                    format!("{} not written", paths.result.display()),
                ));
            }
        };

        debug!(
            event = "trial_end",
            implementation = %self.id,
            size,
            trial = trial_index,
            elapsed = elapsed_seconds,
        );
        Ok(record)
    }

    fn failed(
        &self,
        size: usize,
        trial_index: usize,
        outcome: TrialOutcome,
        detail: String,
    ) -> TrialRecord {
        warn!(
            event = "trial_failed",
            implementation = %self.id,
            size,
            trial = trial_index,
            outcome = %outcome,
            detail = %detail,
        );
        TrialRecord::failed(&self.id, size, trial_index, outcome)
    }

    /// Runs the warmups, then the measured trials, for one size.
    pub fn run_size<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<TrialRecord>> {
        for warmup in 0..self.settings.warmup_count {
            let record = self.run_trial(size, warmup, rng)?;
            debug!(
                event = "warmup_end",
                implementation = %self.id,
                size,
                outcome = %record.outcome,
            );
        }

        (0..self.settings.trial_count)
            .map(|trial| self.run_trial(size, trial, rng))
            .collect()
    }

    /// Runs every size in order, appending records to `log`.
    ///
    /// A failing size never stops the sweep.
    pub fn run_sweep<R: Rng + ?Sized>(
        &self,
        sizes: &[usize],
        rng: &mut R,
        log: &mut TrialLogBuilder,
    ) -> Result<()> {
        log.register(&self.id);
        for &size in sizes {
            log.extend(self.run_size(size, rng)?);
        }
        Ok(())
    }
}

/// Runs batch executables.
///
/// The harness writes `matrixA_<n>.txt` and `matrixB_<n>.txt` for every
/// size into the data directory, runs the executable once, then reads the
/// timing-results file and checks `resultMatrix_<n>.txt` for each size.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    id: String,
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    data_dir: PathBuf,
    timing_file: PathBuf,
    convention: FileConvention,
    inherit_output: bool,
    settings: TrialSettings,
}

impl BatchRunner {
    /// Creates a runner, creating the working and data directories.
    pub fn new(implementation: &ImplementationConfig, settings: TrialSettings) -> Result<Self> {
        let working_dir = implementation.working_dir();
        let data_dir = implementation.data_dir();
        for dir in [&working_dir, &data_dir] {
            fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;
        }
        let abs = |p: &Path| absolute(p).map_err(|e| BenchError::io(p, e));

        Ok(Self {
            id: implementation.id.clone(),
            program: implementation.program.clone(),
            args: implementation.args.clone(),
            working_dir: abs(&working_dir)?,
            data_dir: abs(&data_dir)?,
            timing_file: abs(&implementation.timing_file())?,
            convention: implementation.convention(),
            inherit_output: implementation.inherit_output,
            settings,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn timing_file(&self) -> &Path {
        &self.timing_file
    }

    /// Runs the executable once over `sizes`.
    ///
    /// If the process fails, every size gets one failed record. A missing
    /// timing file is returned as [`BenchError::MissingArtifact`] so the
    /// caller can skip the implementation. The configured timeout bounds
    /// the whole run.
    pub fn run<R: Rng + ?Sized>(&self, sizes: &[usize], rng: &mut R) -> Result<Vec<TrialRecord>> {
        let mut expected = Vec::with_capacity(sizes.len());
        for &size in sizes {
            let paths = ExchangePaths::per_size(&self.data_dir, size);
            let (a, b) =
                generate_operands(size, size, size, size, self.settings.value_range, rng)?;
            paths.write_operands(&a, &b, &self.convention)?;
            paths.clear_result()?;
            expected.push((size, paths, product(&a, &b)?));
        }
        remove_stale(&self.timing_file)?;

        let invocation = Invocation::new(&self.program, &self.working_dir)
            .with_args(&self.args)
            .with_timeout(self.settings.timeout)
            .with_inherit_output(self.inherit_output);

        let outcome = match run_bounded(&invocation) {
            ProcessOutcome::Exited { status, .. } if status.success() => None,
            ProcessOutcome::Exited { status, .. } => Some((
                TrialOutcome::ExecutableFailure {
                    code: status.code(),
                },
                status.to_string(),
            )),
            ProcessOutcome::TimedOut { elapsed } => Some((
                TrialOutcome::Timeout,
                format!("killed after {:.3}s", elapsed.as_secs_f64()),
            )),
            ProcessOutcome::SpawnFailed(e) => Some((
                TrialOutcome::ExecutableFailure { code: None },
                e.to_string(),
            )),
        };
        if let Some((outcome, detail)) = outcome {
            warn!(
                event = "trial_failed",
                implementation = %self.id,
                outcome = %outcome,
                detail = %detail,
            );
            return Ok(sizes
                .iter()
                .map(|&size| TrialRecord::failed(&self.id, size, 0, outcome))
                .collect());
        }

        let timings = group_by_size(&load_timings(&self.timing_file)?);
        for size in timings.keys().filter(|size| !sizes.contains(size)) {
            debug!(event = "timing_ignored", implementation = %self.id, size = *size);
        }

        let mut records = Vec::new();
        for (size, paths, product) in &expected {
            let Some(times) = timings.get(size) else {
                warn!(
                    event = "trial_failed",
                    implementation = %self.id,
                    size = *size,
                    outcome = "missing timing",
                    detail = %self.timing_file.display(),
                );
                continue;
            };
            let verdict = verify_result(
                &paths.result,
                product,
                &self.convention,
                self.settings.compare_mode,
            );
            let (correct, outcome) = match verdict {
                Verdict::Correct => (true, TrialOutcome::Passed),
                Verdict::Wrong(detail) => {
                    warn!(
                        event = "trial_failed",
                        implementation = %self.id,
                        size = *size,
                        outcome = "incorrect",
                        detail = %detail,
                    );
                    (false, TrialOutcome::Incorrect)
                }
                Verdict::Missing => {
                    warn!(
                        event = "trial_failed",
                        implementation = %self.id,
                        size = *size,
                        outcome = %TrialOutcome::MissingArtifact,
                        detail = %paths.result.display(),
                    );
                    (false, TrialOutcome::MissingArtifact)
                }
            };

            records.extend(times.iter().enumerate().map(|(trial_index, &secs)| TrialRecord {
                size: *size,
                implementation_id: self.id.clone(),
                trial_index,
                elapsed_seconds: secs,
                correct,
                outcome,
            }));
        }
        info!(
            event = "batch_end",
            implementation = %self.id,
            records = records.len(),
        );
        Ok(records)
    }
}

/// Writes an operand pair and an empty result file into `dir` for a manual
/// run.
///
/// `shape_a` and `shape_b` are `(rows, cols)`; incompatible shapes are
/// coerced the same way the benchmark does.
pub fn write_operand_files<R: Rng + ?Sized>(
    dir: &Path,
    shape_a: (usize, usize),
    shape_b: (usize, usize),
    range: ValueRange,
    convention: &FileConvention,
    rng: &mut R,
) -> Result<ExchangePaths> {
    fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;
    let paths = ExchangePaths::per_trial(dir);
    let (a, b) = generate_operands(shape_a.0, shape_a.1, shape_b.0, shape_b.1, range, rng)?;
    paths.write_operands(&a, &b, convention)?;
    fs::File::create(&paths.result).map_err(|e| BenchError::io(&paths.result, e))?;
    Ok(paths)
}

/// Checks a result file against the reference product of two input files.
pub fn verify_files(
    paths: &ExchangePaths,
    convention: &FileConvention,
    mode: CompareMode,
) -> Result<Option<String>> {
    let a = load_role(&paths.matrix_a, FileRole::MatrixA, convention)?;
    let b = load_role(&paths.matrix_b, FileRole::MatrixB, convention)?;
    let expected = product(&a, &b)?;
    match verify_result(&paths.result, &expected, convention, mode) {
        Verdict::Correct => Ok(None),
        Verdict::Wrong(detail) => Ok(Some(detail)),
        Verdict::Missing => Err(BenchError::MissingArtifact {
            path: paths.result.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
