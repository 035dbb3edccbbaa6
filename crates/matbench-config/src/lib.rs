//! Configuration system for matbench.
//!
//! Load benchmark configuration from TOML or YAML files to describe the
//! implementations under test, the size sweep, and the verification policy
//! without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use matbench_config::{BenchConfig, InvocationMode};
//! use std::time::Duration;
//!
//! let config = BenchConfig::from_toml_str(r#"
//!     trial_count = 5
//!     timeout_secs = 30
//!
//!     [[implementations]]
//!     id = "single"
//!     program = "./parprog_lab1"
//!     working_dir = "cmake-build-release"
//!
//!     [[implementations]]
//!     id = "omp"
//!     program = "./omp"
//!     mode = "batch"
//! "#).unwrap();
//!
//! assert_eq!(config.trial_count, 5);
//! assert_eq!(config.timeout(), Duration::from_secs(30));
//! assert_eq!(config.implementations[1].mode, InvocationMode::Batch);
//! assert_eq!(config.sizes(), vec![2, 4, 8, 16, 32, 64, 128, 256, 512, 1024]);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use matbench_config::BenchConfig;
//!
//! let config = BenchConfig::load("bench.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use matbench_core::{CompareMode, FileConvention, ValueRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default trial count per size.
pub const DEFAULT_TRIAL_COUNT: usize = 10;

/// Default bound on a single executable run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Main benchmark configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchConfig {
    /// Measured trials per (implementation, size).
    #[serde(default = "default_trial_count")]
    pub trial_count: usize,

    /// Unrecorded trials run before measuring each size.
    #[serde(default)]
    pub warmup_count: usize,

    /// Matrix sizes to sweep; defaults to 2, 4, ..., 1024.
    #[serde(default)]
    pub sizes: Option<Vec<usize>>,

    /// Half-open `[low, high)` range of generated entries.
    #[serde(default)]
    pub value_range: Option<[i64; 2]>,

    /// Random seed for reproducible inputs.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Seconds before a running executable is killed.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Two-sided confidence level for interval estimates.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// Result verification policy.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Build step run once before any trial.
    #[serde(default)]
    pub build: Option<BuildConfig>,

    /// Report and plot outputs.
    #[serde(default)]
    pub output: OutputConfig,

    /// Implementations under test, in plotting order.
    #[serde(default)]
    pub implementations: Vec<ImplementationConfig>,
}

fn default_trial_count() -> usize {
    DEFAULT_TRIAL_COUNT
}

fn default_confidence_level() -> f64 {
    0.95
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            warmup_count: 0,
            sizes: None,
            value_range: None,
            random_seed: None,
            timeout_secs: None,
            confidence_level: default_confidence_level(),
            verification: VerificationConfig::default(),
            build: None,
            output: OutputConfig::default(),
            implementations: Vec::new(),
        }
    }
}

impl BenchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a file, choosing the format by extension
    /// (`.yaml`/`.yml` for YAML, anything else TOML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the trial count.
    pub fn with_trial_count(mut self, count: usize) -> Self {
        self.trial_count = count;
        self
    }

    /// Sets the warmup count.
    pub fn with_warmup_count(mut self, count: usize) -> Self {
        self.warmup_count = count;
        self
    }

    /// Sets an explicit size sweep.
    pub fn with_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.sizes = Some(sizes);
        self
    }

    /// Sets the generated value range.
    pub fn with_value_range(mut self, low: i64, high: i64) -> Self {
        self.value_range = Some([low, high]);
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the per-run timeout.
    pub fn with_timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout_secs = Some(seconds);
        self
    }

    /// Sets the verification policy.
    pub fn with_verification(mut self, verification: VerificationConfig) -> Self {
        self.verification = verification;
        self
    }

    /// Sets the build step.
    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = Some(build);
        self
    }

    /// Sets the output configuration.
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Adds an implementation under test.
    pub fn with_implementation(mut self, implementation: ImplementationConfig) -> Self {
        self.implementations.push(implementation);
        self
    }

    /// Returns the size sweep.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_config::BenchConfig;
    ///
    /// let config = BenchConfig::new();
    /// assert_eq!(config.sizes().first(), Some(&2));
    /// assert_eq!(config.sizes().last(), Some(&1024));
    ///
    /// let config = BenchConfig::new().with_sizes(vec![8, 16]);
    /// assert_eq!(config.sizes(), vec![8, 16]);
    /// ```
    pub fn sizes(&self) -> Vec<usize> {
        self.sizes
            .clone()
            .unwrap_or_else(|| geometric_sizes(2, 1024))
    }

    /// Returns the generated value range, `[0, 10)` by default.
    pub fn value_range(&self) -> Result<ValueRange, ConfigError> {
        match self.value_range {
            Some([low, high]) => {
                ValueRange::new(low, high).map_err(|e| ConfigError::Invalid(e.to_string()))
            }
            None => Ok(ValueRange::default()),
        }
    }

    /// Returns the per-run timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Returns the comparison mode for results.
    pub fn compare_mode(&self) -> CompareMode {
        self.verification.compare_mode()
    }

    /// Resolves every relative path against `base`, usually the directory
    /// containing the configuration file.
    pub fn rebase(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(build) = self.build.as_mut() {
            match build.working_dir.as_mut() {
                Some(dir) => join(dir),
                None => build.working_dir = Some(base.to_path_buf()),
            }
        }
        join(&mut self.output.plot_path);
        if let Some(p) = self.output.csv_path.as_mut() {
            join(p);
        }
        if let Some(p) = self.output.markdown_path.as_mut() {
            join(p);
        }
        for implementation in &mut self.implementations {
            match implementation.working_dir.as_mut() {
                Some(dir) => join(dir),
                None => implementation.working_dir = Some(base.to_path_buf()),
            }
        }
        self
    }

    /// Checks the configuration for values that would make a run meaningless.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_config::{BenchConfig, ImplementationConfig};
    ///
    /// assert!(BenchConfig::new().validate().is_err()); // no implementations
    ///
    /// let config = BenchConfig::new()
    ///     .with_implementation(ImplementationConfig::new("single", "./single"));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.implementations.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one implementation is required".to_string(),
            ));
        }
        if self.trial_count == 0 {
            return Err(ConfigError::Invalid(
                "trial_count must be at least 1".to_string(),
            ));
        }
        let sizes = self.sizes();
        if sizes.is_empty() {
            return Err(ConfigError::Invalid("sizes must not be empty".to_string()));
        }
        if sizes.contains(&0) {
            return Err(ConfigError::Invalid(
                "sizes must be positive".to_string(),
            ));
        }
        let mut distinct = HashSet::new();
        if let Some(size) = sizes.iter().find(|&&size| !distinct.insert(size)) {
            return Err(ConfigError::Invalid(format!("duplicate size {}", size)));
        }
        self.value_range()?;
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "timeout_secs must be positive".to_string(),
            ));
        }
        self.verification.validate()?;
        if let Some(build) = &self.build {
            if build.command.is_empty() {
                return Err(ConfigError::Invalid(
                    "build.command must not be empty".to_string(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for implementation in &self.implementations {
            if implementation.id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "implementation id must not be empty".to_string(),
                ));
            }
            if !seen.insert(implementation.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate implementation id '{}'",
                    implementation.id
                )));
            }
            if implementation.program.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "implementation '{}' has no program",
                    implementation.id
                )));
            }
        }
        Ok(())
    }
}

/// Returns `start, 2*start, ...` up to and including `end`.
///
/// # Examples
///
/// ```
/// use matbench_config::geometric_sizes;
///
/// assert_eq!(geometric_sizes(2, 16), vec![2, 4, 8, 16]);
/// assert_eq!(geometric_sizes(3, 20), vec![3, 6, 12]);
/// assert!(geometric_sizes(0, 8).is_empty());
/// ```
pub fn geometric_sizes(start: usize, end: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    if start == 0 {
        return sizes;
    }
    let mut size = start;
    while size <= end {
        sizes.push(size);
        match size.checked_mul(2) {
            Some(next) => size = next,
            None => break,
        }
    }
    sizes
}

/// Verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VerificationConfig {
    /// Comparison mode.
    #[serde(default)]
    pub mode: VerificationMode,

    /// Absolute tolerance used in tolerant mode.
    #[serde(default = "default_abs_tolerance")]
    pub abs_tolerance: f64,

    /// Relative tolerance used in tolerant mode.
    #[serde(default = "default_rel_tolerance")]
    pub rel_tolerance: f64,
}

fn default_abs_tolerance() -> f64 {
    CompareMode::DEFAULT_ABS
}

fn default_rel_tolerance() -> f64 {
    CompareMode::DEFAULT_REL
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            mode: VerificationMode::default(),
            abs_tolerance: default_abs_tolerance(),
            rel_tolerance: default_rel_tolerance(),
        }
    }
}

impl VerificationConfig {
    /// Exact comparison.
    pub fn exact() -> Self {
        Self {
            mode: VerificationMode::Exact,
            ..Self::default()
        }
    }

    pub fn compare_mode(&self) -> CompareMode {
        match self.mode {
            VerificationMode::Exact => CompareMode::Exact,
            VerificationMode::Tolerant => CompareMode::Tolerant {
                abs: self.abs_tolerance,
                rel: self.rel_tolerance,
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !finite_non_negative(self.abs_tolerance) || !finite_non_negative(self.rel_tolerance) {
            return Err(ConfigError::Invalid(
                "tolerances must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result comparison mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Pairwise identical values.
    Exact,

    /// Values within `abs + rel * |expected|`.
    #[default]
    Tolerant,
}

/// Build step configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildConfig {
    /// Program followed by its arguments.
    pub command: Vec<String>,

    /// Directory the build runs in.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl BuildConfig {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    /// Plot title.
    #[serde(default = "default_title")]
    pub title: String,

    /// SVG plot destination.
    #[serde(default = "default_plot_path")]
    pub plot_path: PathBuf,

    /// Optional CSV export.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    /// Optional Markdown report.
    #[serde(default)]
    pub markdown_path: Option<PathBuf>,
}

fn default_title() -> String {
    "Matrix Multiplication Benchmark".to_string()
}

fn default_plot_path() -> PathBuf {
    PathBuf::from("benchmark.svg")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            plot_path: default_plot_path(),
            csv_path: None,
            markdown_path: None,
        }
    }
}

/// How an implementation is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// One process run per trial; the harness times the process.
    #[default]
    PerTrial,

    /// One process run for the whole sweep; timings come from the
    /// executable's timing-results file.
    Batch,
}

/// An implementation under test.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ImplementationConfig {
    /// Unique identifier.
    pub id: String,

    /// Legend label; defaults to the id.
    #[serde(default)]
    pub label: Option<String>,

    /// Executable path or name.
    pub program: PathBuf,

    /// Arguments; the usual contract is none.
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory the executable runs in and exchanges files through.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Invocation mode.
    #[serde(default)]
    pub mode: InvocationMode,

    /// Batch mode: directory of per-size files, relative to `working_dir`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Batch mode: timing-results file, relative to `working_dir`.
    #[serde(default)]
    pub timing_file: Option<PathBuf>,

    /// Header convention overrides; defaults depend on `mode`.
    #[serde(default)]
    pub headers: Option<FileConvention>,

    /// Let the executable write to the harness's stdout/stderr.
    #[serde(default)]
    pub inherit_output: bool,
}

impl ImplementationConfig {
    /// Creates a per-trial implementation.
    pub fn new(id: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            label: None,
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            mode: InvocationMode::PerTrial,
            data_dir: None,
            timing_file: None,
            headers: None,
            inherit_output: false,
        }
    }

    /// Creates a batch implementation.
    pub fn batch(id: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            mode: InvocationMode::Batch,
            ..Self::new(id, program)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.timing_file = Some(path.into());
        self
    }

    pub fn with_headers(mut self, headers: FileConvention) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Returns the legend label.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Returns the working directory, `.` when unset.
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the header convention in effect.
    pub fn convention(&self) -> FileConvention {
        self.headers.unwrap_or(match self.mode {
            InvocationMode::PerTrial => FileConvention::per_trial(),
            InvocationMode::Batch => FileConvention::batch(),
        })
    }

    /// Batch data directory, `<working_dir>/data` by default.
    pub fn data_dir(&self) -> PathBuf {
        self.working_dir()
            .join(self.data_dir.as_deref().unwrap_or(Path::new("data")))
    }

    /// Batch timing file, `<data_dir>/timingResults_<id>.txt` by default.
    pub fn timing_file(&self) -> PathBuf {
        match &self.timing_file {
            Some(path) => self.working_dir().join(path),
            None => self
                .data_dir()
                .join(format!("timingResults_{}.txt", self.id)),
        }
    }
}
