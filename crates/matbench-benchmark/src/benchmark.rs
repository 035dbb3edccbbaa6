//! Benchmark orchestration across implementations.

use matbench_config::{BenchConfig, InvocationMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::build_step::run_build;
use crate::error::{BenchError, Result};
use crate::report::BenchmarkReport;
use crate::result::{TrialLog, TrialLogBuilder};
use crate::runner::{BatchRunner, TrialRunner, TrialSettings};
use crate::stats::StatsAggregator;

/// A configured benchmark: build, sweep every implementation, aggregate.
///
/// # Examples
///
/// ```no_run
/// use matbench_benchmark::Benchmark;
/// use matbench_config::BenchConfig;
///
/// let config = BenchConfig::load("matbench.toml").unwrap();
/// let benchmark = Benchmark::new(config).unwrap();
/// let report = benchmark.run().unwrap();
/// for line in report.summary_lines() {
///     println!("{}", line);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: BenchConfig,
}

impl Benchmark {
    /// Validates the configuration and wraps it.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs the benchmark with the configured seed, or an OS seed.
    pub fn run(&self) -> Result<BenchmarkReport> {
        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.run_with_rng(&mut rng)
    }

    /// Runs the benchmark drawing operands from `rng`.
    ///
    /// A build failure aborts before any trial runs.
    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BenchmarkReport> {
        if let Some(build) = &self.config.build {
            run_build(build)?;
        }

        let log = self.collect(rng)?;
        let aggregator = StatsAggregator::new(self.config.confidence_level);
        let report = BenchmarkReport::from_log(&self.config.output.title, &log, aggregator)
            .with_labels(
                self.config
                    .implementations
                    .iter()
                    .map(|i| (i.id.as_str(), i.label())),
            );
        report.log_summary();
        Ok(report)
    }

    /// Runs every trial and seals the log.
    pub fn collect<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialLog> {
        let settings = TrialSettings::from_config(&self.config)?;
        let sizes = self.config.sizes();
        let mut log = TrialLogBuilder::new();

        for implementation in &self.config.implementations {
            let id = implementation.id.as_str();
            info!(
                event = "sweep_start",
                implementation = %id,
                sizes = sizes.len(),
                trials = settings.trial_count,
            );
            log.register(id);

            match implementation.mode {
                InvocationMode::PerTrial => {
                    TrialRunner::new(implementation, settings.clone())?
                        .run_sweep(&sizes, rng, &mut log)?;
                }
                InvocationMode::Batch => {
                    match BatchRunner::new(implementation, settings.clone())?.run(&sizes, rng) {
                        Ok(records) => log.extend(records),
                        Err(BenchError::MissingArtifact { path }) => {
                            skip(&mut log, id, format!("{} not written", path.display()));
                        }
                        Err(e @ BenchError::MalformedTiming { .. }) => {
                            skip(&mut log, id, e.to_string());
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            info!(
                event = "sweep_end",
                implementation = %id,
                failures = log.failure_count(id),
            );
        }

        Ok(log.seal())
    }
}

/// Marks a batch implementation whose timing artifact is unusable.
fn skip(log: &mut TrialLogBuilder, id: &str, reason: String) {
    warn!(
        event = "implementation_skipped",
        implementation = %id,
        detail = %reason,
        "unusable timing results, skipping implementation"
    );
    log.mark_skipped(id, reason);
}

#[cfg(test)]
#[path = "benchmark_tests.rs"]
mod tests;
