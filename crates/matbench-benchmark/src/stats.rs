//! Statistical reduction of trial timings.
//!
//! For each `(implementation, size)` group the finite timings are reduced to
//! a mean, a Bessel-corrected standard deviation, and a two-sided Student-t
//! confidence interval. Failed trials carry NaN timings and are counted but
//! never averaged.

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::result::{TrialLog, TrialRecord};
use crate::timing::{group_by_size, TimingSample};

/// Aggregate statistics for one implementation at one size.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeStats {
    pub size: usize,
    /// Trials attempted.
    pub trials: usize,
    /// Trials that contributed a timing.
    pub samples: usize,
    /// Trials that did not pass.
    pub failures: usize,
    /// Mean seconds; NaN when there are no samples.
    pub mean: f64,
    /// Sample standard deviation; zero when `samples < 2`.
    pub std_dev: f64,
    /// Half-width of the confidence interval; zero when `samples < 2`.
    pub ci_half_width: f64,
    /// Every trial produced a correct result.
    pub all_correct: bool,
}

impl SizeStats {
    /// Lower and upper bounds of the confidence interval.
    pub fn interval(&self) -> (f64, f64) {
        (self.mean - self.ci_half_width, self.mean + self.ci_half_width)
    }

    /// Returns `true` if the mean can be plotted.
    pub fn has_mean(&self) -> bool {
        self.mean.is_finite()
    }
}

/// Statistics for every size of one implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationStats {
    pub implementation_id: String,
    pub stats: Vec<SizeStats>,
    /// Set when the implementation produced no usable data at all.
    pub skipped: Option<String>,
}

impl ImplementationStats {
    pub fn all_correct(&self) -> bool {
        self.skipped.is_none() && self.stats.iter().all(|s| s.all_correct)
    }

    pub fn get(&self, size: usize) -> Option<&SizeStats> {
        self.stats.iter().find(|s| s.size == size)
    }
}

/// Reduces timings at a fixed confidence level.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::StatsAggregator;
///
/// let stats = StatsAggregator::default().summarize(64, &[1.0, 1.0, 1.0]);
/// assert_eq!(stats.mean, 1.0);
/// assert_eq!(stats.std_dev, 0.0);
/// assert_eq!(stats.ci_half_width, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsAggregator {
    confidence_level: f64,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl StatsAggregator {
    /// Creates an aggregator for a two-sided interval at `confidence_level`,
    /// which must lie in `(0, 1)`.
    pub fn new(confidence_level: f64) -> Self {
        debug_assert!(confidence_level > 0.0 && confidence_level < 1.0);
        Self { confidence_level }
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Aggregates one group of trial records.
    ///
    /// Incorrect trials still contribute their timing; `all_correct`
    /// reports them.
    pub fn aggregate(&self, size: usize, records: &[TrialRecord]) -> SizeStats {
        let times: Vec<f64> = records.iter().map(|r| r.elapsed_seconds).collect();
        let mut stats = self.summarize(size, &times);
        stats.failures = records.iter().filter(|r| r.outcome.is_failure()).count();
        stats.all_correct = !records.is_empty() && records.iter().all(|r| r.correct);
        stats
    }

    /// Aggregates raw timings; non-finite values count as failures.
    pub fn summarize(&self, size: usize, times: &[f64]) -> SizeStats {
        let finite: Vec<f64> = times.iter().copied().filter(|t| t.is_finite()).collect();
        let (mean, std_dev) = mean_and_std_dev(&finite);
        let ci_half_width = if finite.len() < 2 {
            0.0
        } else {
            let df = (finite.len() - 1) as f64;
            t_quantile(self.upper_tail(), df) * std_dev / (finite.len() as f64).sqrt()
        };

        SizeStats {
            size,
            trials: times.len(),
            samples: finite.len(),
            failures: times.len() - finite.len(),
            mean,
            std_dev,
            ci_half_width,
            all_correct: finite.len() == times.len() && !times.is_empty(),
        }
    }

    /// Aggregates every group of a sealed log.
    pub fn aggregate_log(&self, log: &TrialLog) -> Vec<ImplementationStats> {
        log.implementations()
            .iter()
            .map(|id| {
                let stats: Vec<SizeStats> = log
                    .sizes(id)
                    .into_iter()
                    .filter_map(|size| {
                        log.get(id, size)
                            .map(|records| self.aggregate(size, records))
                    })
                    .collect();
                debug!(event = "aggregated", implementation = %id, sizes = stats.len());
                ImplementationStats {
                    implementation_id: id.clone(),
                    stats,
                    skipped: log.skip_reason(id).map(str::to_string),
                }
            })
            .collect()
    }

    /// Aggregates a timing-results file's samples by size.
    ///
    /// Correctness is unknown here and reported as `true`.
    pub fn aggregate_timings(&self, samples: &[TimingSample]) -> Vec<SizeStats> {
        group_by_size(samples)
            .into_iter()
            .map(|(size, times)| self.summarize(size, &times))
            .collect()
    }

    fn upper_tail(&self) -> f64 {
        1.0 - (1.0 - self.confidence_level) / 2.0
    }
}

/// Mean and Bessel-corrected standard deviation.
///
/// Returns `(NaN, 0.0)` for an empty slice and a zero deviation for a
/// single value.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::stats::mean_and_std_dev;
///
/// let (mean, sd) = mean_and_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
/// assert_eq!(mean, 5.0);
/// assert!((sd - 2.138).abs() < 1e-3);
///
/// let (mean, sd) = mean_and_std_dev(&[]);
/// assert!(mean.is_nan());
/// assert_eq!(sd, 0.0);
/// ```
pub fn mean_and_std_dev(samples: &[f64]) -> (f64, f64) {
    let n = samples.len();
    if n == 0 {
        return (f64::NAN, 0.0);
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, variance.sqrt())
}

/// Quantile of the standard Student-t distribution.
///
/// Returns NaN if `df` is not positive.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::stats::t_quantile;
///
/// assert!((t_quantile(0.975, 1.0) - 12.706).abs() < 1e-3);
/// assert!((t_quantile(0.975, 9.0) - 2.262).abs() < 1e-3);
/// ```
pub fn t_quantile(p: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => dist.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
