//! Benchmark harness for external matrix multiplication executables.
//!
//! The harness treats every implementation as an opaque program that
//! exchanges matrices through text files. For each matrix size it writes
//! random operands, runs the program, times it, checks its result against a
//! reference product, and finally reduces the timings to means with
//! Student-t confidence intervals.
//!
//! # Overview
//!
//! - [`TrialRunner`] runs one process per trial and times it.
//! - [`BatchRunner`] runs one process per sweep and reads its timing file.
//! - [`StatsAggregator`] reduces a [`TrialLog`] to [`SizeStats`].
//! - [`BenchmarkReport`] prints summaries, plots, and exports CSV or Markdown.
//! - [`Benchmark`] ties these together from a [`BenchConfig`].
//!
//! A failing executable never stops a sweep: its trials are recorded as
//! failures and excluded from the statistics.
//!
//! # Example
//!
//! ```
//! use matbench_benchmark::{StatsAggregator, TrialLogBuilder, TrialOutcome, TrialRecord};
//!
//! let mut log = TrialLogBuilder::new();
//! log.record(TrialRecord::completed("single", 64, 0, 1.0, true));
//! log.record(TrialRecord::completed("single", 64, 1, 1.0, true));
//! log.record(TrialRecord::failed("single", 64, 2, TrialOutcome::Timeout));
//! let log = log.seal();
//!
//! let stats = StatsAggregator::default().aggregate(64, log.get("single", 64).unwrap());
//! assert_eq!(stats.samples, 2);
//! assert_eq!(stats.failures, 1);
//! assert_eq!(stats.mean, 1.0);
//! assert!(!stats.all_correct);
//! ```
//!
//! [`BenchConfig`]: matbench_config::BenchConfig

mod benchmark;
mod build_step;
mod error;
mod plot;
pub mod process;
mod report;
mod result;
mod runner;
pub mod stats;
pub mod timing;

pub use benchmark::Benchmark;
pub use build_step::run_build;
pub use error::{BenchError, Result};
pub use plot::SvgPlot;
pub use report::{BenchmarkReport, CsvExporter, MarkdownReport, Series};
pub use result::{TrialKey, TrialLog, TrialLogBuilder, TrialOutcome, TrialRecord};
pub use runner::{
    verify_files, write_operand_files, BatchRunner, ExchangePaths, TrialRunner, TrialSettings,
};
pub use stats::{ImplementationStats, SizeStats, StatsAggregator};
pub use timing::{load_timings, parse_timings, TimingSample};
