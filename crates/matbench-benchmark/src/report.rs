//! Benchmark reports: summary lines, exports, and the plot.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use matbench_config::OutputConfig;
use tracing::info;

use crate::error::{BenchError, Result};
use crate::plot::SvgPlot;
use crate::result::TrialLog;
use crate::stats::{SizeStats, StatsAggregator};
use crate::timing::TimingSample;

/// Aggregated results for one implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub implementation_id: String,
    pub label: String,
    pub stats: Vec<SizeStats>,
    pub skipped: Option<String>,
}

impl Series {
    pub fn all_correct(&self) -> bool {
        self.skipped.is_none() && self.stats.iter().all(|s| s.all_correct)
    }

    pub fn get(&self, size: usize) -> Option<&SizeStats> {
        self.stats.iter().find(|s| s.size == size)
    }
}

/// Results of a benchmark, ready for rendering.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::{BenchmarkReport, StatsAggregator, TrialLogBuilder, TrialRecord};
///
/// let mut builder = TrialLogBuilder::new();
/// for (i, t) in [1.0, 1.0, 1.0].into_iter().enumerate() {
///     builder.record(TrialRecord::completed("single", 64, i, t, true));
/// }
/// let report = BenchmarkReport::from_log("demo", &builder.seal(), StatsAggregator::default())
///     .with_labels([("single", "Single thread")]);
///
/// assert_eq!(report.series[0].label, "Single thread");
/// assert!(report.all_correct());
/// assert!(report.summary_lines()[0].contains("Correct: true"));
/// ```
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub title: String,
    pub confidence_level: f64,
    pub series: Vec<Series>,
    log: Option<TrialLog>,
}

impl BenchmarkReport {
    /// Aggregates a sealed log into a report.
    pub fn from_log(title: impl Into<String>, log: &TrialLog, aggregator: StatsAggregator) -> Self {
        let series = aggregator
            .aggregate_log(log)
            .into_iter()
            .map(|s| Series {
                label: s.implementation_id.clone(),
                implementation_id: s.implementation_id,
                stats: s.stats,
                skipped: s.skipped,
            })
            .collect();
        Self {
            title: title.into(),
            confidence_level: aggregator.confidence_level(),
            series,
            log: Some(log.clone()),
        }
    }

    /// Builds a single-series report from a timing-results file.
    pub fn from_timings(
        title: impl Into<String>,
        implementation_id: impl Into<String>,
        samples: &[TimingSample],
        aggregator: StatsAggregator,
    ) -> Self {
        let implementation_id = implementation_id.into();
        Self {
            title: title.into(),
            confidence_level: aggregator.confidence_level(),
            series: vec![Series {
                label: implementation_id.clone(),
                implementation_id,
                stats: aggregator.aggregate_timings(samples),
                skipped: None,
            }],
            log: None,
        }
    }

    /// Replaces legend labels by implementation id.
    pub fn with_labels<'a, I>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let labels: HashMap<&str, &str> = labels.into_iter().collect();
        for series in &mut self.series {
            if let Some(label) = labels.get(series.implementation_id.as_str()) {
                series.label = (*label).to_string();
            }
        }
        self
    }

    /// The trial log behind the report, if it came from a run.
    pub fn log(&self) -> Option<&TrialLog> {
        self.log.as_ref()
    }

    /// `true` if no implementation was skipped or produced a wrong result.
    pub fn all_correct(&self) -> bool {
        self.series.iter().all(Series::all_correct)
    }

    /// One line per implementation and size.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for series in &self.series {
            if let Some(reason) = &series.skipped {
                lines.push(format!("{}: skipped ({})", series.label, reason));
                continue;
            }
            for s in &series.stats {
                let mut line = format!(
                    "{} n={}: mean {} ± {} (sd {}, {}/{} timed) Correct: {}",
                    series.label,
                    s.size,
                    fmt_secs(s.mean),
                    fmt_secs(s.ci_half_width),
                    fmt_secs(s.std_dev),
                    s.samples,
                    s.trials,
                    s.all_correct
                );
                if s.failures > 0 {
                    write!(line, ", {} failed", s.failures).unwrap();
                }
                lines.push(line);
            }
        }
        lines
    }

    /// Emits a `size_summary` event per implementation and size.
    pub fn log_summary(&self) {
        for series in &self.series {
            for s in &series.stats {
                info!(
                    event = "size_summary",
                    implementation = %series.label,
                    size = s.size,
                    mean = s.mean,
                    ci = s.ci_half_width,
                    correct = s.all_correct,
                    failures = s.failures,
                    trials = s.trials,
                );
            }
        }
    }

    /// Writes the plot and any configured exports, returning their paths.
    pub fn write_outputs(&self, output: &OutputConfig) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        SvgPlot::new(&self.title)
            .to_file(self, &output.plot_path)
            .map_err(|e| BenchError::io(&output.plot_path, e))?;
        written.push(output.plot_path.clone());

        if let Some(path) = &output.csv_path {
            CsvExporter::to_file(self, path).map_err(|e| BenchError::io(path, e))?;
            written.push(path.clone());
        }
        if let Some(path) = &output.markdown_path {
            MarkdownReport::to_file(self, path).map_err(|e| BenchError::io(path, e))?;
            written.push(path.clone());
        }

        for path in &written {
            info!(event = "report_written", path = %path.display());
        }
        Ok(written)
    }
}

fn fmt_secs(secs: f64) -> String {
    if secs.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.6}s", secs)
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV exporter for aggregated results.
///
/// # Example
///
/// ```
/// use matbench_benchmark::{BenchmarkReport, CsvExporter, StatsAggregator, TrialLogBuilder, TrialRecord};
///
/// let mut builder = TrialLogBuilder::new();
/// builder.record(TrialRecord::completed("omp", 8, 0, 0.5, true));
/// let report = BenchmarkReport::from_log("t", &builder.seal(), StatsAggregator::default());
///
/// let csv = CsvExporter::to_string(&report);
/// assert!(csv.starts_with("implementation,label,size,trials"));
/// assert!(csv.contains("omp,omp,8,1,1,0,0.500000000,"));
/// ```
pub struct CsvExporter;

impl CsvExporter {
    /// Exports aggregated results to a CSV string.
    pub fn to_string(report: &BenchmarkReport) -> String {
        let mut output = String::new();

        writeln!(
            output,
            "implementation,label,size,trials,samples,failures,mean_s,std_dev_s,ci_half_width_s,all_correct"
        )
        .unwrap();

        for series in &report.series {
            for s in &series.stats {
                writeln!(
                    output,
                    "{},{},{},{},{},{},{:.9},{:.9},{:.9},{}",
                    csv_field(&series.implementation_id),
                    csv_field(&series.label),
                    s.size,
                    s.trials,
                    s.samples,
                    s.failures,
                    s.mean,
                    s.std_dev,
                    s.ci_half_width,
                    s.all_correct,
                )
                .unwrap();
            }
        }

        output
    }

    /// Exports every individual trial to a CSV string.
    pub fn trials_to_string(log: &TrialLog) -> String {
        let mut output = String::new();
        writeln!(output, "implementation,size,trial_index,elapsed_s,correct,outcome").unwrap();
        for record in log.records() {
            writeln!(
                output,
                "{},{},{},{:.9},{},{}",
                csv_field(&record.implementation_id),
                record.size,
                record.trial_index,
                record.elapsed_seconds,
                record.correct,
                csv_field(&record.outcome.to_string()),
            )
            .unwrap();
        }
        output
    }

    /// Exports aggregated results to a CSV file.
    pub fn to_file(report: &BenchmarkReport, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, Self::to_string(report))
    }

    /// Writes aggregated results as CSV to a writer.
    pub fn write<W: Write>(report: &BenchmarkReport, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::to_string(report).as_bytes())
    }
}

/// Markdown report generator.
///
/// # Example
///
/// ```
/// use matbench_benchmark::{BenchmarkReport, MarkdownReport, StatsAggregator, TrialLogBuilder, TrialRecord};
///
/// let mut builder = TrialLogBuilder::new();
/// builder.record(TrialRecord::completed("single", 8, 0, 0.4, true));
/// builder.record(TrialRecord::completed("omp", 8, 0, 0.1, true));
/// let report = BenchmarkReport::from_log("Matmul", &builder.seal(), StatsAggregator::default());
///
/// let md = MarkdownReport::to_string(&report);
/// assert!(md.contains("# Benchmark: Matmul"));
/// assert!(md.contains("## Comparison"));
/// assert!(md.contains("4.00x"));
/// ```
pub struct MarkdownReport;

impl MarkdownReport {
    /// Generates a Markdown report string.
    pub fn to_string(report: &BenchmarkReport) -> String {
        let mut output = String::new();

        writeln!(output, "# Benchmark: {}", report.title).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "- **Implementations**: {}", report.series.len()).unwrap();
        writeln!(
            output,
            "- **Confidence level**: {:.0}%",
            report.confidence_level * 100.0
        )
        .unwrap();
        writeln!(output).unwrap();

        for series in &report.series {
            writeln!(output, "## {}", series.label).unwrap();
            writeln!(output).unwrap();

            if let Some(reason) = &series.skipped {
                writeln!(output, "*Skipped: {}.*", reason).unwrap();
                writeln!(output).unwrap();
                continue;
            }
            if series.stats.is_empty() {
                writeln!(output, "*No trials completed.*").unwrap();
                writeln!(output).unwrap();
                continue;
            }

            writeln!(
                output,
                "| Size | Trials | Mean (ms) | Std Dev (ms) | CI ± (ms) | Correct |"
            )
            .unwrap();
            writeln!(
                output,
                "|------|--------|-----------|--------------|-----------|---------|"
            )
            .unwrap();
            for s in &series.stats {
                writeln!(
                    output,
                    "| {} | {}/{} | {} | {:.3} | {:.3} | {} |",
                    s.size,
                    s.samples,
                    s.trials,
                    fmt_ms(s.mean),
                    s.std_dev * 1000.0,
                    s.ci_half_width * 1000.0,
                    if s.all_correct { "yes" } else { "**no**" },
                )
                .unwrap();
            }
            writeln!(output).unwrap();
        }

        if report.series.len() > 1 {
            output.push_str(&Self::comparison(report));
        }

        output
    }

    /// Generates a table of mean times per size, with the speedup of each
    /// implementation over the first one.
    pub fn comparison(report: &BenchmarkReport) -> String {
        let mut output = String::new();
        let Some(baseline) = report.series.first() else {
            return output;
        };

        let mut sizes: Vec<usize> = report
            .series
            .iter()
            .flat_map(|s| s.stats.iter().map(|st| st.size))
            .collect();
        sizes.sort_unstable();
        sizes.dedup();

        writeln!(output, "## Comparison").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Speedup is relative to {}.", baseline.label).unwrap();
        writeln!(output).unwrap();

        let mut header = String::from("| Size |");
        let mut rule = String::from("|------|");
        for series in &report.series {
            write!(header, " {} |", series.label).unwrap();
            rule.push_str("------|");
        }
        writeln!(output, "{}", header).unwrap();
        writeln!(output, "{}", rule).unwrap();

        for size in sizes {
            let base = baseline.get(size).map(|s| s.mean).unwrap_or(f64::NAN);
            let mut row = format!("| {} |", size);
            for series in &report.series {
                match series.get(size).filter(|s| s.has_mean()) {
                    Some(s) if base.is_finite() && s.mean > 0.0 => {
                        write!(row, " {} ({:.2}x) |", fmt_ms(s.mean), base / s.mean).unwrap()
                    }
                    Some(s) => write!(row, " {} |", fmt_ms(s.mean)).unwrap(),
                    None => row.push_str(" N/A |"),
                }
            }
            writeln!(output, "{}", row).unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// Writes Markdown report to a file.
    pub fn to_file(report: &BenchmarkReport, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, Self::to_string(report))
    }

    /// Writes Markdown report to a writer.
    pub fn write<W: Write>(report: &BenchmarkReport, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::to_string(report).as_bytes())
    }
}

fn fmt_ms(secs: f64) -> String {
    if secs.is_nan() {
        "N/A".to_string()
    } else {
        format!("{:.3}", secs * 1000.0)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
