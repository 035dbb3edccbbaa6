//! Timing-results files written by batch executables.
//!
//! Each non-empty line is `"<size> <seconds>"`. Lines for the same size
//! may repeat, once per trial.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{BenchError, Result};

/// One timing line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub size: usize,
    pub elapsed_seconds: f64,
}

/// Parses timing-results text.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::timing::parse_timings;
///
/// let samples = parse_timings("2 0.001\n2 0.002\n\n4 1.5e-3\n").unwrap();
/// assert_eq!(samples.len(), 3);
/// assert_eq!(samples[2].size, 4);
///
/// assert!(parse_timings("2\n").is_err());
/// ```
pub fn parse_timings(text: &str) -> Result<Vec<TimingSample>> {
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut tokens = line.split_whitespace();
        let (Some(size), Some(secs)) = (tokens.next(), tokens.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(malformed(
                line_no,
                format!("expected '<size> <seconds>', found '{}'", line.trim()),
            ));
        };
        if tokens.next().is_some() {
            return Err(malformed(
                line_no,
                format!("trailing values in '{}'", line.trim()),
            ));
        }

        let size = size
            .parse::<usize>()
            .map_err(|_| malformed(line_no, format!("invalid size '{}'", size)))?;
        let elapsed_seconds = secs
            .parse::<f64>()
            .map_err(|_| malformed(line_no, format!("invalid seconds '{}'", secs)))?;
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(malformed(
                line_no,
                format!("seconds out of range '{}'", secs),
            ));
        }
        samples.push(TimingSample {
            size,
            elapsed_seconds,
        });
    }
    Ok(samples)
}

/// Reads and parses a timing-results file.
///
/// A missing file is reported as [`BenchError::MissingArtifact`].
pub fn load_timings(path: impl AsRef<Path>) -> Result<Vec<TimingSample>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BenchError::MissingArtifact {
                path: path.to_path_buf(),
            }
        } else {
            BenchError::io(path, e)
        }
    })?;
    parse_timings(&text)
}

/// Groups samples by size, keeping file order within a size.
pub fn group_by_size(samples: &[TimingSample]) -> BTreeMap<usize, Vec<f64>> {
    let mut groups: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(sample.size)
            .or_default()
            .push(sample.elapsed_seconds);
    }
    groups
}

fn malformed(line: usize, message: String) -> BenchError {
    BenchError::MalformedTiming { line, message }
}
