//! Trial records and the sealed trial log.

use std::collections::BTreeMap;
use std::fmt;

/// How a single trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Ran to completion and the result matched the reference.
    Passed,
    /// Ran to completion but the result was wrong or unreadable.
    Incorrect,
    /// Could not be spawned, or exited unsuccessfully. `code` is `None`
    /// when the process was killed by a signal or never started.
    ExecutableFailure { code: Option<i32> },
    /// Exceeded the configured timeout and was killed.
    Timeout,
    /// Exited cleanly without producing the expected output file.
    MissingArtifact,
}

impl TrialOutcome {
    /// Returns `true` if the trial produced a timing worth keeping.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_benchmark::TrialOutcome;
    ///
    /// assert!(TrialOutcome::Passed.is_timed());
    /// assert!(TrialOutcome::Incorrect.is_timed());
    /// assert!(!TrialOutcome::Timeout.is_timed());
    /// ```
    pub fn is_timed(&self) -> bool {
        matches!(self, TrialOutcome::Passed | TrialOutcome::Incorrect)
    }

    /// Returns `true` for outcomes caused by the executable misbehaving.
    pub fn is_failure(&self) -> bool {
        !matches!(self, TrialOutcome::Passed)
    }
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialOutcome::Passed => write!(f, "passed"),
            TrialOutcome::Incorrect => write!(f, "incorrect"),
            TrialOutcome::ExecutableFailure { code: Some(code) } => {
                write!(f, "exit status {}", code)
            }
            TrialOutcome::ExecutableFailure { code: None } => write!(f, "executable failure"),
            TrialOutcome::Timeout => write!(f, "timeout"),
            TrialOutcome::MissingArtifact => write!(f, "missing result"),
        }
    }
}

/// Result of one trial.
///
/// `elapsed_seconds` is NaN when the trial failed before a timing could be
/// taken (spawn failure, non-zero exit, timeout, or no output).
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub size: usize,
    pub implementation_id: String,
    pub trial_index: usize,
    pub elapsed_seconds: f64,
    pub correct: bool,
    pub outcome: TrialOutcome,
}

impl TrialRecord {
    /// Creates a record for a trial that ran to completion.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_benchmark::{TrialOutcome, TrialRecord};
    ///
    /// let ok = TrialRecord::completed("single", 8, 0, 0.25, true);
    /// assert_eq!(ok.outcome, TrialOutcome::Passed);
    ///
    /// let wrong = TrialRecord::completed("single", 8, 1, 0.25, false);
    /// assert_eq!(wrong.outcome, TrialOutcome::Incorrect);
    /// assert_eq!(wrong.elapsed_seconds, 0.25);
    /// ```
    pub fn completed(
        implementation_id: impl Into<String>,
        size: usize,
        trial_index: usize,
        elapsed_seconds: f64,
        correct: bool,
    ) -> Self {
        Self {
            size,
            implementation_id: implementation_id.into(),
            trial_index,
            elapsed_seconds,
            correct,
            outcome: if correct {
                TrialOutcome::Passed
            } else {
                TrialOutcome::Incorrect
            },
        }
    }

    /// Creates a record for a trial that failed without a usable timing.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_benchmark::{TrialOutcome, TrialRecord};
    ///
    /// let failed = TrialRecord::failed("omp", 8, 0, TrialOutcome::Timeout);
    /// assert!(failed.elapsed_seconds.is_nan());
    /// assert!(!failed.correct);
    /// ```
    pub fn failed(
        implementation_id: impl Into<String>,
        size: usize,
        trial_index: usize,
        outcome: TrialOutcome,
    ) -> Self {
        Self {
            size,
            implementation_id: implementation_id.into(),
            trial_index,
            elapsed_seconds: f64::NAN,
            correct: false,
            outcome,
        }
    }
}

/// Key of a trial group: one implementation at one size.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrialKey {
    pub implementation_id: String,
    pub size: usize,
}

/// Accumulates records while a benchmark runs.
///
/// Sealing turns the builder into a read-only [`TrialLog`]; nothing can be
/// added afterwards.
#[derive(Debug, Default)]
pub struct TrialLogBuilder {
    groups: BTreeMap<TrialKey, Vec<TrialRecord>>,
    implementations: Vec<String>,
    skipped: BTreeMap<String, String>,
}

impl TrialLogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an implementation so it keeps its place in the log even
    /// if it records nothing.
    pub fn register(&mut self, implementation_id: &str) {
        if !self.implementations.iter().any(|id| id == implementation_id) {
            self.implementations.push(implementation_id.to_string());
        }
    }

    /// Appends a record.
    pub fn record(&mut self, record: TrialRecord) {
        self.register(&record.implementation_id);
        let key = TrialKey {
            implementation_id: record.implementation_id.clone(),
            size: record.size,
        };
        self.groups.entry(key).or_default().push(record);
    }

    /// Marks an implementation as skipped, with a reason.
    pub fn mark_skipped(&mut self, implementation_id: &str, reason: impl Into<String>) {
        self.register(implementation_id);
        self.skipped
            .insert(implementation_id.to_string(), reason.into());
    }

    /// Failed trials recorded so far for an implementation.
    pub fn failure_count(&self, implementation_id: &str) -> usize {
        self.groups
            .iter()
            .filter(|(key, _)| key.implementation_id == implementation_id)
            .flat_map(|(_, records)| records)
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    /// Number of records so far.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Freezes the log.
    pub fn seal(self) -> TrialLog {
        TrialLog {
            groups: self.groups,
            implementations: self.implementations,
            skipped: self.skipped,
        }
    }
}

impl Extend<TrialRecord> for TrialLogBuilder {
    fn extend<T: IntoIterator<Item = TrialRecord>>(&mut self, iter: T) {
        for record in iter {
            self.record(record);
        }
    }
}

/// Read-only log of every trial, grouped by implementation and size.
///
/// # Examples
///
/// ```
/// use matbench_benchmark::{TrialLogBuilder, TrialRecord};
///
/// let mut builder = TrialLogBuilder::new();
/// builder.record(TrialRecord::completed("single", 16, 0, 0.5, true));
/// builder.record(TrialRecord::completed("single", 8, 0, 0.1, true));
/// builder.record(TrialRecord::completed("single", 8, 1, 0.2, true));
/// let log = builder.seal();
///
/// assert_eq!(log.len(), 3);
/// assert_eq!(log.sizes("single"), vec![8, 16]);
/// assert_eq!(log.get("single", 8).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrialLog {
    groups: BTreeMap<TrialKey, Vec<TrialRecord>>,
    implementations: Vec<String>,
    skipped: BTreeMap<String, String>,
}

impl TrialLog {
    /// Records for one implementation at one size, in trial order.
    pub fn get(&self, implementation_id: &str, size: usize) -> Option<&[TrialRecord]> {
        let key = TrialKey {
            implementation_id: implementation_id.to_string(),
            size,
        };
        self.groups.get(&key).map(Vec::as_slice)
    }

    /// Implementations in the order they were first seen.
    pub fn implementations(&self) -> &[String] {
        &self.implementations
    }

    /// Sizes recorded for an implementation, ascending.
    pub fn sizes(&self, implementation_id: &str) -> Vec<usize> {
        self.groups
            .keys()
            .filter(|key| key.implementation_id == implementation_id)
            .map(|key| key.size)
            .collect()
    }

    /// Reason an implementation was skipped, if it was.
    pub fn skip_reason(&self, implementation_id: &str) -> Option<&str> {
        self.skipped.get(implementation_id).map(String::as_str)
    }

    /// Iterates over every group.
    pub fn iter(&self) -> impl Iterator<Item = (&TrialKey, &[TrialRecord])> {
        self.groups.iter().map(|(key, records)| (key, records.as_slice()))
    }

    /// Iterates over every record.
    pub fn records(&self) -> impl Iterator<Item = &TrialRecord> {
        self.groups.values().flatten()
    }

    /// Number of failed trials for an implementation.
    pub fn failure_count(&self, implementation_id: &str) -> usize {
        self.records()
            .filter(|r| r.implementation_id == implementation_id && r.outcome.is_failure())
            .count()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
