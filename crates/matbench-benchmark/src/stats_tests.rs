//! Tests for statistical aggregation.

use super::*;
use crate::result::{TrialLogBuilder, TrialOutcome, TrialRecord};

fn records(size: usize, times: &[f64], correct: bool) -> Vec<TrialRecord> {
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| TrialRecord::completed("single", size, i, t, correct))
        .collect()
}

#[test]
fn test_identical_times_have_zero_spread() {
    let stats = StatsAggregator::default().aggregate(64, &records(64, &[1.0, 1.0, 1.0], true));

    assert_eq!(stats.size, 64);
    assert_eq!(stats.mean, 1.0);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.ci_half_width, 0.0);
    assert!(stats.all_correct);
}

#[test]
fn test_all_correct_reflects_flags() {
    let mut group = records(64, &[1.0, 1.0, 1.0], true);
    group[1] = TrialRecord::completed("single", 64, 1, 1.0, false);

    let stats = StatsAggregator::default().aggregate(64, &group);
    assert_eq!(stats.mean, 1.0);
    assert!(!stats.all_correct);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.samples, 3);
}

#[test]
fn test_single_sample_is_degenerate() {
    let stats = StatsAggregator::default().aggregate(8, &records(8, &[0.25], true));
    assert_eq!(stats.mean, 0.25);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.ci_half_width, 0.0);
    assert_eq!(stats.samples, 1);
}

#[test]
fn test_failed_trials_excluded_from_mean() {
    let group = vec![
        TrialRecord::completed("single", 8, 0, 2.0, true),
        TrialRecord::failed("single", 8, 1, TrialOutcome::Timeout),
        TrialRecord::completed("single", 8, 2, 4.0, true),
    ];
    let stats = StatsAggregator::default().aggregate(8, &group);

    assert_eq!(stats.trials, 3);
    assert_eq!(stats.samples, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.mean, 3.0);
    assert!(!stats.all_correct);
}

#[test]
fn test_all_failed_has_no_mean() {
    let group = vec![
        TrialRecord::failed("omp", 8, 0, TrialOutcome::ExecutableFailure { code: Some(3) }),
        TrialRecord::failed("omp", 8, 1, TrialOutcome::ExecutableFailure { code: Some(3) }),
    ];
    let stats = StatsAggregator::default().aggregate(8, &group);

    assert!(stats.mean.is_nan());
    assert!(!stats.has_mean());
    assert_eq!(stats.samples, 0);
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.ci_half_width, 0.0);
}

#[test]
fn test_t_quantiles() {
    assert!((t_quantile(0.975, 1.0) - 12.706).abs() < 1e-3);
    assert!((t_quantile(0.975, 9.0) - 2.262).abs() < 1e-3);
    assert!((t_quantile(0.995, 4.0) - 4.604).abs() < 1e-3);
    assert!(t_quantile(0.975, 0.0).is_nan());
}

#[test]
fn test_confidence_interval_half_width() {
    // sd = sqrt(2.5), t(0.975, 4) = 2.7764
    let stats = StatsAggregator::default().summarize(16, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(stats.mean, 3.0);
    assert!((stats.std_dev - 2.5f64.sqrt()).abs() < 1e-12);
    assert!((stats.ci_half_width - 1.9632).abs() < 1e-3);

    let (low, high) = stats.interval();
    assert!((high - low - 2.0 * stats.ci_half_width).abs() < 1e-12);
}

#[test]
fn test_higher_confidence_widens_interval() {
    let times = [0.9, 1.1, 1.0, 1.2, 0.8];
    let narrow = StatsAggregator::new(0.90).summarize(32, &times);
    let wide = StatsAggregator::new(0.99).summarize(32, &times);
    assert!(wide.ci_half_width > narrow.ci_half_width);
    assert_eq!(wide.mean, narrow.mean);
}

#[test]
fn test_aggregate_timings_groups_by_size() {
    let samples = [
        TimingSample { size: 4, elapsed_seconds: 0.002 },
        TimingSample { size: 2, elapsed_seconds: 0.001 },
        TimingSample { size: 4, elapsed_seconds: 0.004 },
    ];
    let stats = StatsAggregator::default().aggregate_timings(&samples);

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].size, 2);
    assert_eq!(stats[0].samples, 1);
    assert_eq!(stats[1].size, 4);
    assert!((stats[1].mean - 0.003).abs() < 1e-12);
    assert!(stats[1].all_correct);
}

#[test]
fn test_aggregate_log_keeps_implementation_order() {
    let mut builder = TrialLogBuilder::new();
    builder.extend(records(16, &[0.4, 0.5], true));
    builder.record(TrialRecord::completed("omp", 16, 0, 0.1, true));
    builder.extend(records(8, &[0.1], true));
    builder.mark_skipped("mpi", "no timing file");
    let log = builder.seal();

    let all = StatsAggregator::default().aggregate_log(&log);
    let ids: Vec<&str> = all.iter().map(|s| s.implementation_id.as_str()).collect();
    assert_eq!(ids, vec!["single", "omp", "mpi"]);

    let single = &all[0];
    assert_eq!(single.stats.iter().map(|s| s.size).collect::<Vec<_>>(), vec![8, 16]);
    assert!(single.all_correct());
    assert!(single.get(16).is_some());

    assert_eq!(all[2].skipped.as_deref(), Some("no timing file"));
    assert!(all[2].stats.is_empty());
    assert!(!all[2].all_correct());
}
