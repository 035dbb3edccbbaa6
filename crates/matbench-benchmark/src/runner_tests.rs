//! Tests for the per-trial and batch runners.
//!
//! These drive small shell scripts, so they only run on Unix.

#![cfg(unix)]

use super::*;
use matbench_core::codec;
use matbench_test::{BatchScript, Behavior};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn settings(trials: usize) -> TrialSettings {
    TrialSettings::default()
        .with_trial_count(trials)
        .with_timeout(Duration::from_secs(30))
}

fn runner(behavior: Behavior, dir: &Path, trials: usize) -> TrialRunner {
    let fake = behavior.write(dir, "fake");
    TrialRunner::new(&fake.implementation("fake", dir), settings(trials)).unwrap()
}

#[test]
fn test_correct_executable_passes() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::Multiply, dir.path(), 2);
    let mut rng = StdRng::seed_from_u64(1);

    let records = runner.run_size(4, &mut rng).unwrap();

    assert_eq!(records.len(), 2);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.trial_index, i);
        assert_eq!(record.size, 4);
        assert_eq!(record.outcome, TrialOutcome::Passed);
        assert!(record.correct);
        assert!(record.elapsed_seconds > 0.0);
    }
}

#[test]
fn test_exchange_files_follow_convention() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::Multiply, dir.path(), 1);
    let mut rng = StdRng::seed_from_u64(2);
    runner.run_trial(3, 0, &mut rng).unwrap();

    let paths = runner.paths();
    let a = std::fs::read_to_string(&paths.matrix_a).unwrap();
    assert!(a.starts_with("3 3\n"));
    assert!(codec::detect_header(&a));

    let result = std::fs::read_to_string(&paths.result).unwrap();
    assert_eq!(result.lines().count(), 3);
    assert!(!codec::detect_header(&result));
}

#[test]
fn test_failure_at_one_size_does_not_stop_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::FailAtSize { size: 8, code: 3 }, dir.path(), 2);
    let mut rng = StdRng::seed_from_u64(3);
    let mut builder = TrialLogBuilder::new();

    runner.run_sweep(&[4, 8, 16], &mut rng, &mut builder).unwrap();
    let log = builder.seal();

    for record in log.get("fake", 8).unwrap() {
        assert_eq!(
            record.outcome,
            TrialOutcome::ExecutableFailure { code: Some(3) }
        );
        assert!(record.elapsed_seconds.is_nan());
        assert!(!record.correct);
    }
    assert!(log
        .get("fake", 16)
        .unwrap()
        .iter()
        .all(|r| r.outcome == TrialOutcome::Passed));
    assert_eq!(log.failure_count("fake"), 2);
    assert_eq!(log.len(), 6);
}

#[test]
fn test_hanging_executable_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Behavior::Hang.write(dir.path(), "hang");
    let settings = settings(1).with_timeout(Duration::from_millis(300));
    let runner = TrialRunner::new(&fake.implementation("hang", dir.path()), settings).unwrap();
    let mut rng = StdRng::seed_from_u64(4);

    let record = runner.run_trial(2, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::Timeout);
    assert!(record.elapsed_seconds.is_nan());
}

#[test]
fn test_missing_result_is_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::NoOutput, dir.path(), 1);
    let mut rng = StdRng::seed_from_u64(5);

    let record = runner.run_trial(2, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::MissingArtifact);
    assert!(!record.correct);
}

#[test]
fn test_stale_result_is_removed_before_run() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::NoOutput, dir.path(), 1);
    std::fs::write(&runner.paths().result, "1 2\n3 4\n").unwrap();
    let mut rng = StdRng::seed_from_u64(6);

    let record = runner.run_trial(2, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::MissingArtifact);
    assert!(!runner.paths().result.exists());
}

#[test]
fn test_wrong_result_is_incorrect_but_timed() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::WrongResult, dir.path(), 1);
    let mut rng = StdRng::seed_from_u64(7);

    let record = runner.run_trial(4, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::Incorrect);
    assert!(!record.correct);
    assert!(record.elapsed_seconds.is_finite());
}

#[test]
fn test_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::Fail(2), dir.path(), 1);
    let mut rng = StdRng::seed_from_u64(8);

    let record = runner.run_trial(2, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::ExecutableFailure { code: Some(2) });
}

#[test]
fn test_unknown_program_is_executable_failure() {
    let dir = tempfile::tempdir().unwrap();
    let implementation =
        ImplementationConfig::new("ghost", "./not-built-yet").with_working_dir(dir.path());
    let runner = TrialRunner::new(&implementation, settings(1)).unwrap();
    let mut rng = StdRng::seed_from_u64(9);

    let record = runner.run_trial(2, 0, &mut rng).unwrap();
    assert_eq!(record.outcome, TrialOutcome::ExecutableFailure { code: None });
}

#[test]
fn test_warmups_are_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Behavior::Multiply.write(dir.path(), "fake");
    let settings = settings(1).with_warmup_count(2);
    let runner = TrialRunner::new(&fake.implementation("fake", dir.path()), settings).unwrap();
    let mut rng = StdRng::seed_from_u64(10);

    let records = runner.run_size(2, &mut rng).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trial_index, 0);
}

#[test]
fn test_creates_missing_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("work").join("single");
    let implementation = ImplementationConfig::new("single", "sh").with_working_dir(&nested);

    let runner = TrialRunner::new(&implementation, settings(1)).unwrap();
    assert!(nested.is_dir());
    assert!(runner.working_dir().is_absolute());
}

#[test]
fn test_batch_runner_reads_timings_and_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let fake = BatchScript::new("omp", &[2, 4], 3).write(dir.path(), "omp");
    let runner =
        BatchRunner::new(&fake.batch_implementation("omp", dir.path()), settings(3)).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    let records = runner.run(&[2, 4], &mut rng).unwrap();

    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| r.outcome == TrialOutcome::Passed));
    let times: Vec<f64> = records
        .iter()
        .filter(|r| r.size == 4)
        .map(|r| r.elapsed_seconds)
        .collect();
    assert_eq!(times, vec![0.001, 0.002, 0.003]);

    let a = std::fs::read_to_string(runner.data_dir().join("matrixA_4.txt")).unwrap();
    assert_eq!(a.lines().count(), 4);
    assert!(!codec::detect_header(&a));
}

#[test]
fn test_batch_runner_missing_timing_file() {
    let dir = tempfile::tempdir().unwrap();
    let fake = BatchScript::new("mpi", &[2], 1)
        .without_timings()
        .write(dir.path(), "mpi");
    let runner =
        BatchRunner::new(&fake.batch_implementation("mpi", dir.path()), settings(1)).unwrap();
    let mut rng = StdRng::seed_from_u64(12);

    match runner.run(&[2], &mut rng) {
        Err(BenchError::MissingArtifact { path }) => assert_eq!(path, runner.timing_file()),
        other => panic!("expected missing artifact, got {:?}", other),
    }
}

#[test]
fn test_batch_runner_missing_results_keep_timings() {
    let dir = tempfile::tempdir().unwrap();
    let fake = BatchScript::new("omp", &[2], 2)
        .without_results()
        .write(dir.path(), "omp");
    let runner =
        BatchRunner::new(&fake.batch_implementation("omp", dir.path()), settings(2)).unwrap();
    let mut rng = StdRng::seed_from_u64(13);

    let records = runner.run(&[2], &mut rng).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.outcome == TrialOutcome::MissingArtifact && r.elapsed_seconds > 0.0));
}

#[test]
fn test_batch_runner_failed_process() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Behavior::Fail(4).write(dir.path(), "broken");
    let runner =
        BatchRunner::new(&fake.batch_implementation("broken", dir.path()), settings(1)).unwrap();
    let mut rng = StdRng::seed_from_u64(14);

    let records = runner.run(&[2, 4, 8], &mut rng).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .all(|r| r.outcome == TrialOutcome::ExecutableFailure { code: Some(4) }));
}

#[test]
fn test_verify_files() {
    let dir = tempfile::tempdir().unwrap();
    let convention = FileConvention::per_trial();
    let mut rng = StdRng::seed_from_u64(15);
    let paths = write_operand_files(
        dir.path(),
        (3, 4),
        (4, 2),
        ValueRange::default(),
        &convention,
        &mut rng,
    )
    .unwrap();

    // The result starts out empty.
    assert!(verify_files(&paths, &convention, CompareMode::Exact)
        .unwrap()
        .is_some());
    std::fs::remove_file(&paths.result).unwrap();
    assert!(matches!(
        verify_files(&paths, &convention, CompareMode::Exact),
        Err(BenchError::MissingArtifact { .. })
    ));

    let a = codec::load(&paths.matrix_a, true).unwrap();
    let b = codec::load(&paths.matrix_b, true).unwrap();
    let product = reference_product(&a, &b).unwrap();
    codec::save(&product, &paths.result, false).unwrap();
    assert_eq!(verify_files(&paths, &convention, CompareMode::Exact).unwrap(), None);

    let mut wrong = product.clone();
    wrong.set(2, 1, product.get(2, 1) + 1);
    codec::save(&wrong, &paths.result, false).unwrap();
    let detail = verify_files(&paths, &convention, CompareMode::Exact)
        .unwrap()
        .unwrap();
    assert!(detail.contains("(2, 1)"));
}
