//! `matbench` command-line driver.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use matbench_benchmark::{
    load_timings, verify_files, write_operand_files, BenchError, Benchmark, BenchmarkReport,
    CsvExporter, ExchangePaths, Result, StatsAggregator, SvgPlot,
};
use matbench_config::{BenchConfig, ConfigError};
use matbench_core::{CompareMode, FileConvention, ValueRange};
use owo_colors::OwoColorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use cli::{AggregateArgs, Cli, Command, GenerateArgs, Mode, RunArgs, VerifyArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    matbench_console::init();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate(args),
        Command::Verify(args) => verify(args),
        Command::Aggregate(args) => aggregate(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let mut config = BenchConfig::from_file(&args.config)?;
    if let Some(base) = args.config.parent() {
        let base = if base.as_os_str().is_empty() {
            Path::new(".")
        } else {
            base
        };
        config = config.rebase(base);
    }
    if let Some(sizes) = args.sizes {
        config = config.with_sizes(sizes);
    }
    if let Some(trials) = args.trials {
        config = config.with_trial_count(trials);
    }
    if let Some(seed) = args.seed {
        config = config.with_random_seed(seed);
    }
    if let Some(plot) = args.plot {
        config.output.plot_path = plot;
    }

    let benchmark = Benchmark::new(config)?;
    let report = benchmark.run()?;

    for line in report.summary_lines() {
        println!("{}", line);
    }
    report.write_outputs(&benchmark.config().output)?;

    if args.strict && !report.all_correct() {
        eprintln!("{}", "some implementations produced incorrect results".red());
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn convention(headerless: bool) -> FileConvention {
    if headerless {
        FileConvention::batch()
    } else {
        FileConvention::per_trial()
    }
}

fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let range = ValueRange::new(args.low, args.high)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    write_operand_files(
        &args.dir,
        (args.rows_a, args.cols_a),
        (args.rows_b, args.cols_b),
        range,
        &convention(args.headerless),
        &mut rng,
    )?;
    println!("Files generated with correct dimensions for multiplication.");
    Ok(ExitCode::SUCCESS)
}

fn verify(args: VerifyArgs) -> Result<ExitCode> {
    let mode = match args.mode {
        Mode::Exact => CompareMode::Exact,
        Mode::Tolerant => CompareMode::tolerant(),
    };
    let paths = ExchangePaths::per_trial(&args.dir);
    match verify_files(&paths, &convention(args.headerless), mode)? {
        None => {
            println!("{}", "Result is correct.".green());
            Ok(ExitCode::SUCCESS)
        }
        Some(detail) => {
            println!("{}", "Result is incorrect.".red());
            println!("{}", detail);
            Ok(ExitCode::from(1))
        }
    }
}

fn aggregate(args: AggregateArgs) -> Result<ExitCode> {
    if !(args.confidence > 0.0 && args.confidence < 1.0) {
        return Err(BenchError::Config(ConfigError::Invalid(format!(
            "confidence must be in (0, 1), got {}",
            args.confidence
        ))));
    }
    let samples = load_timings(&args.timing_file)?;
    let label = args.label.unwrap_or_else(|| {
        args.timing_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "timings".to_string())
    });
    let report = BenchmarkReport::from_timings(
        label.clone(),
        label,
        &samples,
        StatsAggregator::new(args.confidence),
    );

    for line in report.summary_lines() {
        println!("{}", line);
    }
    if let Some(path) = &args.plot {
        SvgPlot::new(&report.title)
            .to_file(&report, path)
            .map_err(|e| BenchError::Io {
                path: path.clone(),
                source: e,
            })?;
        info!(event = "report_written", path = %path.display());
    }
    if let Some(path) = &args.csv {
        CsvExporter::to_file(&report, path).map_err(|e| BenchError::Io {
            path: path.clone(),
            source: e,
        })?;
        info!(event = "report_written", path = %path.display());
    }
    Ok(ExitCode::SUCCESS)
}
