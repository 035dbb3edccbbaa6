//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "matbench",
    version,
    about = "Benchmark external matrix multiplication executables"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build, run every implementation over the size sweep, and report.
    Run(RunArgs),
    /// Write a random operand pair for a manual run.
    Generate(GenerateArgs),
    /// Check a result file against the product of its operands.
    Verify(VerifyArgs),
    /// Summarize and plot an existing timing-results file.
    Aggregate(AggregateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Benchmark configuration (TOML or YAML).
    #[arg(short, long, default_value = "matbench.toml")]
    pub config: PathBuf,

    /// Exit with status 1 if any implementation produced a wrong result.
    #[arg(long)]
    pub strict: bool,

    /// Override the size sweep, e.g. `--sizes 64,128,256`.
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<usize>>,

    /// Override the number of trials per size.
    #[arg(long)]
    pub trials: Option<usize>,

    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the plot output path.
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Rows of A.
    #[arg(long, default_value_t = 3)]
    pub rows_a: usize,

    /// Columns of A; coerced to the rows of B if they differ.
    #[arg(long, default_value_t = 4)]
    pub cols_a: usize,

    /// Rows of B.
    #[arg(long, default_value_t = 4)]
    pub rows_b: usize,

    /// Columns of B.
    #[arg(long, default_value_t = 3)]
    pub cols_b: usize,

    /// Smallest generated value.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub low: i64,

    /// One past the largest generated value.
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub high: i64,

    /// Directory to write `matrixA.txt` and `matrixB.txt` into.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Write operands without the dimension header.
    #[arg(long)]
    pub headerless: bool,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Directory holding `matrixA.txt`, `matrixB.txt` and `resultMatrix.txt`.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Comparison policy for the result.
    #[arg(long, value_enum, default_value_t = Mode::Tolerant)]
    pub mode: Mode,

    /// Operands are written without the dimension header.
    #[arg(long)]
    pub headerless: bool,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Timing-results file with `"<size> <seconds>"` lines.
    #[arg(short, long)]
    pub timing_file: PathBuf,

    /// Legend label for the series.
    #[arg(long)]
    pub label: Option<String>,

    /// Write a log-log plot here.
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Write aggregated CSV here.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Two-sided confidence level.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Exact,
    Tolerant,
}
