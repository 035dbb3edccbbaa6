//! Colorful console output for benchmark runs.
//!
//! Provides a custom `tracing` layer that formats harness events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (build, sweep start/end, per-size summaries)
//! - **WARN**: Failed trials, missing artifacts, coerced dimensions
//! - **DEBUG**: Individual trial timings

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes the console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the banner and sets up tracing with `matbench=info` unless
/// `RUST_LOG` says otherwise.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let filter = EnvFilter::builder()
            .with_default_directive("matbench=info".parse().unwrap())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(BenchConsoleLayer)
            .try_init();
    });
}

// Returns elapsed time since init.
fn elapsed_secs() -> f64 {
    EPOCH.get().map_or(0.0, |epoch| epoch.elapsed().as_secs_f64())
}

fn print_banner() {
    let banner = r#"
                 _   _                     _
 _ __ ___   __ _| |_| |__   ___ _ __   ___| |__
| '_ ` _ \ / _` | __| '_ \ / _ \ '_ \ / __| '_ \
| | | | | | (_| | |_| |_) |  __/ | | | (__| | | |
|_| |_| |_|\__,_|\__|_.__/ \___|_| |_|\___|_| |_|
"#;

    let version_line = format!(
        "          v{} - Matrix Multiplication Benchmark Harness\n",
        VERSION
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats harness events with colors.
pub struct BenchConsoleLayer;

impl<S: Subscriber> Layer<S> for BenchConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        // Accept events from harness crates only
        if !metadata.target().starts_with("matbench") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    implementation: Option<String>,
    command: Option<String>,
    outcome: Option<String>,
    detail: Option<String>,
    path: Option<String>,
    size: Option<u64>,
    trial: Option<u64>,
    trials: Option<u64>,
    sizes: Option<u64>,
    failures: Option<u64>,
    duration_ms: Option<u64>,
    elapsed: Option<f64>,
    mean: Option<f64>,
    ci: Option<f64>,
    correct: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "message" => self.message = Some(s),
            "implementation" => self.implementation = Some(s),
            "command" => self.command = Some(s),
            "outcome" => self.outcome = Some(s),
            "detail" => self.detail = Some(s),
            "path" => self.path = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "size" => self.size = Some(value),
            "trial" => self.trial = Some(value),
            "trials" => self.trials = Some(value),
            "sizes" => self.sizes = Some(value),
            "failures" => self.failures = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "elapsed" => self.elapsed = Some(value),
            "mean" => self.mean = Some(value),
            "ci" => self.ci = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "correct" {
            self.correct = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_debug(field, &value);
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "build_start" => format_build_start(v),
        "build_end" => format_build_end(v),
        "sweep_start" => format_sweep_start(v),
        "sweep_end" => format_sweep_end(v),
        "trial_end" => format_trial_end(v, level),
        "trial_failed" => format_trial_failed(v),
        "size_summary" => format_size_summary(v),
        "report_written" => format_report_written(v),
        _ => format_plain(v, level),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn implementation(v: &EventVisitor) -> &str {
    v.implementation.as_deref().unwrap_or("?")
}

fn format_build_start(v: &EventVisitor) -> String {
    format!(
        "{} {} Building │ {}",
        format_elapsed(),
        "⚙".bright_blue(),
        v.command.as_deref().unwrap_or("").white().bold()
    )
}

fn format_build_end(v: &EventVisitor) -> String {
    format!(
        "{} {} Build finished │ {}",
        format_elapsed(),
        "✓".bright_green(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow()
    )
}

fn format_sweep_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} │ {} sizes │ {} trials/size",
        format_elapsed(),
        "▶".bright_green().bold(),
        implementation(v).white().bold(),
        v.sizes.unwrap_or(0).to_formatted_string(&Locale::en).bright_yellow(),
        v.trials.unwrap_or(0).to_formatted_string(&Locale::en).bright_yellow(),
    )
}

fn format_sweep_end(v: &EventVisitor) -> String {
    let failures = v.failures.unwrap_or(0);
    let failures_text = failures.to_formatted_string(&Locale::en);
    let failures = if failures == 0 {
        failures_text.bright_green().to_string()
    } else {
        failures_text.bright_red().bold().to_string()
    };
    format!(
        "{} {} {} done │ {} failed trials",
        format_elapsed(),
        "■".bright_cyan().bold(),
        implementation(v).white().bold(),
        failures
    )
}

fn format_trial_end(v: &EventVisitor, level: Level) -> String {
    if level != Level::DEBUG && level != Level::TRACE {
        return String::new();
    }
    format!(
        "{} {} {} n={:<5} #{:<4} │ {}",
        format_elapsed(),
        "·".bright_black(),
        implementation(v).bright_black(),
        v.size.unwrap_or(0),
        v.trial.unwrap_or(0),
        format_seconds(v.elapsed.unwrap_or(f64::NAN)).bright_black()
    )
}

fn format_trial_failed(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        implementation(v).white().bold()
    );
    // Batch failures carry no trial index, and whole-run failures no size.
    if let Some(size) = v.size {
        output.push_str(&format!(" n={}", size));
    }
    if let Some(trial) = v.trial {
        output.push_str(&format!(" #{}", trial));
    }
    output.push_str(&format!(
        " │ {}",
        v.outcome.as_deref().unwrap_or("failed").bright_red()
    ));
    if let Some(detail) = &v.detail {
        output.push_str(&format!(" │ {}", detail.bright_black()));
    }
    output
}

fn format_size_summary(v: &EventVisitor) -> String {
    let correct = v.correct.unwrap_or(false);
    let status = if correct {
        "Correct: true".bright_green().to_string()
    } else {
        "Correct: false".bright_red().bold().to_string()
    };
    let mut output = format!(
        "{} {} {} │ size {:>5} │ mean {} ± {} │ {}",
        format_elapsed(),
        "◆".bright_magenta(),
        implementation(v).white().bold(),
        v.size.unwrap_or(0).to_formatted_string(&Locale::en),
        format_seconds(v.mean.unwrap_or(f64::NAN)).bright_yellow(),
        format_seconds(v.ci.unwrap_or(0.0)).yellow(),
        status
    );
    if let Some(failures) = v.failures.filter(|&f| f > 0) {
        output.push_str(&format!(
            " │ {} of {} trials failed",
            failures.to_formatted_string(&Locale::en).bright_red(),
            v.trials.unwrap_or(failures).to_formatted_string(&Locale::en)
        ));
    }
    output
}

fn format_report_written(v: &EventVisitor) -> String {
    format!(
        "{} {} Wrote {}",
        format_elapsed(),
        "✎".bright_cyan(),
        v.path.as_deref().unwrap_or("").white().bold()
    )
}

fn format_plain(v: &EventVisitor, level: Level) -> String {
    let Some(message) = v.message.as_deref() else {
        return String::new();
    };
    let tag = match level {
        Level::ERROR => "ERROR".bright_red().bold().to_string(),
        Level::WARN => " WARN".yellow().bold().to_string(),
        Level::INFO => " INFO".bright_blue().to_string(),
        _ => "DEBUG".bright_black().to_string(),
    };
    format!("{} {} {}", format_elapsed(), tag, message)
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn format_seconds(secs: f64) -> String {
    if !secs.is_finite() {
        "n/a".to_string()
    } else if secs < 1e-3 {
        format!("{:.1}µs", secs * 1e6)
    } else if secs < 1.0 {
        format!("{:.3}ms", secs * 1e3)
    } else {
        format!("{:.3}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds_units() {
        assert_eq!(format_seconds(2.5e-6), "2.5µs");
        assert_eq!(format_seconds(0.0125), "12.500ms");
        assert_eq!(format_seconds(3.0), "3.000s");
        assert_eq!(format_seconds(f64::NAN), "n/a");
    }

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_size_summary_marks_incorrect() {
        let v = EventVisitor {
            event: Some("size_summary".to_string()),
            implementation: Some("omp".to_string()),
            size: Some(64),
            mean: Some(1.0),
            ci: Some(0.0),
            correct: Some(false),
            failures: Some(2),
            trials: Some(10),
            ..Default::default()
        };
        let line = format_event(&v, Level::INFO);
        assert!(line.contains("Correct: false"));
        assert!(line.contains("trials failed"));
    }

    #[test]
    fn test_trial_failed_omits_missing_fields() {
        let batch = EventVisitor {
            event: Some("trial_failed".to_string()),
            implementation: Some("omp".to_string()),
            size: Some(64),
            outcome: Some("incorrect".to_string()),
            ..Default::default()
        };
        let line = format_event(&batch, Level::WARN);
        assert!(line.contains("n=64"));
        assert!(!line.contains('#'));

        let per_trial = EventVisitor {
            trial: Some(3),
            ..batch
        };
        assert!(format_event(&per_trial, Level::WARN).contains("n=64 #3"));

        let whole_run = EventVisitor {
            event: Some("trial_failed".to_string()),
            implementation: Some("mpi".to_string()),
            outcome: Some("timeout".to_string()),
            ..Default::default()
        };
        let line = format_event(&whole_run, Level::WARN);
        assert!(!line.contains("n="));
        assert!(line.contains("timeout"));
    }

    #[test]
    fn test_trial_end_hidden_at_info() {
        let v = EventVisitor {
            event: Some("trial_end".to_string()),
            ..Default::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
        assert!(!format_event(&v, Level::DEBUG).is_empty());
    }

    #[test]
    fn test_unknown_event_falls_back_to_message() {
        let v = EventVisitor {
            message: Some("operand shapes adjusted".to_string()),
            ..Default::default()
        };
        assert!(format_event(&v, Level::WARN).contains("operand shapes adjusted"));
        assert!(format_event(&EventVisitor::default(), Level::WARN).is_empty());
    }
}
