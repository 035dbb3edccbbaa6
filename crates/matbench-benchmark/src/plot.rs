//! Log-log plot of mean time against matrix size, with confidence-interval
//! error bars, rendered as standalone SVG.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::report::BenchmarkReport;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// Closed range of decades, `[lo, hi]` in log10 units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Decades {
    lo: i32,
    hi: i32,
}

impl Decades {
    fn covering(values: impl Iterator<Item = f64>, fallback: (i32, i32)) -> Self {
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values.filter(|v| v.is_finite() && *v > 0.0) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            return Self {
                lo: fallback.0,
                hi: fallback.1,
            };
        }
        let lo = min.log10().floor() as i32;
        let mut hi = max.log10().ceil() as i32;
        if hi <= lo {
            hi = lo + 1;
        }
        Self { lo, hi }
    }

    /// Position of `value` as a fraction of the axis, 0 at `lo`.
    fn fraction(&self, value: f64) -> f64 {
        (value.log10() - self.lo as f64) / (self.hi - self.lo) as f64
    }

    fn floor_value(&self) -> f64 {
        10f64.powi(self.lo)
    }
}

fn decade_label(k: i32) -> String {
    if (0..=4).contains(&k) {
        10u32.pow(k as u32).to_string()
    } else {
        format!("1e{}", k)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG renderer for benchmark reports.
///
/// Each implementation is one colored series. Points whose trials were not
/// all correct are drawn hollow, and sizes without any successful timing
/// break the line.
///
/// # Example
///
/// ```
/// use matbench_benchmark::{BenchmarkReport, StatsAggregator, SvgPlot, TrialLogBuilder, TrialRecord};
///
/// let mut builder = TrialLogBuilder::new();
/// builder.record(TrialRecord::completed("single", 8, 0, 0.01, true));
/// builder.record(TrialRecord::completed("single", 64, 0, 0.2, true));
/// let report = BenchmarkReport::from_log("Matmul", &builder.seal(), StatsAggregator::default());
///
/// let svg = SvgPlot::new("Matmul").render(&report);
/// assert!(svg.starts_with("<svg"));
/// assert!(svg.contains("<polyline"));
/// assert!(svg.contains(">single<"));
/// ```
#[derive(Debug, Clone)]
pub struct SvgPlot {
    title: String,
    width: f64,
    height: f64,
}

impl SvgPlot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: 800.0,
            height: 560.0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = f64::from(width.max(200));
        self.height = f64::from(height.max(160));
        self
    }

    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    /// Renders the report as an SVG document.
    pub fn render(&self, report: &BenchmarkReport) -> String {
        let stats = || report.series.iter().flat_map(|s| s.stats.iter());
        let x_axis = Decades::covering(stats().map(|s| s.size as f64), (0, 3));
        let y_axis = Decades::covering(
            stats().filter(|s| s.has_mean()).flat_map(|s| {
                let (low, high) = s.interval();
                [s.mean, low, high]
            }),
            (-3, 0),
        );

        let x = |size: f64| MARGIN_LEFT + x_axis.fraction(size) * self.plot_width();
        let y = |secs: f64| {
            let secs = secs.max(y_axis.floor_value());
            MARGIN_TOP + (1.0 - y_axis.fraction(secs)) * self.plot_height()
        };

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
            w = self.width,
            h = self.height
        )
        .unwrap();
        writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#).unwrap();
        writeln!(
            out,
            r#"<text x="{:.1}" y="28" text-anchor="middle" font-size="16">{}</text>"#,
            self.width / 2.0,
            escape(&self.title)
        )
        .unwrap();

        self.render_axes(&mut out, x_axis, y_axis);

        for (index, series) in report.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            writeln!(
                out,
                r#"<g class="series" data-implementation="{}">"#,
                escape(&series.implementation_id)
            )
            .unwrap();

            let mut segment: Vec<(f64, f64)> = Vec::new();
            let mut segments = Vec::new();
            for s in &series.stats {
                if s.has_mean() && s.mean > 0.0 {
                    segment.push((x(s.size as f64), y(s.mean)));
                } else if !segment.is_empty() {
                    segments.push(std::mem::take(&mut segment));
                }
            }
            if !segment.is_empty() {
                segments.push(segment);
            }
            for points in segments.iter().filter(|p| p.len() > 1) {
                let coords: Vec<String> =
                    points.iter().map(|(px, py)| format!("{:.1},{:.1}", px, py)).collect();
                writeln!(
                    out,
                    r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                    color,
                    coords.join(" ")
                )
                .unwrap();
            }

            for s in series.stats.iter().filter(|s| s.has_mean() && s.mean > 0.0) {
                let px = x(s.size as f64);
                let (low, high) = s.interval();
                if s.ci_half_width > 0.0 {
                    let (top, bottom) = (y(high), y(low));
                    writeln!(
                        out,
                        r#"<path stroke="{c}" d="M{x:.1},{t:.1}V{b:.1}M{l:.1},{t:.1}H{r:.1}M{l:.1},{b:.1}H{r:.1}"/>"#,
                        c = color,
                        x = px,
                        t = top,
                        b = bottom,
                        l = px - 4.0,
                        r = px + 4.0,
                    )
                    .unwrap();
                }
                let fill = if s.all_correct { color } else { "white" };
                writeln!(
                    out,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="3.5" fill="{}" stroke="{}"><title>n={} mean={:.6}s ±{:.6}s</title></circle>"#,
                    px,
                    y(s.mean),
                    fill,
                    color,
                    s.size,
                    s.mean,
                    s.ci_half_width
                )
                .unwrap();
            }
            writeln!(out, "</g>").unwrap();
        }

        self.render_legend(&mut out, report);
        writeln!(out, "</svg>").unwrap();
        out
    }

    fn render_axes(&self, out: &mut String, x_axis: Decades, y_axis: Decades) {
        let (left, top) = (MARGIN_LEFT, MARGIN_TOP);
        let (right, bottom) = (left + self.plot_width(), top + self.plot_height());

        writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#333"/>"##,
            left,
            top,
            self.plot_width(),
            self.plot_height()
        )
        .unwrap();

        let x_span = (x_axis.hi - x_axis.lo) as f64;
        for k in x_axis.lo..=x_axis.hi {
            let px = left + (k - x_axis.lo) as f64 / x_span * self.plot_width();
            writeln!(
                out,
                r##"<line x1="{px:.1}" y1="{top:.1}" x2="{px:.1}" y2="{bottom:.1}" stroke="#ddd"/><text x="{px:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"##,
                ly = bottom + 18.0,
                label = decade_label(k),
            )
            .unwrap();
        }

        let y_span = (y_axis.hi - y_axis.lo) as f64;
        for k in y_axis.lo..=y_axis.hi {
            let py = bottom - (k - y_axis.lo) as f64 / y_span * self.plot_height();
            writeln!(
                out,
                r##"<line x1="{left:.1}" y1="{py:.1}" x2="{right:.1}" y2="{py:.1}" stroke="#ddd"/><text x="{lx:.1}" y="{ty:.1}" text-anchor="end">{label}</text>"##,
                lx = left - 8.0,
                ty = py + 4.0,
                label = decade_label(k),
            )
            .unwrap();
        }

        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Matrix Size</text>"#,
            left + self.plot_width() / 2.0,
            self.height - 18.0
        )
        .unwrap();
        writeln!(
            out,
            r#"<text x="20" y="{:.1}" text-anchor="middle" transform="rotate(-90 20 {:.1})">Time (seconds)</text>"#,
            top + self.plot_height() / 2.0,
            top + self.plot_height() / 2.0
        )
        .unwrap();
    }

    fn render_legend(&self, out: &mut String, report: &BenchmarkReport) {
        let x = MARGIN_LEFT + 12.0;
        for (index, series) in report.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            let y = MARGIN_TOP + 16.0 + index as f64 * 18.0;
            let note = if series.skipped.is_some() {
                " (skipped)"
            } else if !series.all_correct() {
                " (incorrect results)"
            } else {
                ""
            };
            writeln!(
                out,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-width="2"/>"#,
                x,
                x + 20.0,
                color,
                y = y,
            )
            .unwrap();
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
                x + 26.0,
                y + 4.0,
                escape(&series.label)
            )
            .unwrap();
            if !note.is_empty() {
                writeln!(
                    out,
                    r#"<text x="{:.1}" y="{:.1}" fill="{}">{}</text>"#,
                    x + 26.0 + 7.0 * series.label.chars().count() as f64,
                    y + 4.0,
                    color,
                    note
                )
                .unwrap();
            }
        }
    }

    /// Renders the report and writes it to `path`.
    pub fn to_file(&self, report: &BenchmarkReport, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render(report))
    }
}

#[cfg(test)]
#[path = "plot_tests.rs"]
mod tests;
