use parsegate::MetricsSnapshot;
use std::time::Duration;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Outcome of one input line.
pub struct LineReport {
    pub input: String,
    /// `Ok(None)` when the engine found no parse.
    pub outcome: Result<Option<String>, String>,
    pub elapsed: Duration,
}

/// Everything `parsegate parse` prints.
pub struct RunReport {
    pub format: String,
    pub lines: Vec<LineReport>,
    pub build: Duration,
    pub total: Duration,
    pub metrics: MetricsSnapshot,
}

pub fn print_run(run: &RunReport, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("⚙  Session: {} ({} line(s))", run.format, run.lines.len()), ansi::CYAN))
    );

    println!("\n{}", palette.paint("━━━ Results ━━━", ansi::GRAY));
    for (idx, line) in run.lines.iter().enumerate() {
        print_line(idx, line, &palette);
    }

    println!("\n{}", palette.paint("━━━ Counters ━━━", ansi::GRAY));
    println!(
        "  parsed: {}  │  skipped: {}  │  failed calls: {}",
        palette.paint(run.metrics.items_parsed.to_string(), ansi::GREEN),
        palette.paint(run.metrics.items_skipped.to_string(), ansi::YELLOW),
        palette.paint(run.metrics.infer_failures.to_string(), ansi::RED),
    );

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Session build: {}",
        palette.paint(format!("{:?}", run.total), ansi::GREEN),
        palette.dim(format!("{:?}", run.build)),
    );
    println!();
}

fn print_line(idx: usize, line: &LineReport, palette: &ansi::Palette) {
    println!(
        "  {} {} {}",
        palette.paint(format!("[{idx}]"), ansi::GRAY),
        palette.bold(&line.input),
        palette.dim(format!("({:?})", line.elapsed))
    );
    match &line.outcome {
        Ok(Some(output)) => println!("      {}", palette.paint(output, ansi::BLUE)),
        Ok(None) => println!("      {}", palette.dim("no parse")),
        Err(err) => println!("      {}", palette.paint(format!("✗ {err}"), ansi::RED)),
    }
}
