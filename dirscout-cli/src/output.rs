use colored::Colorize;
use dirscout::{MatchRecord, MatchSink, SearchError, SearchSummary};
use std::io::{self, Write};
use std::time::SystemTime;

/// Prints matches to stdout and access errors to stderr as they arrive
pub struct ConsoleSink {
    stats_only: bool,
}

impl ConsoleSink {
    pub fn new(stats_only: bool) -> Self {
        Self { stats_only }
    }
}

impl MatchSink for ConsoleSink {
    fn on_match(&self, record: &MatchRecord) {
        if self.stats_only {
            return;
        }
        // Lines from different inspectors must not interleave
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", format_match(record));
    }

    fn on_error(&self, error: &SearchError) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{} {}", "error:".red().bold(), error);
    }
}

pub fn format_match(record: &MatchRecord) -> String {
    let location = match record.line_number {
        Some(line) => format!(
            "{}({})",
            record.path.display().to_string().blue(),
            line.to_string().green()
        ),
        None => record.path.display().to_string().blue().to_string(),
    };
    format!(
        "{}: {}, {}",
        location,
        record.size,
        format_created(record.created)
    )
}

fn format_created(created: Option<SystemTime>) -> String {
    match created {
        Some(time) => humantime::format_rfc3339_seconds(time).to_string(),
        None => "unknown".to_string(),
    }
}

pub fn print_summary(summary: &SearchSummary) {
    println!("{} total matches.", summary.total_matches);
    println!(
        "The search took {:.3} seconds.",
        summary.elapsed.as_secs_f64()
    );
}
