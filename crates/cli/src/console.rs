//! Report sink printing released records to stdout.

use std::io::Write;

use reelcrawl_core::report::{render_progress, render_record};
use reelcrawl_core::results::StatsSnapshot;
use reelcrawl_core::{AggregateRecord, ReportSink};

/// Prints one line per record and per progress update.
///
/// Stdout carries the report only; logs go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn write_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout (e.g. `| head`) must not abort the run.
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl ReportSink for ConsoleSink {
    fn record(&self, record: &AggregateRecord) {
        self.write_line(&render_record(record));
    }

    fn progress(&self, stats: &StatsSnapshot) {
        self.write_line(&render_progress(stats));
    }
}
