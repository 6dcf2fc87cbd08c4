//! Human-readable run reports

use crate::crawler::SourceReport;
use crate::model::RunSummary;
use std::io::{self, Write};

/// Prints one source report to stdout
pub fn print_report(report: &SourceReport) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Reporting is best effort; a closed stdout is not worth failing the run
    let _ = write_report(&mut out, report);
}

/// Writes a source report in a formatted manner
pub fn write_report<W: Write>(out: &mut W, report: &SourceReport) -> io::Result<()> {
    writeln!(out, "=== {} ===", report.source)?;
    write_summary(out, &report.summary)?;

    match &report.output_path {
        Some(path) => writeln!(out, "  Saved to: {}", path.display())?,
        None => writeln!(out, "  No products found, nothing saved")?,
    }
    writeln!(out)
}

fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "  Scraped {}/{} products in {:.1} seconds",
        summary.records.len(),
        summary.requested_count,
        summary.elapsed.as_secs_f64()
    )?;

    if summary.failed_count > 0 {
        writeln!(out, "  Failed: {}", summary.failed_count)?;
    }
    if summary.duplicates > 0 {
        writeln!(out, "  Duplicates dropped: {}", summary.duplicates)?;
    }
    if summary.discovery_failures > 0 {
        writeln!(out, "  Pages that could not be fetched: {}", summary.discovery_failures)?;
    }

    match summary.throughput() {
        Some(rate) => writeln!(out, "  Speed: {:.1} products/second", rate),
        None => writeln!(out, "  Speed: unknown"),
    }
}
