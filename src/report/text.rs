// GCLens - report/text.rs
//
// Plain-text rendering of the analysis report and the leak verdict.
// Report layer: writes to any Write trait object, no I/O of its own.

use crate::core::model::{AnalysisReport, LeakResult};
use crate::util::constants::{
    BYTES_PER_MB, MAX_SUSPICIOUS_EVENTS_SHOWN, MS_PER_MINUTE, REPORT_RULE_WIDTH,
};
use chrono::Utc;
use std::io::{self, Write};
use std::path::Path;

// =============================================================================
// Section helpers
// =============================================================================

fn heavy_rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(REPORT_RULE_WIDTH))
}

fn light_rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(REPORT_RULE_WIDTH))
}

/// Centred section title between light rules.
fn section<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out)?;
    light_rule(out)?;
    writeln!(out, "{title:^REPORT_RULE_WIDTH$}")?;
    light_rule(out)
}

// =============================================================================
// Analysis report
// =============================================================================

/// Render the statistical analysis report as sectioned plain text.
///
/// Layout: banner, overview, statistics, pause percentiles, issues with
/// severity tags, numbered recommendations, completion footer.
pub fn render_analysis<W: Write>(report: &AnalysisReport<'_>, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    heavy_rule(out)?;
    writeln!(out, "{:^REPORT_RULE_WIDTH$}", "GC LOG ANALYSIS REPORT")?;
    heavy_rule(out)?;

    writeln!(out, "GC Type: {}", report.family.label())?;
    writeln!(
        out,
        "JVM Version: {}",
        report.jvm_version.as_deref().unwrap_or("Unknown")
    )?;
    writeln!(out, "Log File: {}", report.source.display())?;
    writeln!(
        out,
        "Analysis Period: {} events over {:.1} minutes",
        report.total_events,
        report.wall_ms / MS_PER_MINUTE
    )?;

    section(out, "STATISTICS")?;
    writeln!(out, "Total GC Events: {}", report.total_events)?;
    writeln!(out, "  - Minor GC: {}", report.minor_count)?;
    writeln!(out, "  - Major GC: {}", report.major_count)?;
    writeln!(
        out,
        "Total GC Time: {:.3} seconds",
        report.total_gc_time_ms / 1000.0
    )?;
    writeln!(out, "GC Time Percentage: {:.2}%", report.gc_time_percentage)?;
    writeln!(
        out,
        "Application Throughput: {:.2}%",
        report.throughput_percentage
    )?;

    writeln!(out)?;
    writeln!(out, "Pause Times:")?;
    writeln!(
        out,
        "  Longest Pause: {:.3} seconds",
        report.longest_pause_ms / 1000.0
    )?;
    writeln!(
        out,
        "  Average Pause: {:.3} seconds",
        report.average_pause_ms / 1000.0
    )?;
    writeln!(out, "  P50: {:.3} seconds", report.p50_ms / 1000.0)?;
    writeln!(out, "  P90: {:.3} seconds", report.p90_ms / 1000.0)?;
    writeln!(out, "  P95: {:.3} seconds", report.p95_ms / 1000.0)?;
    writeln!(out, "  P99: {:.3} seconds", report.p99_ms / 1000.0)?;

    writeln!(
        out,
        "Memory Efficiency: {:.1}%",
        report.average_memory_efficiency
    )?;

    if report.issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "No significant issues detected")?;
    } else {
        section(out, "ISSUES DETECTED")?;
        for issue in &report.issues {
            writeln!(out, "[{}] {}", issue.severity().label(), issue.description)?;
        }
    }

    if !report.recommendations.is_empty() {
        section(out, "RECOMMENDATIONS")?;
        for (i, rec) in report.recommendations.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, rec)?;
        }
    }

    writeln!(out)?;
    heavy_rule(out)?;
    writeln!(
        out,
        "Analysis completed at: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    heavy_rule(out)
}

// =============================================================================
// Leak report
// =============================================================================

/// Render the leak detector's verdict as sectioned plain text.
///
/// `total_events` is the full timeline event count, not the filtered
/// subset the detector scored (that figure is in the result itself).
pub fn render_leak<W: Write>(
    result: &LeakResult<'_>,
    source: &Path,
    total_events: usize,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    heavy_rule(out)?;
    writeln!(out, "{:^REPORT_RULE_WIDTH$}", "MEMORY LEAK DETECTION REPORT")?;
    heavy_rule(out)?;

    writeln!(out, "GC Log: {}", source.display())?;
    writeln!(out, "Total Events Analyzed: {total_events}")?;
    writeln!(
        out,
        "Analysis Date: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    section(out, "LEAK ANALYSIS RESULT")?;

    if result.detected {
        writeln!(out, "MEMORY LEAK DETECTED!")?;
        writeln!(out, "Confidence: {:.1}%", result.confidence * 100.0)?;
        if let Some(pattern) = result.pattern {
            writeln!(out, "Pattern Type: {pattern}")?;
        }
        writeln!(
            out,
            "Growth Rate: {:.2} MB/minute",
            result.growth_rate_bytes_per_min / BYTES_PER_MB as f64
        )?;
        writeln!(out, "Description: {}", result.description)?;

        if !result.suspicious_events.is_empty() {
            writeln!(out)?;
            writeln!(out, "Suspicious Events:")?;
            for event in result
                .suspicious_events
                .iter()
                .take(MAX_SUSPICIOUS_EVENTS_SHOWN)
            {
                writeln!(
                    out,
                    "  - [{:.3}s] Heap after GC: {:.1} MB",
                    event.timestamp_ms as f64 / 1000.0,
                    event.heap_after as f64 / BYTES_PER_MB as f64
                )?;
            }
        }
    } else {
        writeln!(out, "No memory leak detected")?;
        writeln!(out, "Confidence: {:.1}%", result.confidence * 100.0)?;
        writeln!(out, "Description: {}", result.description)?;
    }

    writeln!(out)?;
    heavy_rule(out)
}
