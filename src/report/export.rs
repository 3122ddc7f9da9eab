// GCLens - report/export.rs
//
// JSON and CSV export of analysis results and the parsed event table.
// Report layer: writes to any Write trait object.

use crate::core::model::{AnalysisReport, GcTimeline, LeakResult};
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Export the full analysis report as pretty-printed JSON.
///
/// `source` names the analysed log and is carried into error context only.
pub fn export_report_json<W: Write>(
    report: &AnalysisReport<'_>,
    writer: W,
    source: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report).map_err(|e| ExportError::Json {
        path: source.to_path_buf(),
        source: e,
    })
}

/// Export the leak detector's verdict as pretty-printed JSON.
pub fn export_leak_json<W: Write>(
    result: &LeakResult<'_>,
    writer: W,
    source: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, result).map_err(|e| ExportError::Json {
        path: source.to_path_buf(),
        source: e,
    })
}

/// Export the parsed event table to CSV, one row per event.
///
/// Writes: timestamp_ms, label, cause, duration_ms, heap before/after/
/// committed, young and old generation occupancy, and the two
/// classification flags. Returns the number of rows written.
pub fn export_events_csv<W: Write>(
    timeline: &GcTimeline,
    writer: W,
    source: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "timestamp_ms",
            "label",
            "cause",
            "duration_ms",
            "heap_before",
            "heap_after",
            "heap_committed",
            "young_before",
            "young_after",
            "old_before",
            "old_after",
            "is_major",
            "is_system",
        ])
        .map_err(|e| ExportError::Csv {
            path: source.to_path_buf(),
            source: e,
        })?;

    let mut count = 0;
    for event in &timeline.events {
        csv_writer
            .write_record([
                &event.timestamp_ms.to_string(),
                &event.label,
                &event.cause,
                &format!("{:.3}", event.duration_ms),
                &event.heap_before.to_string(),
                &event.heap_after.to_string(),
                &event.heap_committed.to_string(),
                &event.young_before.to_string(),
                &event.young_after.to_string(),
                &event.old_before.to_string(),
                &event.old_after.to_string(),
                &event.is_major.to_string(),
                &event.is_system.to_string(),
            ])
            .map_err(|e| ExportError::Csv {
                path: source.to_path_buf(),
                source: e,
            })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}
