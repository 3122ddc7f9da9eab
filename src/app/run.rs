// GCLens - app/run.rs
//
// The batch analysis pipeline: read a log, parse it, run the analyzer
// or the leak detector, render in the requested format. Directory runs
// fan out over a rayon thread pool, one task per discovered log.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;

use crate::app::config::AppConfig;
use crate::app::discovery::discover_logs;
use crate::core::analyzer::analyze;
use crate::core::leak::detect_memory_leak;
use crate::core::parser::parse_content;
use crate::report::{export, text};
use crate::util::constants::LARGE_FILE_THRESHOLD;
use crate::util::error::{GcLensError, Result};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Sectioned plain-text report.
    Text,
    /// Pretty-printed JSON of the full report entity.
    Json,
    /// CSV of the parsed event table, one row per event.
    Csv,
}

/// One analysis run as requested on the command line.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Log file, or directory to scan for logs.
    pub path: PathBuf,

    /// Produce the leak detector report instead of the statistical one.
    pub leaks: bool,

    /// Requested output format.
    pub format: OutputFormat,
}

/// Entry point for one invocation. Dispatches on file vs directory and
/// writes every rendered report to `out`.
pub fn run<W: Write>(request: &RunRequest, config: &AppConfig, out: &mut W) -> Result<()> {
    let metadata = fs::metadata(&request.path).map_err(|e| GcLensError::Io {
        path: request.path.clone(),
        operation: "stat",
        source: e,
    })?;

    if metadata.is_dir() {
        run_directory(request, config, out)
    } else {
        let is_large = metadata.len() >= LARGE_FILE_THRESHOLD;
        let rendered = analyze_file(&request.path, is_large, request, config)?;
        write_report(out, &request.path, &rendered)
    }
}

/// Discover logs under a directory and analyse each independently.
///
/// Files are processed in parallel; a failure on one file is a warning,
/// not a run failure. Reports are written in discovery order.
fn run_directory<W: Write>(request: &RunRequest, config: &AppConfig, out: &mut W) -> Result<()> {
    let (logs, warnings) = discover_logs(&request.path, config)?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Discovery");
    }

    if logs.is_empty() {
        tracing::warn!(root = %request.path.display(), "No GC logs found");
        return Ok(());
    }

    tracing::info!(count = logs.len(), "Analysing discovered logs");

    let rendered: Vec<(PathBuf, Vec<u8>)> = logs
        .into_par_iter()
        .filter_map(
            |log| match analyze_file(&log.path, log.is_large, request, config) {
                Ok(bytes) => Some((log.path, bytes)),
                Err(e) => {
                    tracing::warn!(file = %log.path.display(), error = %e, "Skipping log");
                    None
                }
            },
        )
        .collect();

    for (path, bytes) in &rendered {
        write_report(out, path, bytes)?;
    }

    Ok(())
}

/// Analyse one log file and render the requested report into a buffer.
///
/// The buffer indirection keeps rendering off the shared output stream
/// so parallel directory runs never interleave reports.
fn analyze_file(
    path: &Path,
    is_large: bool,
    request: &RunRequest,
    config: &AppConfig,
) -> Result<Vec<u8>> {
    let content = read_log(path, is_large)?;
    let (timeline, parse_result) = parse_content(&content);

    tracing::info!(
        file = %path.display(),
        family = %timeline.family,
        events = parse_result.events_parsed,
        skipped = parse_result.errors.len(),
        "Parsed log"
    );
    for error in &parse_result.errors {
        tracing::debug!(file = %path.display(), diagnostic = %error, "Line skipped");
    }

    let mut buf: Vec<u8> = Vec::new();
    if request.leaks {
        let result = detect_memory_leak(&timeline, &config.analysis);
        match request.format {
            OutputFormat::Text => {
                text::render_leak(&result, path, timeline.events.len(), &mut buf).map_err(|e| {
                    GcLensError::Io {
                        path: path.to_path_buf(),
                        operation: "render report",
                        source: e,
                    }
                })?;
            }
            OutputFormat::Json => export::export_leak_json(&result, &mut buf, path)?,
            OutputFormat::Csv => {
                export::export_events_csv(&timeline, &mut buf, path)?;
            }
        }
    } else {
        let report = analyze(&timeline, &config.analysis, path);
        match request.format {
            OutputFormat::Text => {
                text::render_analysis(&report, &mut buf).map_err(|e| GcLensError::Io {
                    path: path.to_path_buf(),
                    operation: "render report",
                    source: e,
                })?;
            }
            OutputFormat::Json => export::export_report_json(&report, &mut buf, path)?,
            OutputFormat::Csv => {
                export::export_events_csv(&timeline, &mut buf, path)?;
            }
        }
    }

    Ok(buf)
}

fn write_report<W: Write>(out: &mut W, path: &Path, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes).map_err(|e| GcLensError::Io {
        path: path.to_path_buf(),
        operation: "write report",
        source: e,
    })
}

// =============================================================================
// File reading
// =============================================================================

/// Read the full content of a log as a UTF-8 string.
///
/// Large files are memory-mapped, which avoids copying the whole file
/// through a growing heap buffer. Small files use `fs::read_to_string`
/// with retries on transient errors.
fn read_log(path: &Path, is_large: bool) -> Result<String> {
    let content = if is_large {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    };

    content.map_err(|e| GcLensError::Io {
        path: path.to_path_buf(),
        operation: "read",
        source: e,
    })
}

/// Read using `memmap2` for large files (avoids allocating the full buffer).
fn read_large_file(path: &Path) -> io::Result<String> {
    let file = fs::File::open(path)?;
    // SAFETY: the file is mapped read-only and we never mutate the map.
    // External modification of the file during the map's lifetime could
    // produce undefined behaviour; we accept that documented risk for an
    // analyser reading already-written logs.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    std::str::from_utf8(&mmap)
        .map(|s| s.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Read a small file with transient-error retries.
fn read_small_file_with_retry(path: &Path) -> io::Result<String> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e), // Permanent error; do not retry.
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
