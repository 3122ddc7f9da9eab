// GCLens - app/discovery.rs
//
// Recursive GC log discovery under a directory root. Uses `walkdir`
// for traversal and reads only file metadata (size, mtime); contents
// are read later by app::run.
//
// Per-file I/O errors are non-fatal and collected as warnings. The
// max_files limit is enforced against an absolute upper bound, and
// exclude patterns short-circuit directory descent via filter_entry so
// excluded subtrees are never traversed at all.

use crate::app::config::AppConfig;
use crate::util::constants;
use crate::util::error::DiscoveryError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// One GC log file accepted by discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredLog {
    /// Absolute or root-relative path as produced by the walker.
    pub path: std::path::PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Last-modified timestamp, when readable.
    pub modified: Option<DateTime<Utc>>,

    /// True when the file is at or above the memory-mapping threshold.
    pub is_large: bool,
}

/// Discover GC log files under `root`, applying include/exclude glob
/// patterns and depth/count limits from the config.
///
/// Files and directories that cannot be accessed are recorded as
/// human-readable warning strings, never an `Err`. Returns `Err` only
/// when the root path itself is invalid.
pub fn discover_logs(
    root: &Path,
    config: &AppConfig,
) -> std::result::Result<(Vec<DiscoveredLog>, Vec<String>), DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            });
        }
    }

    let max_files = config.max_files.min(constants::ABSOLUTE_MAX_FILES);
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?config.include_patterns,
        exclude = ?config.exclude_patterns,
        "Discovery starting"
    );

    let include_pats = compile_patterns(&config.include_patterns, "include");
    let exclude_pats = compile_patterns(&config.exclude_patterns, "exclude");

    let mut logs: Vec<DiscoveredLog> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // Literal exclude patterns (no wildcards) also veto whole
            // directories so excluded subtrees are never descended into.
            if e.file_type().is_dir() {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_str().unwrap_or("");
                return !is_excluded_component(name, &exclude_pats);
            }
            true
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let msg = format!("Cannot access '{path_str}': {e}");
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => {
                warnings.push(format!("Skipping '{}': non-UTF-8 filename", path.display()));
                continue;
            }
        };

        if is_excluded_filename(file_name, &exclude_pats) {
            tracing::trace!(file = file_name, "Excluded by pattern");
            continue;
        }
        if !is_included(file_name, &include_pats) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let msg = format!("Cannot read metadata for '{}': {e}", path.display());
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        let size = metadata.len();
        logs.push(DiscoveredLog {
            path: path.to_path_buf(),
            size,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_large: size >= constants::LARGE_FILE_THRESHOLD,
        });
    }

    let total_found = logs.len();

    // When over the limit, keep the most recently modified files so the
    // freshest logs win. Files without a readable mtime count as oldest.
    if total_found > max_files {
        logs.sort_unstable_by(|a, b| match (b.modified, a.modified) {
            (Some(bm), Some(am)) => bm.cmp(&am),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        logs.truncate(max_files);

        warnings.push(format!(
            "{total_found} GC log files were found but the limit is {max_files}. \
             Only the {max_files} most recently modified files will be analysed. \
             Raise [discovery] max_files in config if you need more."
        ));

        tracing::info!(
            total_found,
            limit = max_files,
            "File list truncated to most recently modified files"
        );
    }

    // Stable report order regardless of walk order.
    logs.sort_unstable_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        total_found,
        files_loaded = logs.len(),
        warnings = warnings.len(),
        "Discovery complete"
    );

    Ok((logs, warnings))
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob pattern strings, logging and skipping any that fail.
fn compile_patterns(patterns: &[String], kind: &str) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, kind, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// True if `dir_name` matches an exclude pattern with no wildcard
/// characters. Literal patterns double as directory component vetoes.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains('*') && !s.contains('?') && !s.contains('[') && p.matches(dir_name)
    })
}

/// True if `file_name` matches any exclude pattern.
fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

/// True if `file_name` matches at least one include pattern. An empty
/// include list means include everything.
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    if include_pats.is_empty() {
        return true;
    }
    include_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================
