// GCLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "GCLens";

/// Application identifier used for config directories.
pub const APP_ID: &str = "GCLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Unit conversion
// =============================================================================

/// Bytes per kilobyte ("K" suffix in GC log heap figures).
pub const BYTES_PER_KB: u64 = 1024;

/// Bytes per megabyte ("M" suffix, and ZGC's bare megabyte figures).
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Milliseconds per minute (growth rates are expressed in bytes/minute).
pub const MS_PER_MINUTE: f64 = 60_000.0;

// =============================================================================
// Analyzer thresholds (defaults; overridable via config.toml [thresholds])
// =============================================================================

/// Pauses longer than this are reported as long pauses (ms).
pub const DEFAULT_LONG_PAUSE_MS: u64 = 100;

/// Pauses longer than this are reported as critical pauses (ms).
pub const DEFAULT_CRITICAL_PAUSE_MS: u64 = 1000;

/// GC time above this percentage of wall time is flagged.
pub const DEFAULT_GC_TIME_PERCENT: f64 = 10.0;

/// Average heap reclamation below this percentage is flagged.
pub const DEFAULT_MEMORY_EFFICIENCY_PERCENT: f64 = 50.0;

/// Upper validation bound for the long-pause threshold (ms).
pub const MAX_LONG_PAUSE_MS: u64 = 60_000;

/// Upper validation bound for the critical-pause threshold (ms).
pub const MAX_CRITICAL_PAUSE_MS: u64 = 600_000;

// =============================================================================
// Issue detection
// =============================================================================

/// Width of the event-frequency bucket used for storm detection (ms).
pub const GC_STORM_WINDOW_MS: u64 = 60_000;

/// More events than this within one storm window fires GC_STORM.
pub const GC_STORM_EVENT_LIMIT: usize = 10;

/// Storm detection is skipped below this many total events.
pub const GC_STORM_MIN_EVENTS: usize = 10;

/// Major-GC fraction above this fires HIGH_MAJOR_GC_RATIO.
pub const HIGH_MAJOR_GC_RATIO: f64 = 0.1;

/// Number of trailing events examined by the heap-trend check.
pub const TREND_WINDOW_EVENTS: usize = 20;

/// Minimum points for the trend regression to be meaningful.
pub const TREND_MIN_POINTS: usize = 5;

/// Per-event heap-after growth above this fires POSSIBLE_MEMORY_LEAK (bytes).
pub const TREND_SLOPE_BYTES_PER_EVENT: f64 = BYTES_PER_MB as f64;

// =============================================================================
// Leak detection (defaults; overridable via config.toml [leak])
// =============================================================================

/// Overall confidence at or above this declares a leak.
pub const DEFAULT_LEAK_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Minimum events before leak analysis runs at all.
pub const DEFAULT_MIN_LEAK_EVENTS: usize = 10;

/// Lower validation bound for the minimum-event count.
pub const MIN_LEAK_EVENTS_FLOOR: usize = 3;

/// Upper validation bound for the minimum-event count.
pub const MAX_LEAK_EVENTS_CEILING: usize = 10_000;

/// Minimum filtered points for the linear strategy.
pub const LINEAR_MIN_POINTS: usize = 5;

/// Minimum R-squared for a linear fit to be accepted.
pub const LINEAR_MIN_R_SQUARED: f64 = 0.6;

/// Linear confidence is capped here regardless of fit quality.
pub const LINEAR_CONFIDENCE_CAP: f64 = 0.9;

/// Above this linear confidence the later half of events is marked suspicious.
pub const LINEAR_SUSPECT_CONFIDENCE: f64 = 0.7;

/// Minimum filtered points for the exponential strategy.
pub const EXPONENTIAL_MIN_POINTS: usize = 8;

/// Minimum consecutive growth rates for the acceleration vote.
pub const EXPONENTIAL_MIN_RATES: usize = 3;

/// Fixed confidence assigned to an accelerating growth pattern.
pub const EXPONENTIAL_CONFIDENCE: f64 = 0.8;

/// Minimum filtered points for the stepping strategy.
pub const STEPPING_MIN_POINTS: usize = 6;

/// Heap change below this fraction of the previous value counts as a plateau.
pub const STEPPING_PLATEAU_TOLERANCE: f64 = 0.05;

/// Heap growth beyond this ratio of the current value counts as a jump.
pub const STEPPING_JUMP_RATIO: f64 = 1.1;

/// Steps required before the stepping strategy reports at all.
pub const STEPPING_MIN_STEPS: usize = 2;

/// Confidence contributed per detected step.
pub const STEPPING_CONFIDENCE_PER_STEP: f64 = 0.3;

/// Stepping confidence cap.
pub const STEPPING_CONFIDENCE_CAP: f64 = 0.8;

/// Minimum total events for the efficiency-decline strategy.
pub const EFFICIENCY_MIN_EVENTS: usize = 10;

/// First-half vs second-half mean efficiency drop that fires the strategy.
pub const EFFICIENCY_DROP_THRESHOLD: f64 = 0.2;

/// Fixed confidence assigned to a declining efficiency trend.
pub const EFFICIENCY_CONFIDENCE: f64 = 0.7;

/// quick_leak_check needs at least this many qualifying major events.
pub const QUICK_CHECK_MIN_MAJOR: usize = 3;

// =============================================================================
// Parsing limits
// =============================================================================

/// Maximum number of parse errors collected per log before suppression.
pub const MAX_PARSE_ERRORS: usize = 1_000;

/// Maximum length of a log line included in debug diagnostics.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Discovery limits
// =============================================================================

/// Maximum directory recursion depth during discovery.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Maximum number of files to discover in a single scan.
pub const DEFAULT_MAX_FILES: usize = 500;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 10_000;

/// Hard upper bound on max depth (prevents infinite traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Default include glob patterns for GC log discovery.
/// The `gc*.log*` forms cover JVM log rotation (gc.log.0, gc.log.1.current).
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["gc*.log*", "*.log", "*.log.[0-9]*"];

/// Default exclude glob patterns for GC log discovery.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.gz", "*.zip", "*.bak", "*.tmp"];

// =============================================================================
// File reading
// =============================================================================

/// File size in bytes above which reads go through memory mapping.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

// =============================================================================
// Reporting
// =============================================================================

/// Maximum suspicious events listed in the leak report.
pub const MAX_SUSPICIOUS_EVENTS_SHOWN: usize = 5;

/// Width of the report banner rule.
pub const REPORT_RULE_WIDTH: usize = 80;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
