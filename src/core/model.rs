// GCLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no CLI,
// no platform dependencies (core depends on std, serde and regex only).
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::constants::{
    DEFAULT_CRITICAL_PAUSE_MS, DEFAULT_GC_TIME_PERCENT, DEFAULT_LEAK_CONFIDENCE_THRESHOLD,
    DEFAULT_LONG_PAUSE_MS, DEFAULT_MEMORY_EFFICIENCY_PERCENT, DEFAULT_MIN_LEAK_EVENTS,
};

// =============================================================================
// Collector family
// =============================================================================

/// The garbage-collector family that produced a log.
///
/// Detection is keyword-based (see core::grammar); when no marker is
/// found the family defaults to G1, the JVM default collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CollectorFamily {
    #[default]
    G1,
    Z,
    Parallel,
}

impl CollectorFamily {
    /// Human-readable label for display and reports.
    pub fn label(&self) -> &'static str {
        match self {
            CollectorFamily::G1 => "G1",
            CollectorFamily::Z => "ZGC",
            CollectorFamily::Parallel => "Parallel",
        }
    }
}

impl std::fmt::Display for CollectorFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// GC Event (normalised output of parsing)
// =============================================================================

/// A single collection pause, normalised across all collector families.
///
/// This is the core data unit that flows through aggregation, analysis
/// and export. Every family grammar produces these regardless of the
/// source log's native layout. All memory values are bytes; all
/// durations are milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct GcEvent {
    /// Milliseconds since JVM start, taken from the log's uptime stamp.
    pub timestamp_ms: u64,

    /// Event type label (e.g. "G1 Evacuation Pause", "ZGC Pause Mark Start").
    pub label: String,

    /// Collection cause (e.g. "Allocation Failure", "System.gc()").
    pub cause: String,

    /// Heap occupancy before the collection, in bytes.
    pub heap_before: u64,

    /// Heap occupancy after the collection, in bytes.
    pub heap_after: u64,

    /// Committed heap size at collection time, in bytes. Zero if the
    /// source line carried no committed figure.
    pub heap_committed: u64,

    /// Pause duration in milliseconds.
    pub duration_ms: f64,

    /// Young generation occupancy before/after, in bytes. Zero if the
    /// source line had no generation breakdown.
    pub young_before: u64,
    pub young_after: u64,

    /// Old generation occupancy before/after, in bytes. Zero if the
    /// source line had no generation breakdown.
    pub old_before: u64,
    pub old_after: u64,

    /// Whether this was a major collection (Full/Mixed/Remark for G1,
    /// Full for Parallel, Mark/Relocate phases for ZGC).
    pub is_major: bool,

    /// Whether the collection was triggered by an explicit System.gc() call.
    pub is_system: bool,
}

impl GcEvent {
    /// Heap freed by this collection, in bytes.
    ///
    /// May be negative: concurrent-phase events can observe the heap
    /// growing while the phase runs. Callers must tolerate this.
    pub fn heap_freed(&self) -> i64 {
        self.heap_before as i64 - self.heap_after as i64
    }

    /// Reclamation efficiency as a percentage of the pre-collection
    /// occupancy. Zero when heap-before is unknown (zero).
    pub fn efficiency_percent(&self) -> f64 {
        if self.heap_before == 0 {
            0.0
        } else {
            self.heap_freed() as f64 / self.heap_before as f64 * 100.0
        }
    }
}

// =============================================================================
// Timeline (ordered event store with aggregate rollups)
// =============================================================================

/// Ordered, append-only sequence of events for one log, tagged with the
/// detected collector family and the runtime version when the log
/// header carried one.
///
/// Aggregates are recomputed in full by `calculate_statistics`, which
/// is idempotent and safe to call repeatedly. On an empty event set all
/// aggregates are zero.
#[derive(Debug, Clone, Serialize)]
pub struct GcTimeline {
    /// Detected collector family.
    pub family: CollectorFamily,

    /// JVM version string captured from the log header, if present.
    pub jvm_version: Option<String>,

    /// Events in log order. Timestamps are taken as non-decreasing;
    /// the parser appends in source order and never re-sorts.
    pub events: Vec<GcEvent>,

    /// Earliest event timestamp in ms. Zero when empty.
    pub start_ms: f64,

    /// Latest event timestamp in ms. Zero when empty.
    pub end_ms: f64,

    /// Sum of all pause durations in ms.
    pub total_gc_time_ms: f64,

    /// Longest single pause in ms.
    pub max_pause_ms: f64,

    /// Mean pause duration in ms.
    pub average_pause_ms: f64,

    /// Net heap freed across all events, in bytes. May be negative.
    pub total_heap_freed: i64,
}

impl GcTimeline {
    /// Creates an empty timeline for the given collector family.
    pub fn new(family: CollectorFamily) -> Self {
        Self {
            family,
            jvm_version: None,
            events: Vec::new(),
            start_ms: 0.0,
            end_ms: 0.0,
            total_gc_time_ms: 0.0,
            max_pause_ms: 0.0,
            average_pause_ms: 0.0,
            total_heap_freed: 0,
        }
    }

    /// Appends an event. Aggregates are not updated until the next
    /// `calculate_statistics` call.
    pub fn push(&mut self, event: GcEvent) {
        self.events.push(event);
    }

    /// Recomputes all aggregate rollups from the full event set.
    ///
    /// Idempotent. Zeroes every aggregate when the event set is empty.
    pub fn calculate_statistics(&mut self) {
        if self.events.is_empty() {
            self.start_ms = 0.0;
            self.end_ms = 0.0;
            self.total_gc_time_ms = 0.0;
            self.max_pause_ms = 0.0;
            self.average_pause_ms = 0.0;
            self.total_heap_freed = 0;
            return;
        }

        // The span runs between the earliest and latest event
        // timestamps; the final pause's own duration is not part of it.
        // Min/max rather than first/last keeps out-of-order lines from
        // inverting the span.
        self.start_ms = self
            .events
            .iter()
            .map(|e| e.timestamp_ms)
            .min()
            .unwrap_or(0) as f64;
        self.end_ms = self
            .events
            .iter()
            .map(|e| e.timestamp_ms)
            .max()
            .unwrap_or(0) as f64;
        self.total_gc_time_ms = self.events.iter().map(|e| e.duration_ms).sum();
        self.max_pause_ms = self
            .events
            .iter()
            .map(|e| e.duration_ms)
            .fold(0.0, f64::max);
        self.average_pause_ms = self.total_gc_time_ms / self.events.len() as f64;
        self.total_heap_freed = self.events.iter().map(GcEvent::heap_freed).sum();
    }

    /// Wall-clock span between the earliest and latest event
    /// timestamps, in ms. Zero when empty or single-event.
    pub fn wall_ms(&self) -> f64 {
        (self.end_ms - self.start_ms).max(0.0)
    }

    /// Share of wall-clock time spent in GC pauses, as a percentage.
    /// Zero when the timeline is empty or spans no time.
    pub fn gc_time_percentage(&self) -> f64 {
        let wall = self.wall_ms();
        if self.events.is_empty() || wall <= 0.0 {
            return 0.0;
        }
        self.total_gc_time_ms / wall * 100.0
    }

    /// All major-collection events, in log order.
    pub fn major_events(&self) -> Vec<&GcEvent> {
        self.events.iter().filter(|e| e.is_major).collect()
    }

    /// Events whose pause exceeded `threshold_ms`, in log order.
    pub fn long_pauses(&self, threshold_ms: u64) -> Vec<&GcEvent> {
        self.events
            .iter()
            .filter(|e| e.duration_ms > threshold_ms as f64)
            .collect()
    }
}

// =============================================================================
// Analysis configuration
// =============================================================================

/// Threshold set consumed by the analyzer and leak detector.
///
/// An immutable value passed per call. Loading and validation live in
/// the app layer; the core never mutates or defaults-in missing fields
/// at analysis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Pauses above this are "long" (ms).
    pub long_pause_ms: u64,

    /// Pauses above this are "critical" (ms).
    pub critical_pause_ms: u64,

    /// GC-time share of wall clock above this raises an issue (percent).
    pub gc_time_percent: f64,

    /// Average reclamation efficiency below this raises an issue (percent).
    pub memory_efficiency_percent: f64,

    /// Overall leak confidence at or above this marks a leak detected.
    pub leak_confidence_threshold: f64,

    /// Minimum event count before leak strategies run at all.
    pub min_leak_events: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            long_pause_ms: DEFAULT_LONG_PAUSE_MS,
            critical_pause_ms: DEFAULT_CRITICAL_PAUSE_MS,
            gc_time_percent: DEFAULT_GC_TIME_PERCENT,
            memory_efficiency_percent: DEFAULT_MEMORY_EFFICIENCY_PERCENT,
            leak_confidence_threshold: DEFAULT_LEAK_CONFIDENCE_THRESHOLD,
            min_leak_events: DEFAULT_MIN_LEAK_EVENTS,
        }
    }
}

// =============================================================================
// Issues
// =============================================================================

/// Severity of a detected operational issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    Warning,
    Critical,
}

impl IssueSeverity {
    /// Stable uppercase label for the machine-readable triple.
    pub fn label(&self) -> &'static str {
        match self {
            IssueSeverity::Warning => "WARNING",
            IssueSeverity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable issue codes raised by the analyzer's threshold rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    NoEvents,
    LongPauses,
    CriticalPauses,
    HighAveragePause,
    HighGcTime,
    GcStorm,
    LowMemoryEfficiency,
    HighMajorGcRatio,
    PossibleMemoryLeak,
    SystemGcCalls,
}

impl IssueCode {
    /// Stable machine-readable code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::NoEvents => "NO_EVENTS",
            IssueCode::LongPauses => "LONG_PAUSES",
            IssueCode::CriticalPauses => "CRITICAL_PAUSES",
            IssueCode::HighAveragePause => "HIGH_AVERAGE_PAUSE",
            IssueCode::HighGcTime => "HIGH_GC_TIME",
            IssueCode::GcStorm => "GC_STORM",
            IssueCode::LowMemoryEfficiency => "LOW_MEMORY_EFFICIENCY",
            IssueCode::HighMajorGcRatio => "HIGH_MAJOR_GC_RATIO",
            IssueCode::PossibleMemoryLeak => "POSSIBLE_MEMORY_LEAK",
            IssueCode::SystemGcCalls => "SYSTEM_GC_CALLS",
        }
    }

    /// Fixed severity for this code.
    pub fn severity(&self) -> IssueSeverity {
        match self {
            IssueCode::CriticalPauses | IssueCode::PossibleMemoryLeak => IssueSeverity::Critical,
            _ => IssueSeverity::Warning,
        }
    }
}

/// One detected operational issue: a stable code plus human-readable text.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub description: String,
}

impl Issue {
    pub fn new(code: IssueCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        self.code.severity()
    }

    /// Stable `CODE:description:SEVERITY` triple for machine consumption.
    pub fn format_triple(&self) -> String {
        format!(
            "{}:{}:{}",
            self.code.as_str(),
            self.description,
            self.severity().label()
        )
    }
}

// =============================================================================
// Analysis report
// =============================================================================

/// Read-only analysis result, created once per analyze call and bound
/// to the timeline it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport<'a> {
    /// Collector family of the analysed timeline.
    pub family: CollectorFamily,

    /// JVM version from the log header, if captured.
    pub jvm_version: Option<String>,

    /// Source log path. Empty when the lines came from memory.
    pub source: PathBuf,

    /// Event counts.
    pub total_events: usize,
    pub major_count: usize,
    pub minor_count: usize,

    /// Sum of all pause durations in ms.
    pub total_gc_time_ms: f64,

    /// Longest single pause in ms.
    pub longest_pause_ms: f64,

    /// Mean pause duration in ms.
    pub average_pause_ms: f64,

    /// Wall-clock span of the timeline in ms.
    pub wall_ms: f64,

    /// Share of wall clock spent paused, as a percentage.
    pub gc_time_percentage: f64,

    /// Application throughput: 100 minus the GC-time percentage.
    pub throughput_percentage: f64,

    /// Mean per-event reclamation efficiency, as a percentage.
    pub average_memory_efficiency: f64,

    /// Nearest-rank pause percentiles in ms.
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,

    /// Events whose pause exceeded the long threshold, in log order.
    pub long_pauses: Vec<&'a GcEvent>,

    /// Events whose pause exceeded the critical threshold, in log order.
    pub critical_pauses: Vec<&'a GcEvent>,

    /// Best and worst reclamation events by efficiency ratio.
    pub most_efficient: Option<&'a GcEvent>,
    pub least_efficient: Option<&'a GcEvent>,

    /// Threshold issues in rule order.
    pub issues: Vec<Issue>,

    /// Tuning suggestions derived from the fired issues and family.
    pub recommendations: Vec<String>,
}

// =============================================================================
// Leak detection results
// =============================================================================

/// The heap-growth pattern a leak strategy claims to have found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeakPattern {
    Linear,
    Exponential,
    Stepping,
    EfficiencyDecline,
}

impl LeakPattern {
    /// Stable uppercase pattern name for reports and export.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakPattern::Linear => "LINEAR",
            LeakPattern::Exponential => "EXPONENTIAL",
            LeakPattern::Stepping => "STEPPING",
            LeakPattern::EfficiencyDecline => "EFFICIENCY_DECLINE",
        }
    }
}

impl std::fmt::Display for LeakPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined verdict of the four leak-detection strategies.
///
/// Suspicious events are read-only references into the analysed
/// timeline, never copies.
#[derive(Debug, Clone, Serialize)]
pub struct LeakResult<'a> {
    /// True when the overall confidence reached the configured threshold.
    pub detected: bool,

    /// Overall confidence in [0, 1]: the maximum across strategies.
    pub confidence: f64,

    /// Pattern of the winning strategy. None when no strategy scored.
    pub pattern: Option<LeakPattern>,

    /// Estimated heap growth in bytes per minute. Zero when the winning
    /// strategy does not estimate growth.
    pub growth_rate_bytes_per_min: f64,

    /// Human-readable verdict text.
    pub description: String,

    /// Events implicated by the winning strategy, in log order.
    pub suspicious_events: Vec<&'a GcEvent>,

    /// Number of events the detector examined.
    pub events_analyzed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(timestamp_ms: u64, duration_ms: f64, before: u64, after: u64) -> GcEvent {
        GcEvent {
            timestamp_ms,
            label: "Pause Young".to_string(),
            cause: "Allocation Failure".to_string(),
            heap_before: before,
            heap_after: after,
            heap_committed: before * 2,
            duration_ms,
            young_before: 0,
            young_after: 0,
            old_before: 0,
            old_after: 0,
            is_major: false,
            is_system: false,
        }
    }

    #[test]
    fn heap_freed_tolerates_growth_during_concurrent_phases() {
        let shrank = make_event(1000, 10.0, 800, 300);
        assert_eq!(shrank.heap_freed(), 500);

        let grew = make_event(2000, 10.0, 300, 800);
        assert_eq!(grew.heap_freed(), -500, "growth must yield negative freed");
    }

    #[test]
    fn efficiency_is_zero_without_heap_before() {
        let event = make_event(1000, 10.0, 0, 0);
        assert_eq!(event.efficiency_percent(), 0.0);
    }

    #[test]
    fn empty_timeline_has_zero_aggregates() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        timeline.calculate_statistics();

        assert_eq!(timeline.total_gc_time_ms, 0.0);
        assert_eq!(timeline.max_pause_ms, 0.0);
        assert_eq!(timeline.average_pause_ms, 0.0);
        assert_eq!(timeline.total_heap_freed, 0);
        assert_eq!(timeline.gc_time_percentage(), 0.0);
    }

    #[test]
    fn calculate_statistics_is_idempotent() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        timeline.push(make_event(1000, 50.0, 1000, 400));
        timeline.push(make_event(3000, 150.0, 1200, 500));

        timeline.calculate_statistics();
        let first_total = timeline.total_gc_time_ms;
        let first_avg = timeline.average_pause_ms;

        timeline.calculate_statistics();
        assert_eq!(timeline.total_gc_time_ms, first_total);
        assert_eq!(timeline.average_pause_ms, first_avg);
        assert_eq!(timeline.max_pause_ms, 150.0);
        assert_eq!(timeline.total_heap_freed, 600 + 700);
    }

    #[test]
    fn gc_time_percentage_uses_wall_clock_span() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        // Two events at 1000ms and 3000ms of uptime: the span is the
        // 2000ms between their timestamps, not padded by the final
        // pause's duration.
        timeline.push(make_event(1000, 50.0, 1000, 400));
        timeline.push(make_event(3000, 150.0, 1200, 500));
        timeline.calculate_statistics();

        assert_eq!(timeline.wall_ms(), 2000.0);
        let expected = 200.0 / 2000.0 * 100.0;
        assert!((timeline.gc_time_percentage() - expected).abs() < 1e-9);
    }

    #[test]
    fn single_event_timeline_has_zero_span() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        timeline.push(make_event(1000, 50.0, 1000, 400));
        timeline.calculate_statistics();

        // One timestamp spans no time, so the GC share is zero rather
        // than a division-by-zero artefact.
        assert_eq!(timeline.wall_ms(), 0.0);
        assert_eq!(timeline.gc_time_percentage(), 0.0);
    }

    #[test]
    fn out_of_order_events_span_min_to_max() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        timeline.push(make_event(5000, 20.0, 1000, 400));
        timeline.push(make_event(1000, 50.0, 1000, 400));
        timeline.push(make_event(3000, 30.0, 1200, 500));
        timeline.calculate_statistics();

        assert_eq!(timeline.start_ms, 1000.0);
        assert_eq!(timeline.end_ms, 5000.0);
        assert_eq!(timeline.wall_ms(), 4000.0);
    }

    #[test]
    fn major_and_long_pause_filters() {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        let mut major = make_event(1000, 1200.0, 1000, 400);
        major.is_major = true;
        timeline.push(major);
        timeline.push(make_event(2000, 80.0, 1100, 500));
        timeline.push(make_event(3000, 450.0, 1200, 600));

        assert_eq!(timeline.major_events().len(), 1);
        assert_eq!(timeline.long_pauses(100).len(), 2);
        assert_eq!(timeline.long_pauses(1000).len(), 1);
    }

    #[test]
    fn issue_triple_is_stable() {
        let issue = Issue::new(IssueCode::CriticalPauses, "Found 3 critical pauses (>1000ms)");
        assert_eq!(
            issue.format_triple(),
            "CRITICAL_PAUSES:Found 3 critical pauses (>1000ms):CRITICAL"
        );
    }

    #[test]
    fn issue_severities_match_codes() {
        assert_eq!(IssueCode::CriticalPauses.severity(), IssueSeverity::Critical);
        assert_eq!(
            IssueCode::PossibleMemoryLeak.severity(),
            IssueSeverity::Critical
        );
        assert_eq!(IssueCode::LongPauses.severity(), IssueSeverity::Warning);
        assert_eq!(IssueCode::GcStorm.severity(), IssueSeverity::Warning);
    }

    #[test]
    fn default_config_matches_documented_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.long_pause_ms, 100);
        assert_eq!(config.critical_pause_ms, 1000);
        assert_eq!(config.gc_time_percent, 10.0);
        assert_eq!(config.memory_efficiency_percent, 50.0);
        assert_eq!(config.leak_confidence_threshold, 0.7);
        assert_eq!(config.min_leak_events, 10);
    }
}
