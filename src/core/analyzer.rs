// GCLens - core/analyzer.rs
//
// Statistical analysis of a parsed GC timeline: percentiles, memory
// efficiency, threshold-based issue detection and tuning
// recommendations. Core layer: pure computation, no I/O.
//
// `analyze` expects a derived timeline (parse_lines derives it; call
// `calculate_statistics` after building one by hand). Each analysis
// step is independent, so rules can fire in any combination.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::core::model::{
    AnalysisConfig, AnalysisReport, GcEvent, GcTimeline, Issue, IssueCode,
};
use crate::util::constants::{
    GC_STORM_EVENT_LIMIT, GC_STORM_MIN_EVENTS, GC_STORM_WINDOW_MS, HIGH_MAJOR_GC_RATIO,
    TREND_MIN_POINTS, TREND_SLOPE_BYTES_PER_EVENT, TREND_WINDOW_EVENTS,
};

/// Nearest-rank percentile over an ascending-sorted duration list.
///
/// For percentile `p`, index = ceil(p/100 * n) - 1, clamped to
/// [0, n-1]. Returns 0 on an empty list.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let index = (p / 100.0 * n as f64).ceil() as isize - 1;
    let index = index.clamp(0, n as isize - 1) as usize;
    sorted[index]
}

/// Ordinary-least-squares fit of y against x.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinearFit {
    pub(crate) slope: f64,
    pub(crate) r_squared: f64,
}

/// Fits a straight line through the points. Returns None when there are
/// fewer than two points or the x values carry no variance.
pub(crate) fn linear_regression(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }

    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();

    // A flat series has no variance to explain.
    let r_squared = if ss_tot <= 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    Some(LinearFit { slope, r_squared })
}

/// Analyses a timeline into a read-only report.
///
/// `source` is carried through for reporting only; pass an empty path
/// when the lines came from memory.
pub fn analyze<'a>(
    timeline: &'a GcTimeline,
    config: &AnalysisConfig,
    source: &Path,
) -> AnalysisReport<'a> {
    tracing::debug!(
        family = %timeline.family,
        events = timeline.events.len(),
        "Analysis started"
    );

    if timeline.events.is_empty() {
        return empty_report(timeline, source);
    }

    let events = &timeline.events;
    let total_events = events.len();
    let major_count = events.iter().filter(|e| e.is_major).count();
    let minor_count = total_events - major_count;

    let mut durations: Vec<f64> = events.iter().map(|e| e.duration_ms).collect();
    durations.sort_by(|a, b| a.total_cmp(b));

    let gc_time_percentage = timeline.gc_time_percentage();
    let average_memory_efficiency =
        events.iter().map(GcEvent::efficiency_percent).sum::<f64>() / total_events as f64;

    let long_pauses = timeline.long_pauses(config.long_pause_ms);
    let critical_pauses = timeline.long_pauses(config.critical_pause_ms);

    let most_efficient = events
        .iter()
        .max_by(|a, b| a.efficiency_percent().total_cmp(&b.efficiency_percent()));
    let least_efficient = events
        .iter()
        .min_by(|a, b| a.efficiency_percent().total_cmp(&b.efficiency_percent()));

    let issues = detect_issues(
        timeline,
        config,
        gc_time_percentage,
        average_memory_efficiency,
        &long_pauses,
        &critical_pauses,
        major_count,
    );

    let recommendations = build_recommendations(
        timeline,
        config,
        gc_time_percentage,
        average_memory_efficiency,
        &critical_pauses,
        major_count,
        &issues,
    );

    tracing::debug!(
        issues = issues.len(),
        recommendations = recommendations.len(),
        "Analysis complete"
    );

    AnalysisReport {
        family: timeline.family,
        jvm_version: timeline.jvm_version.clone(),
        source: source.to_path_buf(),
        total_events,
        major_count,
        minor_count,
        total_gc_time_ms: timeline.total_gc_time_ms,
        longest_pause_ms: timeline.max_pause_ms,
        average_pause_ms: timeline.average_pause_ms,
        wall_ms: timeline.wall_ms(),
        gc_time_percentage,
        throughput_percentage: 100.0 - gc_time_percentage,
        average_memory_efficiency,
        p50_ms: percentile(&durations, 50.0),
        p90_ms: percentile(&durations, 90.0),
        p95_ms: percentile(&durations, 95.0),
        p99_ms: percentile(&durations, 99.0),
        long_pauses,
        critical_pauses,
        most_efficient,
        least_efficient,
        issues,
        recommendations,
    }
}

// Zero events short-circuits every other rule: one NO_EVENTS issue,
// zero aggregates, no recommendations.
fn empty_report<'a>(timeline: &'a GcTimeline, source: &Path) -> AnalysisReport<'a> {
    AnalysisReport {
        family: timeline.family,
        jvm_version: timeline.jvm_version.clone(),
        source: source.to_path_buf(),
        total_events: 0,
        major_count: 0,
        minor_count: 0,
        total_gc_time_ms: 0.0,
        longest_pause_ms: 0.0,
        average_pause_ms: 0.0,
        wall_ms: 0.0,
        gc_time_percentage: 0.0,
        throughput_percentage: 100.0,
        average_memory_efficiency: 0.0,
        p50_ms: 0.0,
        p90_ms: 0.0,
        p95_ms: 0.0,
        p99_ms: 0.0,
        long_pauses: Vec::new(),
        critical_pauses: Vec::new(),
        most_efficient: None,
        least_efficient: None,
        issues: vec![Issue::new(IssueCode::NoEvents, "No GC events found in log")],
        recommendations: Vec::new(),
    }
}

// =============================================================================
// Issue detection
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn detect_issues(
    timeline: &GcTimeline,
    config: &AnalysisConfig,
    gc_time_percentage: f64,
    average_memory_efficiency: f64,
    long_pauses: &[&GcEvent],
    critical_pauses: &[&GcEvent],
    major_count: usize,
) -> Vec<Issue> {
    let events = &timeline.events;
    let mut issues = Vec::new();

    if !critical_pauses.is_empty() {
        issues.push(Issue::new(
            IssueCode::CriticalPauses,
            format!(
                "Found {} critical pauses (>{}ms)",
                critical_pauses.len(),
                config.critical_pause_ms
            ),
        ));
    }

    if !long_pauses.is_empty() {
        issues.push(Issue::new(
            IssueCode::LongPauses,
            format!(
                "Found {} long pauses (>{}ms)",
                long_pauses.len(),
                config.long_pause_ms
            ),
        ));
    }

    if timeline.average_pause_ms > config.long_pause_ms as f64 {
        issues.push(Issue::new(
            IssueCode::HighAveragePause,
            format!("Average pause time {:.2}ms is high", timeline.average_pause_ms),
        ));
    }

    if gc_time_percentage > config.gc_time_percent {
        issues.push(Issue::new(
            IssueCode::HighGcTime,
            format!(
                "GC time is {:.1}% of total time (threshold: {:.1}%)",
                gc_time_percentage, config.gc_time_percent
            ),
        ));
    }

    if events.len() >= GC_STORM_MIN_EVENTS {
        let mut buckets: HashMap<u64, usize> = HashMap::new();
        for event in events {
            *buckets.entry(event.timestamp_ms / GC_STORM_WINDOW_MS).or_insert(0) += 1;
        }
        if let Some(&peak) = buckets.values().max() {
            if peak > GC_STORM_EVENT_LIMIT {
                issues.push(Issue::new(
                    IssueCode::GcStorm,
                    format!("Detected GC storm: {peak} GCs in one minute"),
                ));
            }
        }
    }

    if average_memory_efficiency < config.memory_efficiency_percent {
        issues.push(Issue::new(
            IssueCode::LowMemoryEfficiency,
            format!(
                "Low memory efficiency: {:.1}% (threshold: {:.1}%)",
                average_memory_efficiency, config.memory_efficiency_percent
            ),
        ));
    }

    let major_ratio = major_count as f64 / events.len() as f64;
    if major_ratio > HIGH_MAJOR_GC_RATIO {
        issues.push(Issue::new(
            IssueCode::HighMajorGcRatio,
            format!("High ratio of major GCs: {:.1}%", major_ratio * 100.0),
        ));
    }

    if heap_trend_is_growing(events) {
        issues.push(Issue::new(
            IssueCode::PossibleMemoryLeak,
            "Detected growing heap trend after GCs - possible memory leak",
        ));
    }

    let system_calls = events.iter().filter(|e| e.is_system).count();
    if system_calls > 0 {
        issues.push(Issue::new(
            IssueCode::SystemGcCalls,
            format!("Found {system_calls} System.gc() calls - can cause unnecessary pauses"),
        ));
    }

    issues
}

/// Lightweight trend check over the trailing window: fires when the
/// regression slope of heap-after exceeds 1MB per event. Distinct from
/// the full leak detector.
fn heap_trend_is_growing(events: &[GcEvent]) -> bool {
    let window_start = events.len().saturating_sub(TREND_WINDOW_EVENTS);
    let recent = &events[window_start..];
    if recent.len() < TREND_MIN_POINTS {
        return false;
    }

    let points: Vec<(f64, f64)> = recent
        .iter()
        .enumerate()
        .map(|(i, e)| (i as f64, e.heap_after as f64))
        .collect();

    match linear_regression(&points) {
        Some(fit) => fit.slope > TREND_SLOPE_BYTES_PER_EVENT,
        None => false,
    }
}

// =============================================================================
// Recommendations
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn build_recommendations(
    timeline: &GcTimeline,
    config: &AnalysisConfig,
    gc_time_percentage: f64,
    average_memory_efficiency: f64,
    critical_pauses: &[&GcEvent],
    major_count: usize,
    issues: &[Issue],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !critical_pauses.is_empty() {
        recommendations.push("Consider tuning GC parameters to reduce pause times".to_string());
        recommendations.push(
            "Evaluate switching to low-pause GC (ZGC, Shenandoah) for critical applications"
                .to_string(),
        );
    }

    if gc_time_percentage > config.gc_time_percent {
        recommendations.push("Increase heap size to reduce GC frequency".to_string());
        recommendations.push("Optimize object allocation patterns".to_string());
    }

    if average_memory_efficiency < config.memory_efficiency_percent {
        recommendations.push("Review object retention and memory usage patterns".to_string());
        recommendations.push("Consider adjusting generation sizes".to_string());
    }

    if issues.iter().any(|i| i.code == IssueCode::PossibleMemoryLeak) {
        recommendations.push("Perform memory profiling to identify leaking objects".to_string());
        recommendations.push("Review object lifecycle management".to_string());
    }

    if major_count as f64 > HIGH_MAJOR_GC_RATIO * timeline.events.len() as f64 {
        recommendations
            .push("Increase young generation size to reduce promotion rate".to_string());
        recommendations.push("Tune -XX:MaxTenuringThreshold if appropriate".to_string());
    }

    recommendations.push(
        match timeline.family {
            crate::core::model::CollectorFamily::G1 => {
                "Consider tuning G1GC: -XX:MaxGCPauseMillis, -XX:G1HeapRegionSize"
            }
            crate::core::model::CollectorFamily::Z => {
                "ZGC is well-tuned by default, but ensure adequate memory for best performance"
            }
            crate::core::model::CollectorFamily::Parallel => {
                "For better pause times, consider switching to G1GC or ZGC"
            }
        }
        .to_string(),
    );

    recommendations
}

// =============================================================================
// Timeline utilities
// =============================================================================

/// Events whose label contains `query`, case-insensitively.
pub fn events_by_type<'a>(timeline: &'a GcTimeline, query: &str) -> Vec<&'a GcEvent> {
    let query_lower = query.to_lowercase();
    timeline
        .events
        .iter()
        .filter(|e| e.label.to_lowercase().contains(&query_lower))
        .collect()
}

/// Event counts per type label, sorted by label for stable output.
pub fn type_distribution(timeline: &GcTimeline) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for event in &timeline.events {
        *distribution.entry(event.label.clone()).or_insert(0) += 1;
    }
    distribution
}

/// Application throughput: the share of wall-clock time not spent in
/// GC pauses. 100 when the timeline spans no time.
pub fn throughput(timeline: &GcTimeline) -> f64 {
    100.0 - timeline.gc_time_percentage()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CollectorFamily, IssueSeverity};
    use std::path::PathBuf;

    fn make_event(timestamp_ms: u64, duration_ms: f64, before: u64, after: u64) -> GcEvent {
        GcEvent {
            timestamp_ms,
            label: "Pause Young (Normal)".to_string(),
            cause: "Allocation Failure".to_string(),
            heap_before: before,
            heap_after: after,
            heap_committed: before.max(after) * 2,
            duration_ms,
            young_before: 0,
            young_after: 0,
            old_before: 0,
            old_after: 0,
            is_major: false,
            is_system: false,
        }
    }

    fn make_timeline(events: Vec<GcEvent>) -> GcTimeline {
        let mut timeline = GcTimeline::new(CollectorFamily::G1);
        for event in events {
            timeline.push(event);
        }
        timeline.calculate_statistics();
        timeline
    }

    fn analyze_default(timeline: &GcTimeline) -> AnalysisReport<'_> {
        analyze(timeline, &AnalysisConfig::default(), &PathBuf::from("test.log"))
    }

    fn has_issue(report: &AnalysisReport<'_>, code: IssueCode) -> bool {
        report.issues.iter().any(|i| i.code == code)
    }

    const MB: u64 = 1024 * 1024;

    // -------------------------------------------------------------------------
    // Percentiles
    // -------------------------------------------------------------------------

    #[test]
    fn percentile_of_empty_list_is_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn percentile_nearest_rank() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        // ceil(0.5 * 5) - 1 = 2
        assert_eq!(percentile(&sorted, 50.0), 30.0);
        // ceil(0.9 * 5) - 1 = 4
        assert_eq!(percentile(&sorted, 90.0), 50.0);
        assert_eq!(percentile(&sorted, 100.0), 50.0);
        // Index clamps to 0 for tiny percentiles.
        assert_eq!(percentile(&sorted, 1.0), 10.0);
    }

    #[test]
    fn p50_is_nearest_rank_median_and_p100_is_max() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
    }

    // -------------------------------------------------------------------------
    // Regression
    // -------------------------------------------------------------------------

    #[test]
    fn regression_recovers_slope() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 3.0 + 2.0 * i as f64)).collect();
        let fit = linear_regression(&points).expect("fit");
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn regression_rejects_degenerate_input() {
        assert!(linear_regression(&[]).is_none());
        assert!(linear_regression(&[(1.0, 2.0)]).is_none());
        // No x variance.
        assert!(linear_regression(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
    }

    #[test]
    fn regression_flat_series_has_zero_r_squared() {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 7.0)).collect();
        let fit = linear_regression(&points).expect("fit");
        assert_eq!(fit.r_squared, 0.0);
        assert!(fit.slope.abs() < 1e-9);
    }

    // -------------------------------------------------------------------------
    // Empty input
    // -------------------------------------------------------------------------

    #[test]
    fn empty_timeline_short_circuits_to_no_events() {
        let timeline = make_timeline(vec![]);
        let report = analyze_default(&timeline);

        assert_eq!(report.issues.len(), 1, "only NO_EVENTS may fire");
        assert_eq!(report.issues[0].code, IssueCode::NoEvents);
        assert_eq!(report.issues[0].severity(), IssueSeverity::Warning);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.p99_ms, 0.0);
        assert_eq!(report.throughput_percentage, 100.0);
        assert!(report.most_efficient.is_none());
    }

    // -------------------------------------------------------------------------
    // Threshold rules
    // -------------------------------------------------------------------------

    #[test]
    fn critical_pauses_and_high_gc_time_fire_together() {
        // Three 1500ms pauses packed into a 4000ms window.
        let timeline = make_timeline(vec![
            make_event(0, 1500.0, 100 * MB, 40 * MB),
            make_event(2000, 1500.0, 100 * MB, 40 * MB),
            make_event(4000, 1500.0, 100 * MB, 40 * MB),
        ]);
        let report = analyze_default(&timeline);

        assert!((report.wall_ms - 4000.0).abs() < 1e-9);
        assert!(report.gc_time_percentage > 100.0, "4500ms of GC in 4000ms");
        assert!(has_issue(&report, IssueCode::CriticalPauses));
        assert!(has_issue(&report, IssueCode::HighGcTime));

        let critical = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::CriticalPauses)
            .expect("critical issue");
        assert_eq!(critical.description, "Found 3 critical pauses (>1000ms)");
        assert_eq!(critical.severity(), IssueSeverity::Critical);
    }

    #[test]
    fn long_pauses_fire_below_critical_threshold() {
        // 500ms pauses are long but not critical. Spread across minutes
        // so the storm rule stays quiet.
        let events = (0..4)
            .map(|i| make_event(i * 120_000, 500.0, 100 * MB, 40 * MB))
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        assert!(has_issue(&report, IssueCode::LongPauses));
        assert!(has_issue(&report, IssueCode::HighAveragePause));
        assert!(!has_issue(&report, IssueCode::CriticalPauses));
    }

    #[test]
    fn single_event_log_reports_zero_gc_time() {
        // One event spans no wall clock, so the GC share is zero and
        // the share-based rule stays quiet.
        let timeline = make_timeline(vec![make_event(1000, 50.0, 100 * MB, 40 * MB)]);
        let report = analyze_default(&timeline);

        assert_eq!(report.gc_time_percentage, 0.0);
        assert_eq!(report.throughput_percentage, 100.0);
        assert!(!has_issue(&report, IssueCode::HighGcTime));
    }

    #[test]
    fn gc_storm_detected_within_one_minute_bucket() {
        // 11 events inside the first minute bucket.
        let events = (0..11)
            .map(|i| make_event(1000 + i * 2000, 20.0, 100 * MB, 40 * MB))
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        assert!(has_issue(&report, IssueCode::GcStorm));
        let storm = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::GcStorm)
            .expect("storm issue");
        assert_eq!(storm.description, "Detected GC storm: 11 GCs in one minute");
    }

    #[test]
    fn storm_needs_minimum_event_count() {
        // Five events in one bucket is dense but below the storm floor.
        let events = (0..5)
            .map(|i| make_event(1000 + i * 100, 20.0, 100 * MB, 40 * MB))
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);
        assert!(!has_issue(&report, IssueCode::GcStorm));
    }

    #[test]
    fn low_memory_efficiency_detected() {
        // Barely any heap reclaimed per event.
        let events = (0..4)
            .map(|i| make_event(i * 120_000, 20.0, 100 * MB, 95 * MB))
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        assert!(report.average_memory_efficiency < 50.0);
        assert!(has_issue(&report, IssueCode::LowMemoryEfficiency));
    }

    #[test]
    fn high_major_ratio_detected() {
        let mut events: Vec<GcEvent> = (0..8)
            .map(|i| make_event(i * 120_000, 20.0, 100 * MB, 40 * MB))
            .collect();
        let mut major = make_event(8 * 120_000, 30.0, 100 * MB, 30 * MB);
        major.is_major = true;
        major.label = "Pause Full".to_string();
        events.push(major);
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        // 1 of 9 events is major: ratio > 10%.
        assert!(has_issue(&report, IssueCode::HighMajorGcRatio));
    }

    #[test]
    fn growing_heap_trend_raises_possible_leak() {
        // Heap-after climbs 2MB per event.
        let events = (0..20)
            .map(|i| {
                make_event(
                    i * 120_000,
                    20.0,
                    (100 + 2 * i) * MB + 50 * MB,
                    (100 + 2 * i) * MB,
                )
            })
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        assert!(has_issue(&report, IssueCode::PossibleMemoryLeak));
        let leak = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::PossibleMemoryLeak)
            .expect("leak issue");
        assert_eq!(leak.severity(), IssueSeverity::Critical);
    }

    #[test]
    fn oscillating_heap_raises_no_leak_trend() {
        let events = (0..20)
            .map(|i| {
                let after = if i % 2 == 0 { 100 * MB } else { 102 * MB };
                make_event(i * 120_000, 20.0, after + 60 * MB, after)
            })
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);
        assert!(!has_issue(&report, IssueCode::PossibleMemoryLeak));
    }

    #[test]
    fn system_gc_calls_counted() {
        let mut events: Vec<GcEvent> = (0..3)
            .map(|i| make_event(i * 120_000, 20.0, 100 * MB, 40 * MB))
            .collect();
        let mut system = make_event(400_000, 800.0, 100 * MB, 30 * MB);
        system.cause = "System.gc()".to_string();
        system.is_system = true;
        events.push(system);
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        let issue = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::SystemGcCalls)
            .expect("system gc issue");
        assert_eq!(
            issue.description,
            "Found 1 System.gc() calls - can cause unnecessary pauses"
        );
    }

    // -------------------------------------------------------------------------
    // Aggregate report fields
    // -------------------------------------------------------------------------

    #[test]
    fn throughput_complements_gc_time() {
        let timeline = make_timeline(vec![
            make_event(0, 100.0, 100 * MB, 40 * MB),
            make_event(900, 100.0, 100 * MB, 40 * MB),
        ]);
        let report = analyze_default(&timeline);

        assert!((report.gc_time_percentage + report.throughput_percentage - 100.0).abs() < 1e-9);
        assert!((throughput(&timeline) - report.throughput_percentage).abs() < 1e-9);
    }

    #[test]
    fn most_and_least_efficient_events() {
        let timeline = make_timeline(vec![
            make_event(0, 20.0, 100 * MB, 80 * MB),
            make_event(120_000, 20.0, 100 * MB, 10 * MB),
            make_event(240_000, 20.0, 100 * MB, 50 * MB),
        ]);
        let report = analyze_default(&timeline);

        let most = report.most_efficient.expect("most efficient");
        let least = report.least_efficient.expect("least efficient");
        assert_eq!(most.heap_after, 10 * MB);
        assert_eq!(least.heap_after, 80 * MB);
    }

    #[test]
    fn analysis_is_idempotent() {
        let timeline = make_timeline(vec![
            make_event(0, 100.0, 100 * MB, 40 * MB),
            make_event(5000, 300.0, 120 * MB, 50 * MB),
        ]);
        let first = analyze_default(&timeline);
        let second = analyze_default(&timeline);

        assert_eq!(first.total_events, second.total_events);
        assert_eq!(first.p99_ms, second.p99_ms);
        assert_eq!(first.issues.len(), second.issues.len());
        assert_eq!(first.recommendations, second.recommendations);
    }

    // -------------------------------------------------------------------------
    // Recommendations
    // -------------------------------------------------------------------------

    #[test]
    fn critical_pauses_drive_pause_recommendations() {
        let timeline = make_timeline(vec![make_event(0, 1500.0, 100 * MB, 40 * MB)]);
        let report = analyze_default(&timeline);

        assert_eq!(
            report.recommendations[0],
            "Consider tuning GC parameters to reduce pause times"
        );
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("low-pause GC")));
    }

    #[test]
    fn family_recommendation_always_present() {
        let mut z_timeline = GcTimeline::new(CollectorFamily::Z);
        z_timeline.push(make_event(0, 5.0, 100 * MB, 40 * MB));
        z_timeline.calculate_statistics();
        let report = analyze_default(&z_timeline);

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("ZGC is well-tuned")));
    }

    #[test]
    fn leak_issue_drives_profiling_recommendation() {
        let events = (0..20)
            .map(|i| {
                make_event(
                    i * 120_000,
                    20.0,
                    (100 + 2 * i) * MB + 50 * MB,
                    (100 + 2 * i) * MB,
                )
            })
            .collect();
        let timeline = make_timeline(events);
        let report = analyze_default(&timeline);

        assert!(report
            .recommendations
            .iter()
            .any(|r| r == "Perform memory profiling to identify leaking objects"));
    }

    // -------------------------------------------------------------------------
    // Utilities
    // -------------------------------------------------------------------------

    #[test]
    fn events_filtered_by_type_case_insensitively() {
        let mut events = vec![make_event(0, 20.0, 100 * MB, 40 * MB)];
        let mut full = make_event(120_000, 900.0, 100 * MB, 20 * MB);
        full.label = "Pause Full".to_string();
        full.is_major = true;
        events.push(full);
        let timeline = make_timeline(events);

        assert_eq!(events_by_type(&timeline, "full").len(), 1);
        assert_eq!(events_by_type(&timeline, "PAUSE").len(), 2);
        assert!(events_by_type(&timeline, "concurrent").is_empty());
    }

    #[test]
    fn type_distribution_counts_labels() {
        let mut events = vec![
            make_event(0, 20.0, 100 * MB, 40 * MB),
            make_event(60_000, 20.0, 100 * MB, 40 * MB),
        ];
        let mut full = make_event(120_000, 900.0, 100 * MB, 20 * MB);
        full.label = "Pause Full".to_string();
        events.push(full);
        let timeline = make_timeline(events);

        let distribution = type_distribution(&timeline);
        assert_eq!(distribution.get("Pause Young (Normal)"), Some(&2));
        assert_eq!(distribution.get("Pause Full"), Some(&1));
    }
}
