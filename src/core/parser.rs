// GCLens - core/parser.rs
//
// Generic GC log parsing driven by the family grammar table.
// Core layer: accepts lines, never touches the filesystem.
//
// One loop serves all collector families. The family's `FamilyGrammar`
// entry supplies the pre-filter, the compiled line pattern and a shape
// tag; the loop interprets the shape tag to map captures onto event
// fields. Parsing is best-effort and lossy by contract: a candidate
// line that fails extraction is recorded as a diagnostic and skipped,
// never aborting the batch.

use regex::Captures;

use crate::core::grammar::{detect_family, grammar_for, FamilyGrammar, GrammarShape};
use crate::core::model::{GcEvent, GcTimeline};
use crate::util::constants::{BYTES_PER_KB, BYTES_PER_MB, DEBUG_MAX_LINE_PREVIEW, MAX_PARSE_ERRORS};
use crate::util::error::ParseError;

/// Result of parsing one log's lines into a timeline.
#[derive(Debug)]
pub struct ParseResult {
    /// Number of events appended to the timeline.
    pub events_parsed: usize,

    /// Diagnostics for candidate lines that failed extraction
    /// (capped at MAX_PARSE_ERRORS).
    pub errors: Vec<ParseError>,

    /// Total lines processed.
    pub lines_processed: u64,
}

/// Detects the collector family and parses `content` into a fresh timeline.
///
/// Convenience wrapper over `detect_family` + `parse_lines` for callers
/// holding a whole log in memory.
pub fn parse_content(content: &str) -> (GcTimeline, ParseResult) {
    let lines: Vec<&str> = content.lines().collect();
    let family = detect_family(&lines);
    let mut timeline = GcTimeline::new(family);
    let result = parse_lines(&lines, &mut timeline);
    (timeline, result)
}

/// Parses lines with the grammar of the timeline's family, appending
/// events as a side effect.
///
/// Also captures the JVM version opportunistically from a header line.
/// Aggregate rollups are recomputed once at the end, so the timeline is
/// ready for analysis when this returns.
pub fn parse_lines(lines: &[&str], timeline: &mut GcTimeline) -> ParseResult {
    let grammar = grammar_for(timeline.family);

    tracing::debug!(
        family = %timeline.family,
        lines = lines.len(),
        "Parsing started"
    );

    let mut errors: Vec<ParseError> = Vec::new();
    let mut events_parsed = 0usize;
    let mut lines_processed = 0u64;

    for (line_idx, line) in lines.iter().enumerate() {
        lines_processed += 1;
        let line_number = (line_idx as u64) + 1;

        if timeline.jvm_version.is_none() {
            if let Some(version) = extract_jvm_version(line) {
                tracing::debug!(version = %version, "JVM version captured");
                timeline.jvm_version = Some(version);
            }
        }

        if line.trim().is_empty() || !grammar.matches_prefilter(line) {
            continue;
        }

        match grammar.line.captures(line) {
            Some(caps) => match build_event(grammar, &caps, line, line_number) {
                Ok(event) => {
                    timeline.push(event);
                    events_parsed += 1;
                }
                Err(e) => push_error(&mut errors, e),
            },
            None => {
                tracing::trace!(
                    line_number,
                    preview = %line_preview(line),
                    "Candidate line failed extraction"
                );
                push_error(
                    &mut errors,
                    ParseError::LineExtract {
                        line_number,
                        reason: "matched pre-filter but not the line grammar".to_string(),
                    },
                );
            }
        }
    }

    timeline.calculate_statistics();

    tracing::debug!(
        family = %timeline.family,
        events = events_parsed,
        errors = errors.len(),
        lines = lines_processed,
        "Parsing complete"
    );

    ParseResult {
        events_parsed,
        errors,
        lines_processed,
    }
}

fn push_error(errors: &mut Vec<ParseError>, error: ParseError) {
    if errors.len() < MAX_PARSE_ERRORS {
        errors.push(error);
    }
}

fn line_preview(line: &str) -> String {
    line.chars().take(DEBUG_MAX_LINE_PREVIEW).collect()
}

/// Captures the runtime version from a `java version "..."` header
/// line. The whole text from the marker onward is kept, so the build
/// date and LTS tag survive into the report.
fn extract_jvm_version(line: &str) -> Option<String> {
    const MARKER: &str = "java version";

    let idx = line.find(MARKER)?;
    Some(line[idx..].trim_end().to_string())
}

// =============================================================================
// Event construction
// =============================================================================

/// Builds one event from a line's captures according to the grammar shape.
fn build_event(
    grammar: &FamilyGrammar,
    caps: &Captures<'_>,
    line: &str,
    line_number: u64,
) -> Result<GcEvent, ParseError> {
    let timestamp_ms = (req_f64(caps, "timestamp", line_number)? * 1000.0).round() as u64;

    let (label, cause, heap, duration_ms, generations) = match &grammar.shape {
        GrammarShape::G1Heap { generations } => {
            let label = text(caps, "label");
            let cause = text(caps, "cause");
            let heap = (
                scaled_memory(
                    req_u64(caps, "before", line_number)?,
                    unit(caps, "before_unit"),
                ),
                scaled_memory(
                    req_u64(caps, "after", line_number)?,
                    unit(caps, "after_unit"),
                ),
                scaled_memory(
                    req_u64(caps, "committed", line_number)?,
                    unit(caps, "committed_unit"),
                ),
            );
            let duration_ms = req_f64(caps, "duration", line_number)? * 1000.0;
            let generations = generations
                .captures(line)
                .map(|gen_caps| parse_generations(&gen_caps, line_number))
                .transpose()?;
            (label, cause, heap, duration_ms, generations)
        }

        GrammarShape::ParallelHeap { default_cause } => {
            let label = text(caps, "label");
            let heap = (
                req_u64(caps, "before", line_number)?.saturating_mul(BYTES_PER_KB),
                req_u64(caps, "after", line_number)?.saturating_mul(BYTES_PER_KB),
                req_u64(caps, "committed", line_number)?.saturating_mul(BYTES_PER_KB),
            );
            let duration_ms = req_f64(caps, "duration", line_number)? * 1000.0;
            (label, default_cause.to_string(), heap, duration_ms, None)
        }

        GrammarShape::ZPhase {
            label_prefix,
            default_cause,
        } => {
            let label = format!("{}{}", label_prefix, text(caps, "phase"));
            let mb = |v: u64| v.saturating_mul(BYTES_PER_MB);
            let heap = (
                opt_u64(caps, "before", line_number)?.map(mb).unwrap_or(0),
                opt_u64(caps, "after", line_number)?.map(mb).unwrap_or(0),
                opt_u64(caps, "committed", line_number)?.map(mb).unwrap_or(0),
            );
            // Z durations are already in milliseconds.
            let duration_ms = req_f64(caps, "duration", line_number)?;
            (label, default_cause.to_string(), heap, duration_ms, None)
        }
    };

    let (young, old) = generations.unwrap_or(((0, 0), (0, 0)));
    let is_major = grammar.is_major(&label);
    let is_system = cause.contains("System.gc()");

    Ok(GcEvent {
        timestamp_ms,
        label,
        cause,
        heap_before: heap.0,
        heap_after: heap.1,
        heap_committed: heap.2,
        duration_ms,
        young_before: young.0,
        young_after: young.1,
        old_before: old.0,
        old_after: old.1,
        is_major,
        is_system,
    })
}

type GenerationSizes = ((u64, u64), (u64, u64));

fn parse_generations(
    gen_caps: &Captures<'_>,
    line_number: u64,
) -> Result<GenerationSizes, ParseError> {
    let kb = |v: u64| v.saturating_mul(BYTES_PER_KB);
    Ok((
        (
            kb(req_u64(gen_caps, "young_before", line_number)?),
            kb(req_u64(gen_caps, "young_after", line_number)?),
        ),
        (
            kb(req_u64(gen_caps, "old_before", line_number)?),
            kb(req_u64(gen_caps, "old_after", line_number)?),
        ),
    ))
}

// Memory suffix semantics: K is KiB, M is MiB, a bare number is bytes.
// Family-fixed units (Parallel KB, Z MB) are applied at the call sites.
fn scaled_memory(value: u64, unit: Option<&str>) -> u64 {
    match unit {
        Some("K") => value.saturating_mul(BYTES_PER_KB),
        Some("M") => value.saturating_mul(BYTES_PER_MB),
        _ => value,
    }
}

fn text(caps: &Captures<'_>, group: &'static str) -> String {
    caps.name(group)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn unit<'t>(caps: &Captures<'t>, group: &'static str) -> Option<&'t str> {
    caps.name(group).map(|m| m.as_str())
}

fn req_u64(caps: &Captures<'_>, field: &'static str, line_number: u64) -> Result<u64, ParseError> {
    let m = caps.name(field).ok_or_else(|| ParseError::LineExtract {
        line_number,
        reason: format!("missing capture group '{field}'"),
    })?;
    m.as_str()
        .parse::<u64>()
        .map_err(|_| ParseError::NumberParse {
            line_number,
            field,
            raw: m.as_str().to_string(),
        })
}

fn opt_u64(
    caps: &Captures<'_>,
    field: &'static str,
    line_number: u64,
) -> Result<Option<u64>, ParseError> {
    match caps.name(field) {
        None => Ok(None),
        Some(m) => m
            .as_str()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ParseError::NumberParse {
                line_number,
                field,
                raw: m.as_str().to_string(),
            }),
    }
}

fn req_f64(caps: &Captures<'_>, field: &'static str, line_number: u64) -> Result<f64, ParseError> {
    let m = caps.name(field).ok_or_else(|| ParseError::LineExtract {
        line_number,
        reason: format!("missing capture group '{field}'"),
    })?;
    m.as_str()
        .parse::<f64>()
        .map_err(|_| ParseError::NumberParse {
            line_number,
            field,
            raw: m.as_str().to_string(),
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::CollectorFamily;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn parse_as(family: CollectorFamily, lines: &[&str]) -> (GcTimeline, ParseResult) {
        let mut timeline = GcTimeline::new(family);
        let result = parse_lines(lines, &mut timeline);
        (timeline, result)
    }

    // -------------------------------------------------------------------------
    // G1
    // -------------------------------------------------------------------------

    #[test]
    fn g1_evacuation_pause_line() {
        let (timeline, result) = parse_as(
            CollectorFamily::G1,
            &["[1.234s][info][gc] G1 Evacuation Pause (Metadata GC Threshold) 100M->50M(200M) 0.050s"],
        );

        assert_eq!(result.events_parsed, 1);
        assert!(result.errors.is_empty());

        let event = &timeline.events[0];
        assert_eq!(event.timestamp_ms, 1234);
        assert_eq!(event.label, "G1 Evacuation Pause");
        assert_eq!(event.cause, "Metadata GC Threshold");
        assert_eq!(event.heap_before, 100 * 1024 * 1024);
        assert_eq!(event.heap_after, 50 * 1024 * 1024);
        assert_eq!(event.heap_committed, 200 * 1024 * 1024);
        assert!(approx(event.duration_ms, 50.0));
        assert!(!event.is_major);
        assert!(!event.is_system);
    }

    #[test]
    fn g1_kilobyte_triple_round_trip() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &["[2.000s][info][gc] Pause Young (Evacuation Pause) 512000K->256000K(1024000K) 0.123s"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.heap_before, 512000 * 1024);
        assert_eq!(event.heap_after, 256000 * 1024);
        assert_eq!(event.heap_committed, 1024000 * 1024);
        assert!(approx(event.duration_ms, 123.0));
    }

    #[test]
    fn g1_full_gc_from_system_gc_call() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &["[5.678s][info][gc] Pause Full (System.gc()) 300M->100M(512M) 1.234s"],
        );

        let event = &timeline.events[0];
        assert!(event.is_major, "Full pause must be classed major");
        assert!(event.is_system, "System.gc() cause must set the system flag");
        assert!(approx(event.duration_ms, 1234.0));
    }

    #[test]
    fn g1_mixed_and_remark_are_major() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &[
                "[3.000s][info][gc] Pause Young (Mixed) (G1 Evacuation Pause) 80M->40M(200M) 0.030s",
                "[4.000s][info][gc] Pause Remark (G1 Remark) 60M->60M(200M) 0.010s",
            ],
        );

        assert!(timeline.events[0].is_major);
        assert!(timeline.events[1].is_major);
    }

    #[test]
    fn g1_generation_block_is_extracted() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &["[6.000s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 90M->45M(200M) 0.040s [1024K->512K(2048K)] [4096K->4100K(8192K)]"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.young_before, 1024 * 1024);
        assert_eq!(event.young_after, 512 * 1024);
        assert_eq!(event.old_before, 4096 * 1024);
        assert_eq!(event.old_after, 4100 * 1024);
    }

    #[test]
    fn g1_skips_ergonomics_and_flags_unmatched_candidates() {
        let (timeline, result) = parse_as(
            CollectorFamily::G1,
            &[
                "[0.050s][info][gc,ergo] Request concurrent cycle initiation",
                "[0.100s][info][gc,init] Using G1",
                "[1.000s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 10M->5M(100M) 0.020s",
            ],
        );

        // The ergo line is pre-filtered out entirely; the init line is a
        // candidate that fails extraction and becomes a diagnostic.
        assert_eq!(timeline.events.len(), 1);
        assert_eq!(result.events_parsed, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.lines_processed, 3);
    }

    #[test]
    fn jvm_version_is_captured_once() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &[
                r#"java version "17.0.8" 2023-07-18"#,
                r#"java version "99.9.9" later line must not win"#,
                "[1.000s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 10M->5M(100M) 0.020s",
            ],
        );

        // The whole header text from the marker onward is kept.
        assert_eq!(
            timeline.jvm_version.as_deref(),
            Some(r#"java version "17.0.8" 2023-07-18"#)
        );
    }

    #[test]
    fn jvm_version_keeps_text_from_marker_onward() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &[r#"openjdk build banner: java version "21.0.1" 2023-10-17 LTS  "#],
        );

        // A prefix before the marker is dropped, trailing whitespace too.
        assert_eq!(
            timeline.jvm_version.as_deref(),
            Some(r#"java version "21.0.1" 2023-10-17 LTS"#)
        );
    }

    // -------------------------------------------------------------------------
    // ZGC
    // -------------------------------------------------------------------------

    #[test]
    fn z_pause_line_without_heap() {
        let (timeline, result) = parse_as(
            CollectorFamily::Z,
            &["[1.500s][info][gc] GC(3) Pause Mark Start 45.0ms"],
        );

        assert_eq!(result.events_parsed, 1);
        let event = &timeline.events[0];
        assert_eq!(event.timestamp_ms, 1500);
        assert_eq!(event.label, "ZGC GC(3) Pause Mark Start");
        assert_eq!(event.cause, "Allocation");
        assert!(approx(event.duration_ms, 45.0));
        assert_eq!(event.heap_before, 0);
        assert_eq!(event.heap_after, 0);
        assert!(event.is_major, "Mark pause counts as major");
    }

    #[test]
    fn z_pause_line_with_heap_triple() {
        let (timeline, _) = parse_as(
            CollectorFamily::Z,
            &["[3.000s][info][gc] GC(5) Pause Relocate Start 914M->176M(2048M) 0.010ms"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.label, "ZGC GC(5) Pause Relocate Start");
        assert_eq!(event.heap_before, 914 * 1024 * 1024);
        assert_eq!(event.heap_after, 176 * 1024 * 1024);
        assert_eq!(event.heap_committed, 2048 * 1024 * 1024);
        assert!(event.is_major);
    }

    #[test]
    fn z_bare_heap_numbers_are_megabytes() {
        let (timeline, _) = parse_as(
            CollectorFamily::Z,
            &["[4.000s][info][gc] GC(6) Pause Mark End 914->176(2048) 0.008ms"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.heap_before, 914 * 1024 * 1024);
        assert_eq!(event.heap_after, 176 * 1024 * 1024);
    }

    #[test]
    fn z_non_pause_lines_are_ignored() {
        let (timeline, result) = parse_as(
            CollectorFamily::Z,
            &["[2.000s][info][gc] GC(4) Garbage Collection (Allocation Rate) 914M->176M(2048M)"],
        );

        assert!(timeline.events.is_empty());
        assert!(result.errors.is_empty(), "non-candidates are not diagnostics");
    }

    // -------------------------------------------------------------------------
    // Parallel
    // -------------------------------------------------------------------------

    #[test]
    fn parallel_minor_collection_line() {
        let (timeline, result) = parse_as(
            CollectorFamily::Parallel,
            &["[12.345s] [GC] 512000K->256000K(1024000K), 0.1234 secs"],
        );

        assert_eq!(result.events_parsed, 1);
        let event = &timeline.events[0];
        assert_eq!(event.timestamp_ms, 12345);
        assert_eq!(event.label, "GC");
        assert_eq!(event.cause, "Allocation Failure");
        assert_eq!(event.heap_before, 512000 * 1024);
        assert_eq!(event.heap_after, 256000 * 1024);
        assert_eq!(event.heap_committed, 1024000 * 1024);
        assert!(approx(event.duration_ms, 123.4));
        assert!(!event.is_major);
    }

    #[test]
    fn parallel_full_gc_is_major() {
        let (timeline, _) = parse_as(
            CollectorFamily::Parallel,
            &["[20.000s] [Full GC] 800000K->100000K(1024000K), 2.5000 secs"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.label, "Full GC");
        assert!(event.is_major);
        assert!(approx(event.duration_ms, 2500.0));
    }

    #[test]
    fn parallel_bare_triple_is_kilobytes() {
        let (timeline, _) = parse_as(
            CollectorFamily::Parallel,
            &["[30.000s] [GC] 512000->256000(1024000), 0.0500 secs"],
        );

        let event = &timeline.events[0];
        assert_eq!(event.heap_before, 512000 * 1024);
        assert_eq!(event.heap_after, 256000 * 1024);
    }

    // -------------------------------------------------------------------------
    // Whole-content parsing
    // -------------------------------------------------------------------------

    #[test]
    fn parse_content_detects_family_and_parses() {
        let content = "\
[0.005s][info][gc,init] Using G1
[1.234s][info][gc] G1 Evacuation Pause (Metadata GC Threshold) 100M->50M(200M) 0.050s
[2.468s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 120M->60M(200M) 0.030s
";
        let (timeline, result) = parse_content(content);

        assert_eq!(timeline.family, CollectorFamily::G1);
        assert_eq!(result.events_parsed, 2);
        assert!(approx(timeline.total_gc_time_ms, 80.0));
        assert!(approx(timeline.max_pause_ms, 50.0));
    }

    #[test]
    fn empty_content_yields_empty_timeline() {
        let (timeline, result) = parse_content("");

        assert_eq!(timeline.family, CollectorFamily::G1);
        assert!(timeline.events.is_empty());
        assert_eq!(result.events_parsed, 0);
        assert_eq!(timeline.gc_time_percentage(), 0.0);
    }

    #[test]
    fn aggregates_are_computed_after_parse() {
        let (timeline, _) = parse_as(
            CollectorFamily::G1,
            &[
                "[1.000s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 100M->40M(200M) 0.100s",
                "[2.000s][info][gc] Pause Young (Normal) (G1 Evacuation Pause) 110M->50M(200M) 0.300s",
            ],
        );

        assert!(approx(timeline.total_gc_time_ms, 400.0));
        assert!(approx(timeline.average_pause_ms, 200.0));
        assert!(approx(timeline.max_pause_ms, 300.0));
        assert_eq!(timeline.total_heap_freed, (60 + 60) * 1024 * 1024);
    }
}
