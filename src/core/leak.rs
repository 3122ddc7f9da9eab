// GCLens - core/leak.rs
//
// Memory leak detection over a parsed GC timeline. Four independent
// strategies score the filtered major-GC series; the caller reduces
// their findings by maximum confidence with a fixed tie-break order
// (linear, exponential, stepping, efficiency decline), so an earlier
// strategy keeps the verdict on equal confidence. Strategies never
// share mutable state and each returns a self-contained finding.

use crate::core::analyzer::linear_regression;
use crate::core::model::{AnalysisConfig, GcEvent, GcTimeline, LeakPattern, LeakResult};
use crate::util::constants::{
    BYTES_PER_MB, EFFICIENCY_CONFIDENCE, EFFICIENCY_DROP_THRESHOLD, EFFICIENCY_MIN_EVENTS,
    EXPONENTIAL_CONFIDENCE, EXPONENTIAL_MIN_POINTS, EXPONENTIAL_MIN_RATES, LINEAR_CONFIDENCE_CAP,
    LINEAR_MIN_POINTS, LINEAR_MIN_R_SQUARED, LINEAR_SUSPECT_CONFIDENCE, MS_PER_MINUTE,
    QUICK_CHECK_MIN_MAJOR, STEPPING_CONFIDENCE_CAP, STEPPING_CONFIDENCE_PER_STEP,
    STEPPING_JUMP_RATIO, STEPPING_MIN_POINTS, STEPPING_MIN_STEPS, STEPPING_PLATEAU_TOLERANCE,
};

const NO_LEAK_EVIDENCE: &str = "No strong evidence of memory leak detected";

/// One strategy's immutable verdict over the event series.
#[derive(Debug)]
struct StrategyFinding<'a> {
    pattern: LeakPattern,
    confidence: f64,
    growth_rate_bytes_per_min: f64,
    suspicious: Vec<&'a GcEvent>,
}

/// Runs all four leak strategies and reduces them to one verdict.
///
/// The strategies score the "filtered set": major-GC events with a
/// known positive heap-before reading. Below `config.min_leak_events`
/// filtered events, the detector reports not-detected with zero
/// confidence rather than guessing from a thin sample.
pub fn detect_memory_leak<'a>(
    timeline: &'a GcTimeline,
    config: &AnalysisConfig,
) -> LeakResult<'a> {
    let filtered: Vec<&GcEvent> = timeline
        .events
        .iter()
        .filter(|e| e.is_major && e.heap_before > 0)
        .collect();

    tracing::debug!(
        total = timeline.events.len(),
        filtered = filtered.len(),
        "Leak detection started"
    );

    if filtered.len() < config.min_leak_events {
        return LeakResult {
            detected: false,
            confidence: 0.0,
            pattern: None,
            growth_rate_bytes_per_min: 0.0,
            description: format!(
                "Insufficient data for leak detection (need at least {} events)",
                config.min_leak_events
            ),
            suspicious_events: Vec::new(),
            events_analyzed: filtered.len(),
        };
    }

    let events_analyzed = filtered.len();
    let findings = [
        linear_growth(&filtered),
        exponential_growth(&filtered),
        stepping_growth(&filtered),
        efficiency_decline(&timeline.events),
    ];

    // Strictly-greater replacement: on a confidence tie the earlier
    // strategy in the fixed order keeps the verdict.
    let mut best: Option<StrategyFinding<'a>> = None;
    for finding in findings.into_iter().flatten() {
        let replaces = match &best {
            None => true,
            Some(current) => finding.confidence > current.confidence,
        };
        if replaces {
            best = Some(finding);
        }
    }

    match best {
        Some(finding) => {
            let detected = finding.confidence >= config.leak_confidence_threshold;
            tracing::debug!(
                pattern = %finding.pattern,
                confidence = finding.confidence,
                detected,
                "Leak detection finished"
            );
            let description = if detected {
                describe(&finding)
            } else {
                NO_LEAK_EVIDENCE.to_string()
            };
            LeakResult {
                detected,
                confidence: finding.confidence,
                pattern: Some(finding.pattern),
                growth_rate_bytes_per_min: finding.growth_rate_bytes_per_min,
                description,
                suspicious_events: finding.suspicious,
                events_analyzed,
            }
        }
        None => LeakResult {
            detected: false,
            confidence: 0.0,
            pattern: None,
            growth_rate_bytes_per_min: 0.0,
            description: NO_LEAK_EVIDENCE.to_string(),
            suspicious_events: Vec::new(),
            events_analyzed,
        },
    }
}

/// Cheap near-real-time probe: true iff at least three qualifying
/// major-GC events exist and heap-after is strictly increasing across
/// all of them. No regression on purpose.
pub fn quick_leak_check(recent_events: &[GcEvent]) -> bool {
    let majors: Vec<&GcEvent> = recent_events
        .iter()
        .filter(|e| e.is_major && e.heap_before > 0)
        .collect();
    if majors.len() < QUICK_CHECK_MIN_MAJOR {
        return false;
    }
    majors.windows(2).all(|pair| pair[1].heap_after > pair[0].heap_after)
}

// =============================================================================
// Strategies
// =============================================================================

/// Ordinary-least-squares fit of heap-after against elapsed minutes.
/// Accepted only with a positive slope and R-squared above 0.6.
fn linear_growth<'a>(filtered: &[&'a GcEvent]) -> Option<StrategyFinding<'a>> {
    if filtered.len() < LINEAR_MIN_POINTS {
        return None;
    }

    let t0 = filtered[0].timestamp_ms as f64;
    let points: Vec<(f64, f64)> = filtered
        .iter()
        .map(|e| {
            (
                (e.timestamp_ms as f64 - t0) / MS_PER_MINUTE,
                e.heap_after as f64,
            )
        })
        .collect();

    let fit = linear_regression(&points)?;
    if fit.slope <= 0.0 || fit.r_squared <= LINEAR_MIN_R_SQUARED {
        return None;
    }

    let confidence = fit.r_squared.min(LINEAR_CONFIDENCE_CAP);
    let suspicious = if confidence > LINEAR_SUSPECT_CONFIDENCE {
        filtered[filtered.len() / 2..].to_vec()
    } else {
        Vec::new()
    };

    Some(StrategyFinding {
        pattern: LeakPattern::Linear,
        confidence,
        growth_rate_bytes_per_min: fit.slope,
        suspicious,
    })
}

/// Accelerating growth: a strict majority of consecutive pair-wise
/// growth rates must increase, with at least one positive rate.
fn exponential_growth<'a>(filtered: &[&'a GcEvent]) -> Option<StrategyFinding<'a>> {
    if filtered.len() < EXPONENTIAL_MIN_POINTS {
        return None;
    }

    let mut rates = Vec::with_capacity(filtered.len() - 1);
    for pair in filtered.windows(2) {
        let minutes = (pair[1].timestamp_ms as f64 - pair[0].timestamp_ms as f64) / MS_PER_MINUTE;
        if minutes <= 0.0 {
            continue;
        }
        let delta = pair[1].heap_after as f64 - pair[0].heap_after as f64;
        rates.push(delta / minutes);
    }
    if rates.len() < EXPONENTIAL_MIN_RATES {
        return None;
    }

    let increases = rates.windows(2).filter(|w| w[1] > w[0]).count();
    let accelerating = increases * 2 > rates.len() - 1;
    if !accelerating || !rates.iter().any(|r| *r > 0.0) {
        return None;
    }

    Some(StrategyFinding {
        pattern: LeakPattern::Exponential,
        confidence: EXPONENTIAL_CONFIDENCE,
        growth_rate_bytes_per_min: *rates.last()?,
        suspicious: Vec::new(),
    })
}

/// Staircase growth: a plateau (under 5% movement) immediately followed
/// by a jump (over 10% increase). Each jump's target event is
/// suspicious.
fn stepping_growth<'a>(filtered: &[&'a GcEvent]) -> Option<StrategyFinding<'a>> {
    if filtered.len() < STEPPING_MIN_POINTS {
        return None;
    }

    let mut steps = 0usize;
    let mut suspicious = Vec::new();
    for i in 1..filtered.len() - 1 {
        let prev = filtered[i - 1].heap_after as f64;
        let curr = filtered[i].heap_after as f64;
        let next = filtered[i + 1].heap_after as f64;
        let plateau = (curr - prev).abs() < prev * STEPPING_PLATEAU_TOLERANCE;
        let jump = next > curr * STEPPING_JUMP_RATIO;
        if plateau && jump {
            steps += 1;
            suspicious.push(filtered[i + 1]);
        }
    }
    if steps < STEPPING_MIN_STEPS {
        return None;
    }

    let confidence = (steps as f64 * STEPPING_CONFIDENCE_PER_STEP).min(STEPPING_CONFIDENCE_CAP);
    let first = filtered[0];
    let last = filtered[filtered.len() - 1];
    let minutes = (last.timestamp_ms as f64 - first.timestamp_ms as f64) / MS_PER_MINUTE;
    let growth_rate_bytes_per_min = if minutes > 0.0 {
        (last.heap_after as f64 - first.heap_after as f64) / minutes
    } else {
        0.0
    };

    Some(StrategyFinding {
        pattern: LeakPattern::Stepping,
        confidence,
        growth_rate_bytes_per_min,
        suspicious,
    })
}

/// Declining collection efficiency across the whole timeline, majors
/// and minors alike. Fires when mean efficiency drops by more than 0.2
/// between the first and second halves.
fn efficiency_decline(events: &[GcEvent]) -> Option<StrategyFinding<'_>> {
    if events.len() < EFFICIENCY_MIN_EVENTS {
        return None;
    }

    let efficiencies: Vec<f64> = events
        .iter()
        .filter(|e| e.heap_before > 0)
        .map(|e| e.heap_freed() as f64 / e.heap_before as f64)
        .collect();
    if efficiencies.len() < 2 {
        return None;
    }

    let half = efficiencies.len() / 2;
    let early = efficiencies[..half].iter().sum::<f64>() / half as f64;
    let late = efficiencies[half..].iter().sum::<f64>() / (efficiencies.len() - half) as f64;
    if early - late <= EFFICIENCY_DROP_THRESHOLD {
        return None;
    }

    let suspicious = events
        .iter()
        .filter(|e| e.heap_before > 0 && (e.heap_freed() as f64 / e.heap_before as f64) < late)
        .collect();

    Some(StrategyFinding {
        pattern: LeakPattern::EfficiencyDecline,
        confidence: EFFICIENCY_CONFIDENCE,
        growth_rate_bytes_per_min: 0.0,
        suspicious,
    })
}

/// Verdict text for the winning pattern, with confidence as a
/// percentage and growth in MB per minute.
fn describe(finding: &StrategyFinding<'_>) -> String {
    let confidence_pct = finding.confidence * 100.0;
    let growth_mb = finding.growth_rate_bytes_per_min / BYTES_PER_MB as f64;
    match finding.pattern {
        LeakPattern::Linear => format!(
            "Linear memory leak detected ({confidence_pct:.1}% confidence). \
             Heap growing at {growth_mb:.2} MB/minute. \
             This suggests consistent object accumulation."
        ),
        LeakPattern::Exponential => format!(
            "Exponential memory leak detected ({confidence_pct:.1}% confidence). \
             Growth rate accelerating. \
             This suggests unbounded data structure growth."
        ),
        LeakPattern::Stepping => format!(
            "Stepping memory leak detected ({confidence_pct:.1}% confidence). \
             Memory grows in distinct steps. \
             This suggests cache-like behavior or periodic allocations."
        ),
        LeakPattern::EfficiencyDecline => format!(
            "Memory efficiency declining ({confidence_pct:.1}% confidence). \
             GC becoming less effective over time. \
             This suggests fragmentation or changing allocation patterns."
        ),
    }
}

// =============================================================================
// Tests
// =============================================================================
