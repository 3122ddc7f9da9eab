// GCLens - core/grammar.rs
//
// Collector-family detection and the per-family line grammars.
// Core layer: accepts lines, never touches the filesystem.
//
// Each supported family is described by one `FamilyGrammar` entry in a
// static table: a cheap keyword pre-filter, a compiled line pattern with
// named capture groups, the major-collection markers, and a shape tag
// telling the parser loop how the captures map onto event fields. The
// parser itself (core::parser) is a single generic loop over this data.

use regex::Regex;
use std::sync::OnceLock;

use crate::core::model::CollectorFamily;

// =============================================================================
// Family detection
// =============================================================================

// Lowercased substrings that identify a family. Flag markers come from
// explicit -XX collector selection lines and always win over keywords.
const G1_FLAGS: &[&str] = &["-xx:+useg1gc"];
const Z_FLAGS: &[&str] = &["-xx:+usezgc"];
const PARALLEL_FLAGS: &[&str] = &["-xx:+useparallelgc"];

const G1_KEYWORDS: &[&str] = &["g1", "garbage-first"];
const Z_KEYWORDS: &[&str] = &["zgc", "z garbage"];
const PARALLEL_KEYWORDS: &[&str] = &["parallelgc", " ps "];

/// Classifies a log's collector family from textual markers.
///
/// Scans lines in order. The first line carrying an explicit collector
/// flag decides immediately; otherwise the first keyword match decides.
/// Matching is case-insensitive. Defaults to G1, the JVM default
/// collector, when no marker is found.
pub fn detect_family(lines: &[&str]) -> CollectorFamily {
    let mut keyword_match: Option<CollectorFamily> = None;

    for line in lines {
        let lower = line.to_lowercase();

        if let Some(family) = flag_family(&lower) {
            tracing::debug!(family = %family, "Collector flag line found");
            return family;
        }

        if keyword_match.is_none() {
            keyword_match = keyword_family(&lower);
        }
    }

    let family = keyword_match.unwrap_or_default();
    tracing::debug!(family = %family, "Collector family detected");
    family
}

fn flag_family(lower: &str) -> Option<CollectorFamily> {
    if G1_FLAGS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::G1)
    } else if Z_FLAGS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::Z)
    } else if PARALLEL_FLAGS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::Parallel)
    } else {
        None
    }
}

fn keyword_family(lower: &str) -> Option<CollectorFamily> {
    if G1_KEYWORDS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::G1)
    } else if Z_KEYWORDS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::Z)
    } else if PARALLEL_KEYWORDS.iter().any(|m| lower.contains(m)) {
        Some(CollectorFamily::Parallel)
    } else {
        None
    }
}

// =============================================================================
// Grammar table
// =============================================================================

/// How a grammar's captures map onto event fields.
///
/// The variants carry only what differs between families; everything
/// shared (pre-filter, line pattern, major markers) lives on
/// `FamilyGrammar` itself.
#[derive(Debug)]
pub enum GrammarShape {
    /// Heap triple with per-field K/M suffix (bare numbers are bytes),
    /// parenthesised cause, duration in seconds. An optional young/old
    /// generation block is matched by a second pattern on the same line.
    G1Heap { generations: Regex },

    /// Heap triple in KB (an explicit K suffix is tolerated), duration
    /// in seconds. The line carries no cause of its own.
    ParallelHeap { default_cause: &'static str },

    /// Phase label and duration in milliseconds. The heap triple is
    /// optional, in MB (an explicit M suffix is tolerated).
    ZPhase {
        label_prefix: &'static str,
        default_cause: &'static str,
    },
}

/// One collector family's line grammar.
#[derive(Debug)]
pub struct FamilyGrammar {
    pub family: CollectorFamily,

    /// Cheap pre-filter: every `require` substring must appear and no
    /// `reject` substring may appear before the line pattern is tried.
    pub require: &'static [&'static str],
    pub reject: &'static [&'static str],

    /// Compiled extraction pattern with named capture groups.
    pub line: Regex,

    /// Substrings of the event label that mark a major collection.
    pub major_markers: &'static [&'static str],

    /// Capture-to-field mapping tag.
    pub shape: GrammarShape,
}

impl FamilyGrammar {
    /// Cheap keyword test applied before full extraction is attempted.
    pub fn matches_prefilter(&self, line: &str) -> bool {
        self.require.iter().all(|m| line.contains(m))
            && !self.reject.iter().any(|m| line.contains(m))
    }

    /// Whether an extracted label denotes a major collection.
    ///
    /// For ZGC this is an approximation: Mark and Relocate pauses are
    /// counted as major because Z has no generational full-GC notion.
    pub fn is_major(&self, label: &str) -> bool {
        self.major_markers.iter().any(|m| label.contains(m))
    }
}

// The cause may end in a literal "()" (System.gc()); it must stay inside
// the capture so the system-trigger flag can be derived from it.
const G1_LINE: &str = r"\[(?P<timestamp>\d+\.\d+)s\]\[info\]\[gc[^\]]*\]\s+(?P<label>.*?)\s+\((?P<cause>[^)]*(?:\(\))?)\)\s+(?P<before>\d+)(?P<before_unit>[KM])?->(?P<after>\d+)(?P<after_unit>[KM])?\((?P<committed>\d+)(?P<committed_unit>[KM])?\)\s+(?P<duration>\d+\.\d+)s";

const G1_GENERATIONS: &str = r"\[(?P<young_before>\d+)K->(?P<young_after>\d+)K\(\d+K\)\]\s+\[(?P<old_before>\d+)K->(?P<old_after>\d+)K\(\d+K\)\]";

const Z_LINE: &str = r"\[(?P<timestamp>\d+\.\d+)s\]\[info\]\[gc[^\]]*\]\s+(?P<phase>.*?)(?:\s+(?P<before>\d+)M?->(?P<after>\d+)M?\((?P<committed>\d+)M?\))?\s+(?P<duration>\d+\.\d+)ms";

const PARALLEL_LINE: &str = r"\[(?P<timestamp>\d+\.\d+)s\]\s+\[(?P<label>.*?GC)\]\s+(?P<before>\d+)K?->(?P<after>\d+)K?\((?P<committed>\d+)K?\),\s+(?P<duration>\d+\.\d+) secs";

static GRAMMARS: OnceLock<Vec<FamilyGrammar>> = OnceLock::new();

/// The built-in grammar table, compiled once on first use.
pub fn builtin_grammars() -> &'static [FamilyGrammar] {
    GRAMMARS.get_or_init(|| {
        vec![
            FamilyGrammar {
                family: CollectorFamily::G1,
                require: &["[gc"],
                reject: &["ergo"],
                line: compile(G1_LINE),
                major_markers: &["Full", "Mixed", "Remark"],
                shape: GrammarShape::G1Heap {
                    generations: compile(G1_GENERATIONS),
                },
            },
            FamilyGrammar {
                family: CollectorFamily::Z,
                require: &["[gc", "Pause"],
                reject: &[],
                line: compile(Z_LINE),
                major_markers: &["Mark", "Relocate"],
                shape: GrammarShape::ZPhase {
                    label_prefix: "ZGC ",
                    default_cause: "Allocation",
                },
            },
            FamilyGrammar {
                family: CollectorFamily::Parallel,
                require: &["GC", "secs"],
                reject: &[],
                line: compile(PARALLEL_LINE),
                major_markers: &["Full"],
                shape: GrammarShape::ParallelHeap {
                    default_cause: "Allocation Failure",
                },
            },
        ]
    })
}

/// Looks up the grammar for a detected family.
pub fn grammar_for(family: CollectorFamily) -> &'static FamilyGrammar {
    // The table covers every CollectorFamily variant, so the lookup
    // cannot fail.
    builtin_grammars()
        .iter()
        .find(|g| g.family == family)
        .expect("grammar table covers every collector family")
}

// Patterns are static literals; a failure to compile is a bug in this
// table, not a runtime condition.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in grammar pattern must compile")
}

// =============================================================================
// Tests
// =============================================================================
