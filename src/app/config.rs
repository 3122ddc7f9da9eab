// GCLens - app/config.rs
//
// config.toml loading and validation, plus platform config directory
// resolution via the `directories` crate (XDG on Linux, AppData on
// Windows, Library on macOS).
//
// Unknown keys are silently ignored for forward compatibility. Every
// value is validated against named constants at load time; invalid
// values produce actionable warnings and fall back to defaults.

use crate::core::model::AnalysisConfig;
use crate::util::constants;
use crate::util::error::{ConfigError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

// =============================================================================
// Raw TOML shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[thresholds]` section.
    pub thresholds: ThresholdsSection,
    /// `[leak]` section.
    pub leak: LeakSection,
    /// `[discovery]` section.
    pub discovery: DiscoverySection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[thresholds]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ThresholdsSection {
    /// Pause duration above which a pause counts as long, in ms.
    pub long_pause_ms: Option<u64>,
    /// Pause duration above which a pause counts as critical, in ms.
    pub critical_pause_ms: Option<u64>,
    /// GC time percentage above which HIGH_GC_TIME fires.
    pub gc_time_percent: Option<f64>,
    /// Average memory efficiency below which LOW_MEMORY_EFFICIENCY fires.
    pub memory_efficiency_percent: Option<f64>,
}

/// `[leak]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LeakSection {
    /// Overall confidence at or above which a leak is reported.
    pub confidence_threshold: Option<f64>,
    /// Minimum qualifying major-GC events before strategies run.
    pub min_events: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
    /// Maximum files to analyse per run.
    pub max_files: Option<usize>,
    /// Include glob patterns.
    pub include_patterns: Option<Vec<String>>,
    /// Exclude glob patterns.
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Immutable analysis thresholds handed to the core per call.
    pub analysis: AnalysisConfig,

    // -- Discovery --
    /// Maximum directory recursion depth.
    pub max_depth: usize,
    /// Maximum files to analyse per run.
    pub max_files: usize,
    /// Include glob patterns.
    pub include_patterns: Vec<String>,
    /// Exclude glob patterns.
    pub exclude_patterns: Vec<String>,

    // -- Logging --
    /// Logging level string (consumed before tracing is initialised).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            log_level: None,
        }
    }
}

/// Resolve the platform config directory, falling back to the current
/// directory when platform dirs cannot be determined.
pub fn resolve_config_dir() -> PathBuf {
    match ProjectDirs::from("", "", constants::APP_ID) {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => {
            tracing::warn!("Could not determine platform directories, using current directory");
            PathBuf::from(".")
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns defaults with no warnings when the file does not exist
/// (first run). An unreadable or unparseable file yields defaults plus
/// a warning: the run still proceeds, the user is informed.
pub fn load_default_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    let (config, mut validation_warnings) = validate(raw);
    warnings.append(&mut validation_warnings);
    (config, warnings)
}

/// Load and validate a config file at an explicitly given path.
///
/// Unlike the default location, an explicit `--config` file that cannot
/// be read or parsed is a hard error: the user named it on purpose.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>)> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Loaded config file");
    Ok(validate(raw))
}

// =============================================================================
// Validation
// =============================================================================

/// Validate each field against named constants, accumulating all
/// warnings rather than stopping at the first.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Thresholds: long_pause_ms --
    if let Some(ms) = raw.thresholds.long_pause_ms {
        if (1..=constants::MAX_LONG_PAUSE_MS).contains(&ms) {
            config.analysis.long_pause_ms = ms;
        } else {
            warnings.push(format!(
                "[thresholds] long_pause_ms = {ms} is out of range (1-{}). Using default ({}).",
                constants::MAX_LONG_PAUSE_MS,
                constants::DEFAULT_LONG_PAUSE_MS,
            ));
        }
    }

    // -- Thresholds: critical_pause_ms --
    if let Some(ms) = raw.thresholds.critical_pause_ms {
        if (1..=constants::MAX_CRITICAL_PAUSE_MS).contains(&ms) {
            config.analysis.critical_pause_ms = ms;
        } else {
            warnings.push(format!(
                "[thresholds] critical_pause_ms = {ms} is out of range (1-{}). Using default ({}).",
                constants::MAX_CRITICAL_PAUSE_MS,
                constants::DEFAULT_CRITICAL_PAUSE_MS,
            ));
        }
    }

    // -- Thresholds: gc_time_percent --
    if let Some(pct) = raw.thresholds.gc_time_percent {
        if pct > 0.0 && pct <= 100.0 {
            config.analysis.gc_time_percent = pct;
        } else {
            warnings.push(format!(
                "[thresholds] gc_time_percent = {pct} is out of range (0-100]. Using default ({}).",
                constants::DEFAULT_GC_TIME_PERCENT,
            ));
        }
    }

    // -- Thresholds: memory_efficiency_percent --
    if let Some(pct) = raw.thresholds.memory_efficiency_percent {
        if (0.0..=100.0).contains(&pct) {
            config.analysis.memory_efficiency_percent = pct;
        } else {
            warnings.push(format!(
                "[thresholds] memory_efficiency_percent = {pct} is out of range (0-100). \
                 Using default ({}).",
                constants::DEFAULT_MEMORY_EFFICIENCY_PERCENT,
            ));
        }
    }

    // -- Leak: confidence_threshold --
    if let Some(threshold) = raw.leak.confidence_threshold {
        if (0.0..=1.0).contains(&threshold) {
            config.analysis.leak_confidence_threshold = threshold;
        } else {
            warnings.push(format!(
                "[leak] confidence_threshold = {threshold} is out of range (0-1). \
                 Using default ({}).",
                constants::DEFAULT_LEAK_CONFIDENCE_THRESHOLD,
            ));
        }
    }

    // -- Leak: min_events --
    if let Some(events) = raw.leak.min_events {
        if (constants::MIN_LEAK_EVENTS_FLOOR..=constants::MAX_LEAK_EVENTS_CEILING)
            .contains(&events)
        {
            config.analysis.min_leak_events = events;
        } else {
            warnings.push(format!(
                "[leak] min_events = {events} is out of range ({}-{}). Using default ({}).",
                constants::MIN_LEAK_EVENTS_FLOOR,
                constants::MAX_LEAK_EVENTS_CEILING,
                constants::DEFAULT_MIN_LEAK_EVENTS,
            ));
        }
    }

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(format!(
                "[discovery] max_depth = {depth} is out of range (1-{}). Using default ({}).",
                constants::ABSOLUTE_MAX_DEPTH,
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Discovery: max_files --
    if let Some(files) = raw.discovery.max_files {
        if (1..=constants::ABSOLUTE_MAX_FILES).contains(&files) {
            config.max_files = files;
        } else {
            warnings.push(format!(
                "[discovery] max_files = {files} is out of range (1-{}). Using default ({}).",
                constants::ABSOLUTE_MAX_FILES,
                constants::DEFAULT_MAX_FILES,
            ));
        }
    }

    // -- Discovery: patterns --
    // Pattern strings are accepted as-is; globs that fail to compile are
    // warned about and skipped at discovery time.
    if let Some(patterns) = raw.discovery.include_patterns {
        config.include_patterns = patterns;
    }
    if let Some(patterns) = raw.discovery.exclude_patterns {
        config.exclude_patterns = patterns;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

// =============================================================================
// Tests
// =============================================================================
