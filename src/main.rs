// GCLens - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading (explicit file or per-user default)
// 3. Logging initialisation (debug mode support)
// 4. Pipeline dispatch and exit code

use clap::Parser;
use std::path::PathBuf;

use gclens::app::config;
use gclens::app::run::{self, OutputFormat, RunRequest};
use gclens::util;

/// GCLens - GC log analyser for the JVM.
///
/// Point GCLens at a GC log (or a directory of rotated logs) to parse it,
/// compute pause and throughput statistics, flag operational issues, and
/// score memory-leak patterns.
#[derive(Parser, Debug)]
#[command(name = "gclens", version, about)]
struct Cli {
    /// GC log file, or directory to scan for logs.
    path: PathBuf,

    /// Run the memory-leak detector report instead of the statistical report.
    #[arg(short = 'l', long = "leaks")]
    leaks: bool,

    /// Output format.
    #[arg(short = 'o', long = "output", value_enum, default_value = "text")]
    output: OutputFormat,

    /// Configuration file (defaults to the per-user config location).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Configuration is loaded before logging is initialised because the
    // config file may set the log level. An explicit --config that cannot
    // be loaded is fatal; the default location degrades to defaults.
    let loaded = match cli.config.as_deref() {
        Some(path) => config::load_config_file(path),
        None => Ok(config::load_default_config(&config::resolve_config_dir())),
    };

    let (app_config, config_warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "GCLens starting"
    );

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config");
    }

    let request = RunRequest {
        path: cli.path,
        leaks: cli.leaks,
        format: cli.output,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = run::run(&request, &app_config, &mut out) {
        tracing::error!(error = %e, "Analysis failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
