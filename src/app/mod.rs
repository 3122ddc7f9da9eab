// GCLens - app/mod.rs
//
// Application layer: configuration, log discovery, the analysis pipeline.
// Dependencies: core and report layers.
// Must NOT depend on: anything terminal-specific (that is main's job).

pub mod config;
pub mod discovery;
pub mod run;
