// GCLens - lib.rs
//
// Library entry point, exposing all modules for integration testing and
// potential future programmatic use.
//
// The CLI surface (argument parsing, exit codes) lives in `main.rs` and
// is not part of the library.

pub mod app;
pub mod core;
pub mod report;
pub mod util;
