// GCLens - core/mod.rs
//
// Core analysis layer: pure computation over in-memory line sequences.
// Must NOT depend on: app, report, or any I/O crate directly.

pub mod analyzer;
pub mod grammar;
pub mod leak;
pub mod model;
pub mod parser;
