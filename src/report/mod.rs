// GCLens - report/mod.rs
//
// Rendering and export of analysis results. Takes read-only report
// entities from the core and writes them to any Write target. No
// analysis logic lives here.

pub mod export;
pub mod text;
