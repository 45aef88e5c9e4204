//! Service layer
//!
//! Post-completion work on a run: reporting step logs when it failed and
//! collecting its artifacts.

pub mod artifacts;
pub mod log_report;

pub use artifacts::ArtifactFetcher;
pub use log_report::LogReporter;
