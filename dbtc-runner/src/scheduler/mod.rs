//! Scheduler layer for the runner
//!
//! Owns the trigger → poll → complete lifecycle of one dbt Cloud run.

pub mod poller;

pub use poller::{PollResult, PollSettings, RunPoller};
