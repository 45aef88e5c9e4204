//! Core domain types
//!
//! These types describe one triggered run as the runner sees it. They are
//! built from DTOs and never mutated in place: every poll yields a new
//! snapshot.

pub mod request;
pub mod run;
pub mod status;
