//! dbtc Core
//!
//! Core types for triggering and observing dbt Cloud job runs.
//!
//! This crate contains:
//! - Domain types: run requests, run snapshots and status interpretation
//! - DTOs: the wire shapes of the dbt Cloud v2 API
//! - Errors raised before any network traffic happens

pub mod domain;
pub mod dto;
pub mod error;

pub use error::{ConfigError, UnknownStatusError};
