//! Data Transfer Objects for the dbt Cloud API
//!
//! Lightweight representations of the JSON documents exchanged with the
//! remote service. Conversion into domain types lives next to each DTO.

pub mod run;
