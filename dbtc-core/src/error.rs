//! Error types raised by the core crate

use thiserror::Error;

/// A malformed override value, detected before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Boolean overrides only accept the literals `true` and `false`
    #[error("invalid value for `{key}`: expected `true` or `false`, got `{value}`")]
    InvalidBoolean { key: String, value: String },

    /// Integer overrides must be base-10 numbers
    #[error("invalid value for `{key}`: expected an integer, got `{value}`")]
    InvalidInteger { key: String, value: String },

    /// A list override could not be decoded
    #[error("invalid value for `{key}`: {reason}. Example: {example}")]
    InvalidList {
        key: String,
        reason: String,
        example: &'static str,
    },

    /// The key is not one of the recognized overrides
    #[error("unknown override `{0}`")]
    UnknownKey(String),
}

/// A status code outside of the documented table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown run status code {0}")]
pub struct UnknownStatusError(pub i64);
