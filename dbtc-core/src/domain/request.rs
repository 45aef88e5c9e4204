//! Run trigger requests
//!
//! A [`RunRequest`] is the body posted to the job trigger endpoint. The set
//! of overridable fields is closed: every recognized key has a fixed value
//! type, and raw string inputs are coerced once, in [`RunRequest::compose`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Raw override inputs as read from configuration, keyed by override name
pub type RawOverrides = BTreeMap<String, String>;

const STEPS_EXAMPLE: &str = r#"["dbt seed", "dbt run --select my_model"]"#;

/// How a raw override value is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
    List,
}

/// Recognized override keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverrideKey {
    Cause,
    GitSha,
    GitBranch,
    SchemaOverride,
    DbtVersionOverride,
    ThreadsOverride,
    TargetNameOverride,
    GenerateDocsOverride,
    TimeoutSecondsOverride,
    StepsOverride,
}

impl OverrideKey {
    pub const ALL: [OverrideKey; 10] = [
        Self::Cause,
        Self::GitSha,
        Self::GitBranch,
        Self::SchemaOverride,
        Self::DbtVersionOverride,
        Self::ThreadsOverride,
        Self::TargetNameOverride,
        Self::GenerateDocsOverride,
        Self::TimeoutSecondsOverride,
        Self::StepsOverride,
    ];

    /// Field name used both in configuration and in the request body
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cause => "cause",
            Self::GitSha => "git_sha",
            Self::GitBranch => "git_branch",
            Self::SchemaOverride => "schema_override",
            Self::DbtVersionOverride => "dbt_version_override",
            Self::ThreadsOverride => "threads_override",
            Self::TargetNameOverride => "target_name_override",
            Self::GenerateDocsOverride => "generate_docs_override",
            Self::TimeoutSecondsOverride => "timeout_seconds_override",
            Self::StepsOverride => "steps_override",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Self::ThreadsOverride | Self::TimeoutSecondsOverride => ValueKind::Integer,
            Self::GenerateDocsOverride => ValueKind::Boolean,
            Self::StepsOverride => ValueKind::List,
            _ => ValueKind::Text,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed override fields; `None` fields are left out of the payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbt_version_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_override: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_name_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_docs_override: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds_override: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_override: Option<Vec<String>>,
}

impl RunOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of a job trigger request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRequest {
    pub cause: String,
    #[serde(flatten)]
    pub overrides: RunOverrides,
}

impl RunRequest {
    /// Builds a request from a base cause and raw override inputs
    ///
    /// Empty values are treated as absent. An explicit `cause` entry in
    /// `raw` replaces the base cause.
    pub fn compose(cause: impl Into<String>, raw: &RawOverrides) -> Result<Self, ConfigError> {
        let mut request = Self {
            cause: cause.into(),
            overrides: RunOverrides::default(),
        };

        for (name, value) in raw {
            let key = OverrideKey::parse(name).ok_or_else(|| ConfigError::UnknownKey(name.clone()))?;
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            request.apply(key, value)?;
        }

        Ok(request)
    }

    fn apply(&mut self, key: OverrideKey, value: &str) -> Result<(), ConfigError> {
        let o = &mut self.overrides;
        match key {
            OverrideKey::Cause => self.cause = value.to_string(),
            OverrideKey::GitSha => o.git_sha = Some(value.to_string()),
            OverrideKey::GitBranch => o.git_branch = Some(value.to_string()),
            OverrideKey::SchemaOverride => o.schema_override = Some(value.to_string()),
            OverrideKey::DbtVersionOverride => o.dbt_version_override = Some(value.to_string()),
            OverrideKey::TargetNameOverride => o.target_name_override = Some(value.to_string()),
            OverrideKey::ThreadsOverride => o.threads_override = Some(parse_integer(key, value)?),
            OverrideKey::TimeoutSecondsOverride => {
                o.timeout_seconds_override = Some(parse_integer(key, value)?)
            }
            OverrideKey::GenerateDocsOverride => {
                o.generate_docs_override = Some(parse_boolean(key, value)?)
            }
            OverrideKey::StepsOverride => o.steps_override = Some(parse_list(key, value)?),
        }
        Ok(())
    }
}

fn parse_boolean(key: OverrideKey, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_integer(key: OverrideKey, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Decodes a list literal
///
/// The value is read as YAML, so JSON arrays, flow lists and block
/// sequences all work. A lone scalar string becomes a one-element list.
fn parse_list(key: OverrideKey, value: &str) -> Result<Vec<String>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidList {
        key: key.to_string(),
        reason,
        example: STEPS_EXAMPLE,
    };

    let decoded: serde_yaml::Value =
        serde_yaml::from_str(value).map_err(|e| invalid(format!("not a valid list ({e})")))?;

    match decoded {
        serde_yaml::Value::String(step) => Ok(vec![step]),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                serde_yaml::Value::String(step) => Ok(step),
                other => Err(invalid(format!("list items must be strings, got {other:?}"))),
            })
            .collect(),
        other => Err(invalid(format!("expected a step or a list of steps, got {other:?}"))),
    }
}
