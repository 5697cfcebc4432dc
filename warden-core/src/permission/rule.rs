//! Permission rule parsing and configuration.
//!
//! Rules are written as strings, either a bare tool name or a tool name with
//! a single parameter filter:
//!
//! ```text
//! Bash
//! Read(file_path:**/.env)
//! Bash(command:git *)
//! ```
//!
//! A bare rule matches every invocation of that tool. A rule with a filter
//! matches when the glob matches any filesystem path the call reports as
//! affected, or the string value of the named parameter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::engine::PolicyDecision;
use crate::glob::glob_match;

/// Errors produced while parsing a rule string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleParseError {
    /// The rule string is empty or whitespace.
    #[error("empty rule")]
    Empty,

    /// A parameter filter was opened but never closed.
    #[error("unterminated parameter filter in rule '{0}'")]
    UnterminatedFilter(String),

    /// The parameter filter is missing the `key:pattern` separator.
    #[error("parameter filter in rule '{0}' must be 'key:pattern'")]
    MalformedFilter(String),

    /// Trailing characters after the closing parenthesis.
    #[error("unexpected trailing characters in rule '{0}'")]
    TrailingCharacters(String),
}

/// A single parsed permission rule.
///
/// Immutable once parsed; [`std::fmt::Display`] re-emits the source form so
/// matched rules can be named in error messages and persisted back to
/// configuration unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRule {
    /// Tool name, compared case-sensitively and exactly.
    pub tool: String,

    /// Parameter the filter applies to, if any.
    pub param_key: Option<String>,

    /// Glob pattern the filter matches against, if any.
    pub pattern: Option<String>,
}

impl PermissionRule {
    /// Parse a rule from its string form.
    pub fn parse(raw: &str) -> Result<Self, RuleParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RuleParseError::Empty);
        }

        let Some(open) = raw.find('(') else {
            return Ok(Self {
                tool: raw.to_string(),
                param_key: None,
                pattern: None,
            });
        };

        let tool = raw[..open].trim();
        if tool.is_empty() {
            return Err(RuleParseError::Empty);
        }
        if !raw.ends_with(')') {
            return Err(if raw[open..].contains(')') {
                RuleParseError::TrailingCharacters(raw.to_string())
            } else {
                RuleParseError::UnterminatedFilter(raw.to_string())
            });
        }

        let filter = &raw[open + 1..raw.len() - 1];
        let Some((key, pattern)) = filter.split_once(':') else {
            return Err(RuleParseError::MalformedFilter(raw.to_string()));
        };
        if key.is_empty() || pattern.is_empty() {
            return Err(RuleParseError::MalformedFilter(raw.to_string()));
        }

        Ok(Self {
            tool: tool.to_string(),
            param_key: Some(key.to_string()),
            pattern: Some(pattern.to_string()),
        })
    }

    /// Check whether this rule structurally matches a proposed call.
    ///
    /// The tool name must match exactly. A rule without a filter matches any
    /// invocation of the tool. A rule with a filter matches when the glob
    /// matches at least one reported affected path, or the string value of
    /// the filtered parameter.
    pub fn matches(&self, tool: &str, params: &Value, affected_paths: &[String]) -> bool {
        if self.tool != tool {
            return false;
        }

        let (Some(key), Some(pattern)) = (&self.param_key, &self.pattern) else {
            return true;
        };

        if affected_paths.iter().any(|p| glob_match(pattern, p)) {
            return true;
        }

        params
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| glob_match(pattern, v))
    }
}

impl std::fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.param_key, &self.pattern) {
            (Some(key), Some(pattern)) => write!(f, "{}({}:{})", self.tool, key, pattern),
            _ => write!(f, "{}", self.tool),
        }
    }
}

impl std::str::FromStr for PermissionRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The three ordered rule lists of a permission configuration.
///
/// Order within a list has no semantic effect; the lists themselves have a
/// fixed cross-list priority (deny over allow over ask) applied by
/// [`super::engine::PolicyEngine`]. The configuration is loaded once per
/// session and replaced wholesale on update; the engine holds an immutable
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Rules that block a call outright.
    #[serde(default)]
    pub deny: Vec<String>,

    /// Rules that let a call run unattended.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Rules that force operator confirmation.
    #[serde(default)]
    pub ask: Vec<String>,
}

impl PermissionConfig {
    /// Create an empty configuration (every call falls through to the
    /// default `Ask` decision).
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the list a decision's rules live in.
    pub fn list(&self, decision: PolicyDecision) -> &[String] {
        match decision {
            PolicyDecision::Deny => &self.deny,
            PolicyDecision::Allow => &self.allow,
            PolicyDecision::Ask => &self.ask,
        }
    }

    /// Append a rule pattern to the list for `decision`.
    ///
    /// Identical existing entries are de-duplicated first; returns `false`
    /// when the pattern was already present.
    pub fn append(&mut self, decision: PolicyDecision, pattern: &str) -> bool {
        let list = match decision {
            PolicyDecision::Deny => &mut self.deny,
            PolicyDecision::Allow => &mut self.allow,
            PolicyDecision::Ask => &mut self.ask,
        };

        let before = list.len();
        list.retain(|existing| existing != pattern);
        let existed = list.len() < before;
        list.push(pattern.to_string());
        !existed
    }
}
