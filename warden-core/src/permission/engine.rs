//! Policy evaluation for proposed tool calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rule::{PermissionConfig, PermissionRule, RuleParseError};

/// Outcome category of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDecision {
    /// Run unattended, no confirmation needed.
    Allow,

    /// Suspend and ask the operator before running.
    Ask,

    /// Block the call outright.
    Deny,
}

impl std::fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyDecision::Allow => write!(f, "allow"),
            PolicyDecision::Ask => write!(f, "ask"),
            PolicyDecision::Deny => write!(f, "deny"),
        }
    }
}

/// Result of checking one proposed call against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCheck {
    /// The decision for this call.
    pub decision: PolicyDecision,

    /// Source form of the rule that produced the decision, or `None` when
    /// no rule matched and the default applied.
    pub matched_rule: Option<String>,
}

impl PolicyCheck {
    /// True when the call may run without confirmation.
    pub fn is_allow(&self) -> bool {
        self.decision == PolicyDecision::Allow
    }

    /// True when the call requires operator confirmation.
    pub fn is_ask(&self) -> bool {
        self.decision == PolicyDecision::Ask
    }

    /// True when the call is blocked.
    pub fn is_deny(&self) -> bool {
        self.decision == PolicyDecision::Deny
    }
}

/// Evaluates proposed tool calls against an immutable configuration snapshot.
///
/// The engine parses all rules up front and never mutates them afterwards;
/// a configuration update produces a new engine. [`check`](Self::check) is a
/// pure function, safe to call from any number of concurrent tool calls.
///
/// Cross-list priority is fixed: a `deny` match wins over any `allow` match,
/// and `allow` wins over `ask`, regardless of ordering inside the lists or
/// which rule looks more specific. A call matching no rule at all gets the
/// default `Ask` decision.
///
/// # Example
///
/// ```rust
/// use warden_core::permission::{PermissionConfig, PolicyEngine};
///
/// let mut config = PermissionConfig::new();
/// config.deny.push("Read(file_path:**/.env)".to_string());
/// config.allow.push("Read".to_string());
///
/// let engine = PolicyEngine::from_config(&config).unwrap();
/// let check = engine.check("Read", &serde_json::json!({}), &["src/.env".to_string()]);
/// assert!(check.is_deny());
/// ```
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    deny: Vec<PermissionRule>,
    allow: Vec<PermissionRule>,
    ask: Vec<PermissionRule>,
}

impl PolicyEngine {
    /// Build an engine from a configuration snapshot.
    ///
    /// Fails on the first rule string that does not parse; the error names
    /// the offending rule.
    pub fn from_config(config: &PermissionConfig) -> Result<Self, RuleParseError> {
        Ok(Self {
            deny: parse_list(&config.deny)?,
            allow: parse_list(&config.allow)?,
            ask: parse_list(&config.ask)?,
        })
    }

    /// An engine with no rules: every call gets the default `Ask`.
    pub fn empty() -> Self {
        Self {
            deny: Vec::new(),
            allow: Vec::new(),
            ask: Vec::new(),
        }
    }

    /// Check a proposed call.
    ///
    /// `affected_paths` are the filesystem paths the tool reports this call
    /// would touch; rules with parameter filters match against them as well
    /// as against the named parameter's string value.
    pub fn check(&self, tool: &str, params: &Value, affected_paths: &[String]) -> PolicyCheck {
        for (decision, rules) in [
            (PolicyDecision::Deny, &self.deny),
            (PolicyDecision::Allow, &self.allow),
            (PolicyDecision::Ask, &self.ask),
        ] {
            if let Some(rule) = rules
                .iter()
                .find(|r| r.matches(tool, params, affected_paths))
            {
                return PolicyCheck {
                    decision,
                    matched_rule: Some(rule.to_string()),
                };
            }
        }

        PolicyCheck {
            decision: PolicyDecision::Ask,
            matched_rule: None,
        }
    }

    /// Number of rules across all three lists.
    pub fn rule_count(&self) -> usize {
        self.deny.len() + self.allow.len() + self.ask.len()
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::empty()
    }
}

fn parse_list(raw: &[String]) -> Result<Vec<PermissionRule>, RuleParseError> {
    raw.iter().map(|s| PermissionRule::parse(s)).collect()
}
