//! Declarative permission policy for tool execution.
//!
//! Every tool call the model proposes is checked against three ordered rule
//! lists before anything runs:
//!
//! - **`deny`** — block the call outright
//! - **`allow`** — run unattended
//! - **`ask`** — suspend for operator confirmation
//!
//! Deny always outranks allow, and allow always outranks ask, no matter how
//! the lists are ordered or how specific a rule looks. A call matching no
//! rule defaults to `ask`.
//!
//! # Overview
//!
//! - **[`PermissionRule`]**: one parsed rule (`Tool` or `Tool(param:glob)`)
//! - **[`PermissionConfig`]**: the three raw rule lists, loaded as one snapshot
//! - **[`PolicyEngine`]**: checks proposed calls against a snapshot
//! - **[`PermissionMode`]**: session-wide override (default/autoEdit/plan/yolo)
//! - **[`RuleStore`]**: trait for persisting configuration
//! - **[`MemoryRuleStore`]** / **[`FileRuleStore`]**: stock stores
//!
//! # Example
//!
//! ```rust
//! use warden_core::permission::{PermissionConfig, PolicyDecision, PolicyEngine};
//!
//! let mut config = PermissionConfig::new();
//! config.append(PolicyDecision::Allow, "Read");
//! config.append(PolicyDecision::Deny, "Read(file_path:**/.env)");
//!
//! let engine = PolicyEngine::from_config(&config).unwrap();
//!
//! let params = serde_json::json!({});
//! assert!(engine.check("Read", &params, &["src/lib.rs".into()]).is_allow());
//! assert!(engine.check("Read", &params, &["src/.env".into()]).is_deny());
//! ```

mod engine;
mod mode;
mod rule;
mod store;

pub use engine::{PolicyCheck, PolicyDecision, PolicyEngine};
pub use mode::{PermissionMode, PLAN_EXIT_TOOL};
pub use rule::{PermissionConfig, PermissionRule, RuleParseError};
pub use store::{FileRuleStore, MemoryRuleStore, RuleStore, RuleStoreError};
