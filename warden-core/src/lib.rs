//! # Warden
//!
//! The authorization and execution runtime for AI coding agents: every tool
//! call a model proposes is validated, checked against a declarative
//! permission policy, optionally confirmed by the human operator, executed
//! under cooperative cancellation, and normalized into a single result
//! value the agent loop can hand back to the model.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::{
//!     ExecutionContext, ExecutionPipeline, PermissionConfig, PolicyDecision, PolicyEngine,
//!     ToolRegistry,
//! };
//! # use warden_core::{Tool, ToolError, ToolKind, ToolOutput};
//! # use schemars::JsonSchema;
//! # use serde::Deserialize;
//! # #[derive(Deserialize, JsonSchema)]
//! # struct EchoInput { message: String }
//! # struct EchoTool;
//! # impl Tool for EchoTool {
//! #     type Input = EchoInput;
//! #     fn name(&self) -> &str { "echo" }
//! #     fn description(&self) -> &str { "Echo" }
//! #     fn kind(&self) -> ToolKind { ToolKind::ReadOnly }
//! #     async fn execute(&self, input: Self::Input, _ctx: &ExecutionContext)
//! #         -> Result<ToolOutput, ToolError> { Ok(input.message.into()) }
//! # }
//!
//! # tokio_test::block_on(async {
//! // Register tools once at startup
//! let mut registry = ToolRegistry::new();
//! registry.register(EchoTool).unwrap();
//!
//! // Load the allow/ask/deny rule lists and build a policy snapshot
//! let mut config = PermissionConfig::new();
//! config.append(PolicyDecision::Allow, "echo");
//! let engine = PolicyEngine::from_config(&config).unwrap();
//!
//! let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(engine));
//!
//! // One context per call; this one never needs to ask anyone
//! let ctx = ExecutionContext::new("/work/project");
//! let result = pipeline
//!     .execute("echo", serde_json::json!({"message": "hello"}), &ctx)
//!     .await;
//!
//! assert!(result.success);
//! assert_eq!(result.llm_content.as_text(), "hello");
//! # });
//! ```
//!
//! ## How a call is decided
//!
//! 1. **Validation** — parameters are checked against the tool's schema.
//! 2. **Policy** — the [`PolicyEngine`] scans `deny`, then `allow`, then
//!    `ask` rules; the first structural match wins and deny always outranks
//!    allow. No match defaults to ask.
//! 3. **Mode overrides** — the context's [`PermissionMode`] reshapes the
//!    decision: `yolo` bypasses everything, `plan` holds mutating tools
//!    behind a plan-violation confirmation, `autoEdit` lets edit tools run
//!    unattended, and the default mode lets read-only tools skip
//!    confirmation.
//! 4. **Confirmation** — an `ask` decision or the tool's own confirmation
//!    predicate suspends the call on the context's
//!    [`ConfirmationResponder`](confirm::ConfirmationResponder) until the
//!    operator answers or the call is cancelled.
//! 5. **Execution** — the executor runs with the context; faults and panics
//!    are captured into the result, never rethrown.
//!
//! ## Crates
//!
//! - `warden-core` (this crate) — the runtime
//! - `warden-tools` — ready-to-use filesystem, shell, search, and memory
//!   tools wired for this runtime

pub mod confirm;
pub mod error;
pub mod events;
pub mod glob;
pub mod permission;
pub mod pipeline;
pub mod registry;
pub mod tool;
pub mod validate;

pub use confirm::{
    AutoApproveResponder, AutoDenyResponder, ChannelResponder, ConfirmationDetails,
    ConfirmationKind, ConfirmationRequest, ConfirmationResponder, ConfirmationResponse,
    ScriptedResponder,
};
pub use error::{Error, Result};
pub use events::{PipelineEvent, PipelineHook};
pub use glob::glob_match;
pub use permission::{
    FileRuleStore, MemoryRuleStore, PermissionConfig, PermissionMode, PermissionRule,
    PolicyCheck, PolicyDecision, PolicyEngine, RuleParseError, RuleStore, RuleStoreError,
    PLAN_EXIT_TOOL,
};
pub use pipeline::{
    ErrorKind, ExecutionContext, ExecutionMetadata, ExecutionPipeline, ResultError, ToolCall,
    ToolResult, DEFAULT_MAX_CONCURRENT_CALLS,
};
pub use registry::{RegistryError, ToolRegistry};
pub use tool::{box_tool, DynTool, Tool, ToolError, ToolKind, ToolOutput};
pub use validate::{InputValidator, SchemaValidator, ValidationError};
