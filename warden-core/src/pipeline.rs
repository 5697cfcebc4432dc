//! The execution pipeline: validation, authorization, confirmation,
//! execution, and result normalization for every proposed tool call.
//!
//! The pipeline is the single entry point between the agent loop and the
//! tools. It never raises: every failure mode is encoded in the returned
//! [`ToolResult`], so the caller can always feed something back to the
//! model.
//!
//! A call moves through a fixed sequence of states:
//!
//! ```text
//! Validating → PolicyCheck → Blocked
//!                          → AwaitingConfirmation → Rejected
//!                                                 → Executing → Completed | Failed
//!                          → Executing → Completed | Failed
//! ```
//!
//! The only suspension point is the confirmation wait, which yields just
//! the current call; other in-flight calls and the caller's event loop keep
//! running. Cancellation is cooperative: the context's token is checked on
//! entry to each state and raced against the confirmation wait.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::confirm::{AutoDenyResponder, ConfirmationDetails, ConfirmationResponder};
use crate::events::{PipelineEvent, PipelineHook};
use crate::permission::{PermissionMode, PolicyCheck, PolicyDecision, PolicyEngine, PLAN_EXIT_TOOL};
use crate::registry::ToolRegistry;
use crate::tool::{DynTool, ToolKind, ToolOutput};
use crate::validate::{InputValidator, SchemaValidator};

/// Default cap on concurrently executing calls in
/// [`ExecutionPipeline::execute_batch`].
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 4;

/// Classification of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Parameters failed schema validation. Local, never retried.
    ValidationError,

    /// No tool registered under the requested name.
    NotFound,

    /// A deny rule blocked the call.
    DenyBlocked,

    /// The operator declined the confirmation.
    ConfirmationRejected,

    /// The execution context was cancelled while the call was suspended or
    /// executing. Distinguished from rejection so the agent loop can decide
    /// whether to retry the turn.
    Cancelled,

    /// The executor itself failed.
    ExecutionError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DenyBlocked => "DENY_BLOCKED",
            ErrorKind::ConfirmationRejected => "CONFIRMATION_REJECTED",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::ExecutionError => "EXECUTION_ERROR",
        };
        write!(f, "{}", name)
    }
}

/// Error payload of a failed [`ToolResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultError {
    /// Failure classification.
    pub kind: ErrorKind,

    /// Human- and model-readable description.
    pub message: String,

    /// Optional structured detail (validator output, executor context).
    pub details: Option<Value>,
}

/// How the pipeline arrived at a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Raw policy decision, when the call got as far as the policy check.
    pub decision: Option<PolicyDecision>,

    /// The rule that produced the decision, if any.
    pub matched_rule: Option<String>,

    /// Permission mode the call ran under.
    pub mode: PermissionMode,

    /// Whether an operator approval was obtained.
    pub confirmed: bool,

    /// Wall-clock time from entry to result.
    pub duration: Duration,
}

/// The normalized outcome of one tool call: the only value the pipeline
/// ever returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the executor ran and succeeded.
    pub success: bool,

    /// Content for the model. On failure this is natural-language failure
    /// text so the model can pick an alternative action.
    pub llm_content: ToolOutput,

    /// Human-facing rendering for the UI.
    pub display_content: String,

    /// Present exactly when `success` is false.
    pub error: Option<ResultError>,

    /// Pipeline bookkeeping (decision, matched rule, timing).
    pub metadata: Option<ExecutionMetadata>,
}

impl ToolResult {
    fn completed(output: ToolOutput, display: String, metadata: ExecutionMetadata) -> Self {
        Self {
            success: true,
            llm_content: output,
            display_content: display,
            error: None,
            metadata: Some(metadata),
        }
    }

    fn failed(kind: ErrorKind, message: String, metadata: ExecutionMetadata) -> Self {
        Self {
            success: false,
            llm_content: ToolOutput::Text(message.clone()),
            display_content: message.clone(),
            error: Some(ResultError {
                kind,
                message,
                details: None,
            }),
            metadata: Some(metadata),
        }
    }

    /// Failure classification, if this result is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-call execution state, created by the caller for each invocation and
/// discarded when the call completes.
///
/// The context owns everything the pipeline must not share between calls:
/// the cancellation token, the confirmation responder, the permission mode,
/// and the session/workspace identity. It defaults to [`PermissionMode::Default`]
/// and the [`AutoDenyResponder`], so an unconfigured context can never
/// silently approve a mutating call.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use warden_core::confirm::AutoApproveResponder;
/// use warden_core::permission::PermissionMode;
/// use warden_core::pipeline::ExecutionContext;
///
/// let ctx = ExecutionContext::new("/work/project")
///     .with_mode(PermissionMode::AutoEdit)
///     .with_responder(Arc::new(AutoApproveResponder));
/// ```
#[derive(Clone)]
pub struct ExecutionContext {
    /// Identifies the session this call belongs to.
    pub session_id: String,

    /// Root directory of the workspace the call operates in.
    pub workspace_root: PathBuf,

    /// Permission mode in effect for this call.
    pub mode: PermissionMode,

    /// Cooperative cancellation for the whole call, including the
    /// confirmation wait. Tool executors receive the context and are
    /// expected to honor the token in long-running work.
    pub cancellation: CancellationToken,

    /// Answers confirmation requests for this call.
    pub responder: Arc<dyn ConfirmationResponder>,

    progress: Option<ProgressFn>,
}

impl ExecutionContext {
    /// Create a context with secure defaults.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            workspace_root: workspace_root.into(),
            mode: PermissionMode::default(),
            cancellation: CancellationToken::new(),
            responder: Arc::new(AutoDenyResponder),
            progress: None,
        }
    }

    /// Set the permission mode.
    pub fn with_mode(mut self, mode: PermissionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the confirmation responder.
    pub fn with_responder(mut self, responder: Arc<dyn ConfirmationResponder>) -> Self {
        self.responder = responder;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Set the session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Install a progress callback for executor output.
    pub fn with_progress(mut self, progress: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Report progress from an executor, if a callback is installed.
    pub fn progress(&self, message: &str) {
        if let Some(ref f) = self.progress {
            f(message);
        }
    }

    /// True once the call has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("session_id", &self.session_id)
            .field("workspace_root", &self.workspace_root)
            .field("mode", &self.mode)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One call in an [`ExecutionPipeline::execute_batch`] submission.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Registered tool name.
    pub name: String,

    /// Raw input parameters.
    pub params: Value,
}

impl ToolCall {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Orchestrates every tool call from proposal to normalized result.
///
/// The pipeline holds only read-only shared state (the registry and the
/// policy-engine snapshot), so one instance serves any number of concurrent
/// calls. Configuration updates swap in a new engine with
/// [`replace_engine`](Self::replace_engine); calls already past their
/// policy check are unaffected.
pub struct ExecutionPipeline {
    registry: Arc<ToolRegistry>,
    engine: Arc<PolicyEngine>,
    validator: Box<dyn InputValidator>,
    hooks: Vec<Arc<dyn PipelineHook>>,
    max_concurrent: usize,
}

impl ExecutionPipeline {
    /// Create a pipeline over a registry and a policy snapshot.
    pub fn new(registry: Arc<ToolRegistry>, engine: Arc<PolicyEngine>) -> Self {
        Self {
            registry,
            engine,
            validator: Box::new(SchemaValidator),
            hooks: Vec::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT_CALLS,
        }
    }

    /// Swap in a custom parameter validator.
    pub fn with_validator(mut self, validator: impl InputValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Attach an event hook. Multiple hooks all receive every event.
    pub fn with_hook(mut self, hook: impl PipelineHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Set the concurrency cap for [`execute_batch`](Self::execute_batch).
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Point the pipeline at a new policy snapshot (after a configuration
    /// update). In-flight calls keep the snapshot they started with.
    pub fn replace_engine(&mut self, engine: Arc<PolicyEngine>) {
        self.engine = engine;
    }

    /// Execute one proposed tool call.
    ///
    /// Never returns an error and never panics: all failure modes are
    /// encoded in the returned [`ToolResult`].
    pub async fn execute(&self, tool_name: &str, params: Value, ctx: &ExecutionContext) -> ToolResult {
        let started = Instant::now();
        let call_id = Uuid::new_v4().to_string();

        self.emit(PipelineEvent::ToolRequested {
            call_id: call_id.clone(),
            name: tool_name.to_string(),
            params: params.clone(),
        });

        // Unknown tool short-circuits before any policy work
        let Some(tool) = self.registry.get(tool_name) else {
            return self.fail(
                &call_id,
                tool_name,
                ErrorKind::NotFound,
                format!("No tool named '{}' is registered.", tool_name),
                Outcome::new(ctx.mode),
                started,
            );
        };

        // Validating
        if ctx.is_cancelled() {
            return self.cancelled(&call_id, tool_name, Outcome::new(ctx.mode), started);
        }
        if let Err(e) = self.validator.validate(&tool.input_schema(), &params) {
            return self.fail(
                &call_id,
                tool_name,
                ErrorKind::ValidationError,
                format!("Invalid parameters for '{}': {}", tool_name, e),
                Outcome::new(ctx.mode),
                started,
            );
        }

        // PolicyCheck
        if ctx.is_cancelled() {
            return self.cancelled(&call_id, tool_name, Outcome::new(ctx.mode), started);
        }
        let affected_paths = tool.affected_paths_raw(&params);
        let check = self.engine.check(tool_name, &params, &affected_paths);
        self.emit(PipelineEvent::PolicyEvaluated {
            call_id: call_id.clone(),
            name: tool_name.to_string(),
            decision: check.decision,
            matched_rule: check.matched_rule.clone(),
        });
        let mut outcome = Outcome::new(ctx.mode).with_check(&check);

        // Blocked: deny wins everywhere except yolo mode
        if check.is_deny() && ctx.mode != PermissionMode::Yolo {
            let rule = check.matched_rule.as_deref().unwrap_or("deny");
            return self.fail(
                &call_id,
                tool_name,
                ErrorKind::DenyBlocked,
                format!(
                    "'{}' was blocked by the permission rule '{}'.",
                    tool_name, rule
                ),
                outcome,
                started,
            );
        }

        // AwaitingConfirmation
        if let Some(details) = required_confirmation(tool.as_ref(), tool_name, &params, &check, ctx.mode)
        {
            if ctx.is_cancelled() {
                return self.cancelled(&call_id, tool_name, outcome, started);
            }
            self.emit(PipelineEvent::ConfirmationRequested {
                call_id: call_id.clone(),
                name: tool_name.to_string(),
                details: details.clone(),
            });

            let response = tokio::select! {
                _ = ctx.cancellation.cancelled() => {
                    return self.cancelled(&call_id, tool_name, outcome, started);
                }
                response = ctx.responder.request(details) => response,
            };

            self.emit(PipelineEvent::ConfirmationResolved {
                call_id: call_id.clone(),
                name: tool_name.to_string(),
                approved: response.approved,
                reason: response.reason.clone(),
            });

            if !response.approved {
                let reason = response
                    .reason
                    .unwrap_or_else(|| "the operator declined this action".to_string());
                return self.fail(
                    &call_id,
                    tool_name,
                    ErrorKind::ConfirmationRejected,
                    format!("'{}' was not approved: {}", tool_name, reason),
                    outcome,
                    started,
                );
            }
            outcome.confirmed = true;
        }

        // Executing
        if ctx.is_cancelled() {
            return self.cancelled(&call_id, tool_name, outcome, started);
        }
        self.emit(PipelineEvent::ToolExecuting {
            call_id: call_id.clone(),
            name: tool_name.to_string(),
        });

        match AssertUnwindSafe(tool.execute_raw(params, ctx))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => {
                let duration = started.elapsed();
                self.emit(PipelineEvent::ToolCompleted {
                    call_id,
                    name: tool_name.to_string(),
                    output: output.clone(),
                    duration,
                });
                let display = tool.render_output(&output);
                ToolResult::completed(output, display, outcome.into_metadata(duration))
            }
            Ok(Err(e)) => {
                if ctx.is_cancelled() {
                    return self.cancelled(&call_id, tool_name, outcome, started);
                }
                self.fail(
                    &call_id,
                    tool_name,
                    ErrorKind::ExecutionError,
                    format!("'{}' failed: {}", tool_name, e),
                    outcome,
                    started,
                )
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.fail(
                    &call_id,
                    tool_name,
                    ErrorKind::ExecutionError,
                    format!("'{}' failed: {}", tool_name, detail),
                    outcome,
                    started,
                )
            }
        }
    }

    /// Execute a batch of calls concurrently (up to the configured cap),
    /// returning results in submission order.
    ///
    /// All calls share the caller's context: one cancellation token stops
    /// the whole batch, and every call uses the same mode and responder.
    /// Any ordering requirement between calls (say, two edits to one file)
    /// is the caller's responsibility.
    pub async fn execute_batch(
        &self,
        calls: Vec<ToolCall>,
        ctx: &ExecutionContext,
    ) -> Vec<ToolResult> {
        let futures: Vec<_> = calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| async move {
                (index, self.execute(&call.name, call.params, ctx).await)
            })
            .collect();

        let mut results: Vec<(usize, ToolResult)> = stream::iter(futures)
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    fn emit(&self, event: PipelineEvent) {
        for hook in &self.hooks {
            hook.on_event(&event);
        }
    }

    fn fail(
        &self,
        call_id: &str,
        name: &str,
        kind: ErrorKind,
        message: String,
        outcome: Outcome,
        started: Instant,
    ) -> ToolResult {
        let duration = started.elapsed();
        self.emit(PipelineEvent::ToolFailed {
            call_id: call_id.to_string(),
            name: name.to_string(),
            kind,
            error: message.clone(),
            duration,
        });
        ToolResult::failed(kind, message, outcome.into_metadata(duration))
    }

    fn cancelled(
        &self,
        call_id: &str,
        name: &str,
        outcome: Outcome,
        started: Instant,
    ) -> ToolResult {
        self.fail(
            call_id,
            name,
            ErrorKind::Cancelled,
            format!("'{}' was cancelled before completing.", name),
            outcome,
            started,
        )
    }
}

/// Accumulates metadata fields as a call advances.
struct Outcome {
    decision: Option<PolicyDecision>,
    matched_rule: Option<String>,
    mode: PermissionMode,
    confirmed: bool,
}

impl Outcome {
    fn new(mode: PermissionMode) -> Self {
        Self {
            decision: None,
            matched_rule: None,
            mode,
            confirmed: false,
        }
    }

    fn with_check(mut self, check: &PolicyCheck) -> Self {
        self.decision = Some(check.decision);
        self.matched_rule = check.matched_rule.clone();
        self
    }

    fn into_metadata(self, duration: Duration) -> ExecutionMetadata {
        ExecutionMetadata {
            decision: self.decision,
            matched_rule: self.matched_rule,
            mode: self.mode,
            confirmed: self.confirmed,
            duration,
        }
    }
}

/// Decide whether this call must be confirmed, and with what details.
///
/// Two independent sources can force a confirmation: an `ask` effective
/// decision from the policy, and the tool's own confirmation predicate. A
/// predicate-forced confirmation overrides any non-deny policy decision,
/// including `allow`. Mode overrides that skip confirmation apply to both
/// sources.
fn required_confirmation(
    tool: &dyn DynTool,
    name: &str,
    params: &Value,
    check: &PolicyCheck,
    mode: PermissionMode,
) -> Option<ConfirmationDetails> {
    match mode {
        PermissionMode::Yolo => None,
        PermissionMode::Plan if tool.kind().is_mutating() && name != PLAN_EXIT_TOOL => {
            Some(ConfirmationDetails::plan_violation(
                format!("{} (plan mode)", name),
                format!(
                    "The session is in plan mode and '{}' would modify the workspace. \
                     Approve to run it anyway, or exit plan mode first.",
                    name
                ),
            ))
        }
        _ => {
            let skip = match (mode, tool.kind()) {
                (_, ToolKind::ReadOnly) => true,
                (PermissionMode::AutoEdit, ToolKind::Edit) => true,
                _ => false,
            };
            if skip {
                return None;
            }

            if let Some(details) = tool.confirmation_raw(params) {
                return Some(details);
            }
            if check.is_ask() {
                return Some(ask_details(tool, name, params, check.matched_rule.as_deref()));
            }
            None
        }
    }
}

fn ask_details(
    tool: &dyn DynTool,
    name: &str,
    params: &Value,
    matched_rule: Option<&str>,
) -> ConfirmationDetails {
    let title = format!("Run {}?", name);
    let message = match matched_rule {
        Some(rule) => format!(
            "The permission rule '{}' requires approval for:\n{}",
            rule,
            tool.render_input(params)
        ),
        None => format!(
            "No permission rule covers this call:\n{}",
            tool.render_input(params)
        ),
    };

    match tool.kind() {
        ToolKind::Edit => ConfirmationDetails::edit(title, message),
        ToolKind::Execute => ConfirmationDetails::execute(title, message),
        _ => ConfirmationDetails::generic(title, message),
    }
}
