//! End-to-end tests for the execution pipeline: policy priority, mode
//! overrides, confirmation flow, and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use warden_core::{
    box_tools, ChannelResponder, ConfirmationDetails, ConfirmationKind, ConfirmationResponse,
    ErrorKind, ExecutionContext, ExecutionPipeline, PermissionConfig, PermissionMode,
    PipelineEvent, PolicyEngine, ScriptedResponder, Tool, ToolError, ToolKind, ToolOutput,
    ToolRegistry, PLAN_EXIT_TOOL,
};

#[derive(Deserialize, JsonSchema)]
struct ProbeInput {
    /// Path the call claims to touch
    #[serde(default)]
    path: Option<String>,
}

/// Configurable test tool: records executions, reports its input path as
/// affected, and optionally forces a confirmation.
struct ProbeTool {
    name: &'static str,
    kind: ToolKind,
    confirm: bool,
    executions: Arc<AtomicUsize>,
}

impl ProbeTool {
    fn new(name: &'static str, kind: ToolKind) -> (Self, Arc<AtomicUsize>) {
        let executions = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                kind,
                confirm: false,
                executions: executions.clone(),
            },
            executions,
        )
    }

    fn with_confirmation(mut self) -> Self {
        self.confirm = true;
        self
    }
}

impl Tool for ProbeTool {
    type Input = ProbeInput;

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test probe"
    }

    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn affected_paths(&self, input: &Self::Input) -> Vec<String> {
        input.path.iter().cloned().collect()
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        if !self.confirm {
            return None;
        }
        Some(ConfirmationDetails::generic(
            format!("{} wants to run", self.name),
            format!("touching {:?}", input.path),
        ))
    }

    async fn execute(
        &self,
        _input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok("ran".into())
    }
}

fn engine(deny: &[&str], allow: &[&str], ask: &[&str]) -> Arc<PolicyEngine> {
    let config = PermissionConfig {
        deny: deny.iter().map(|s| s.to_string()).collect(),
        allow: allow.iter().map(|s| s.to_string()).collect(),
        ask: ask.iter().map(|s| s.to_string()).collect(),
    };
    Arc::new(PolicyEngine::from_config(&config).unwrap())
}

fn params(path: &str) -> serde_json::Value {
    serde_json::json!({ "path": path })
}

// ===== Policy Priority =====

#[tokio::test]
async fn test_deny_over_allow_end_to_end() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&["write"], &["write"], &[]));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::DenyBlocked));
    assert_eq!(executions.load(Ordering::SeqCst), 0);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_allow_runs_without_responder() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &["write"], &[]));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_deny_failure_names_blocking_rule() {
    let (tool, _) = ProbeTool::new("read", ToolKind::ReadOnly);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(
        Arc::new(registry),
        engine(&["read(path:**/.env)"], &["read"], &[]),
    );
    let ctx = ExecutionContext::new(".");

    let result = pipeline.execute("read", params("src/.env"), &ctx).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::DenyBlocked));
    assert!(result
        .llm_content
        .as_text()
        .contains("read(path:**/.env)"));
}

#[tokio::test]
async fn test_unmatched_mutating_call_defaults_to_ask() {
    let (tool, _) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::approved(),
    ]));
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(responder.request_count(), 1);
}

// ===== Confirmation Flow =====

#[tokio::test]
async fn test_ask_rule_confirms_exactly_once() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &[], &["write"]));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::approved(),
    ]));
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 1);
    assert!(responder.requests()[0].title.contains("write"));
}

#[tokio::test]
async fn test_rejection_reports_operator_reason() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &[], &["write"]));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::rejected("use the staging directory instead"),
    ]));
    let ctx = ExecutionContext::new(".").with_responder(responder);

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::ConfirmationRejected));
    assert!(result
        .llm_content
        .as_text()
        .contains("use the staging directory instead"));
    assert_eq!(executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predicate_overrides_allow_decision() {
    // A tool's own confirmation predicate fires even when the policy says
    // allow; only a deny outranks it.
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let tool = tool.with_confirmation();
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &["write"], &[]));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::approved(),
    ]));
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(responder.request_count(), 1);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_channel_responder_drives_pipeline() {
    let (tool, _) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &[], &["write"]));
    let (responder, mut rx) = ChannelResponder::new(4);
    let ctx = ExecutionContext::new(".").with_responder(Arc::new(responder));

    let ui = tokio::spawn(async move {
        let request = rx.recv().await.unwrap();
        assert!(request.details.title.contains("write"));
        request.approve().unwrap();
    });

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    ui.await.unwrap();
}

// ===== Mode Overrides =====

#[tokio::test]
async fn test_default_mode_readonly_skips_confirmation() {
    let (tool, executions) = ProbeTool::new("read", ToolKind::ReadOnly);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".").with_responder(responder.clone());

    let result = pipeline.execute("read", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_auto_edit_skips_predicate_confirmation() {
    let (tool, executions) = ProbeTool::new("edit", ToolKind::Edit);
    let tool = tool.with_confirmation();
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::AutoEdit)
        .with_responder(responder.clone());

    let result = pipeline.execute("edit", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_auto_edit_still_confirms_execute_kind() {
    let (tool, _) = ProbeTool::new("run", ToolKind::Execute);
    let tool = tool.with_confirmation();
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::approved(),
    ]));
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::AutoEdit)
        .with_responder(responder.clone());

    let result = pipeline.execute("run", params("x"), &ctx).await;

    assert!(result.success);
    assert_eq!(responder.request_count(), 1);
}

#[tokio::test]
async fn test_yolo_bypasses_deny_and_confirmation() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let tool = tool.with_confirmation();
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&["write"], &[], &[]));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::Yolo)
        .with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_plan_mode_holds_back_mutating_calls() {
    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    // Allowed by policy, still held back by plan mode
    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &["write"], &[]));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::rejected("still planning"),
    ]));
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::Plan)
        .with_responder(responder.clone());

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::ConfirmationRejected));
    assert_eq!(executions.load(Ordering::SeqCst), 0);
    assert_eq!(responder.request_count(), 1);
    assert_eq!(
        responder.requests()[0].kind,
        ConfirmationKind::EnterPlanMode
    );
}

#[tokio::test]
async fn test_plan_mode_readonly_unaffected() {
    let (tool, executions) = ProbeTool::new("read", ToolKind::ReadOnly);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::new());
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::Plan)
        .with_responder(responder.clone());

    let result = pipeline.execute("read", params("a.txt"), &ctx).await;

    assert!(result.success);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(responder.request_count(), 0);
}

#[tokio::test]
async fn test_plan_mode_exempts_exit_tool() {
    struct ExitTool;
    impl Tool for ExitTool {
        type Input = ProbeInput;
        fn name(&self) -> &str {
            PLAN_EXIT_TOOL
        }
        fn description(&self) -> &str {
            "leave plan mode"
        }
        fn kind(&self) -> ToolKind {
            ToolKind::Execute
        }
        fn confirmation(&self, _input: &Self::Input) -> Option<ConfirmationDetails> {
            Some(ConfirmationDetails::exit_plan("Exit plan mode?", "done planning"))
        }
        async fn execute(
            &self,
            _input: Self::Input,
            _ctx: &ExecutionContext,
        ) -> Result<ToolOutput, ToolError> {
            Ok("exiting".into())
        }
    }

    let mut registry = ToolRegistry::new();
    registry.register(ExitTool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), Arc::new(PolicyEngine::empty()));
    let responder = Arc::new(ScriptedResponder::with_responses([
        ConfirmationResponse::approved(),
    ]));
    let ctx = ExecutionContext::new(".")
        .with_mode(PermissionMode::Plan)
        .with_responder(responder.clone());

    let result = pipeline
        .execute(PLAN_EXIT_TOOL, serde_json::json!({}), &ctx)
        .await;

    // The exit tool's own confirmation ran, not a plan-violation one
    assert!(result.success);
    assert_eq!(responder.request_count(), 1);
    assert_eq!(responder.requests()[0].kind, ConfirmationKind::ExitPlanMode);
}

#[tokio::test]
async fn test_plan_mode_still_honors_deny() {
    let (tool, _) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&["write"], &[], &[]));
    let ctx = ExecutionContext::new(".").with_mode(PermissionMode::Plan);

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::DenyBlocked));
}

// ===== Registry Interaction =====

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let mut registry = ToolRegistry::new();
    let (first, _) = ProbeTool::new("write", ToolKind::Write);
    let (second, _) = ProbeTool::new("write", ToolKind::Write);

    registry.register(first).unwrap();
    assert!(registry.register(second).is_err());
}

#[tokio::test]
async fn test_unknown_tool_fails_before_policy_check() {
    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = events.clone();

    let pipeline = ExecutionPipeline::new(
        Arc::new(ToolRegistry::new()),
        Arc::new(PolicyEngine::empty()),
    )
    .with_hook(move |event: &PipelineEvent| {
        if matches!(event, PipelineEvent::PolicyEvaluated { .. }) {
            seen.lock().push(());
        }
    });

    let ctx = ExecutionContext::new(".");
    let result = pipeline
        .execute("nonexistent", serde_json::json!({}), &ctx)
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
    assert!(events.lock().is_empty());
}

// ===== Cancellation =====

#[tokio::test]
async fn test_cancellation_while_suspended() {
    // A responder that never answers, so the call stays suspended until
    // the token fires.
    struct NeverResponder;

    #[async_trait::async_trait]
    impl warden_core::ConfirmationResponder for NeverResponder {
        async fn request(&self, _details: ConfirmationDetails) -> ConfirmationResponse {
            std::future::pending().await
        }
    }

    let (tool, executions) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &[], &["write"]));
    let token = CancellationToken::new();
    let ctx = ExecutionContext::new(".")
        .with_responder(Arc::new(NeverResponder))
        .with_cancellation(token.clone());

    let cancel = tokio::spawn({
        let token = token.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        }
    });

    let result = pipeline.execute("write", params("a.txt"), &ctx).await;

    // Cancelled, not rejected: the agent loop can tell these apart
    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(executions.load(Ordering::SeqCst), 0);
    cancel.await.unwrap();
}

// ===== Batch Dispatch =====

#[tokio::test]
async fn test_batch_mixes_outcomes_in_order() {
    let (read, _) = ProbeTool::new("read", ToolKind::ReadOnly);
    let (write, _) = ProbeTool::new("write", ToolKind::Write);
    let mut registry = ToolRegistry::new();
    registry.register_all(box_tools![read, write]).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&["write"], &["read"], &[]));
    let ctx = ExecutionContext::new(".");

    let results = pipeline
        .execute_batch(
            vec![
                warden_core::ToolCall::new("read", params("a.txt")),
                warden_core::ToolCall::new("write", params("b.txt")),
                warden_core::ToolCall::new("missing", serde_json::json!({})),
            ],
            &ctx,
        )
        .await;

    assert!(results[0].success);
    assert_eq!(results[1].error_kind(), Some(ErrorKind::DenyBlocked));
    assert_eq!(results[2].error_kind(), Some(ErrorKind::NotFound));
}

// ===== Metadata =====

#[tokio::test]
async fn test_result_metadata_records_decision() {
    let (tool, _) = ProbeTool::new("read", ToolKind::ReadOnly);
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(registry), engine(&[], &["read"], &[]));
    let ctx = ExecutionContext::new(".");

    let result = pipeline.execute("read", params("a.txt"), &ctx).await;

    let metadata = result.metadata.unwrap();
    assert_eq!(
        metadata.decision,
        Some(warden_core::PolicyDecision::Allow)
    );
    assert_eq!(metadata.matched_rule.as_deref(), Some("read"));
    assert_eq!(metadata.mode, PermissionMode::Default);
    assert!(!metadata.confirmed);
}
