//! The dedicated plan-mode exit action.

use crate::prelude::*;
use warden_core::PLAN_EXIT_TOOL;

/// Input for exiting plan mode
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExitPlanModeInput {
    /// Summary of the plan the operator is approving (optional)
    #[serde(default)]
    pub plan: Option<String>,
}

/// The one tool the pipeline exempts from plan-mode confinement.
///
/// Its confirmation asks the operator to approve leaving plan mode; on
/// approval the executor returns a marker result and the agent loop flips
/// the session's [`warden_core::PermissionMode`] for subsequent calls (the
/// mode lives in the caller-owned context, so the tool cannot change it
/// directly).
pub struct ExitPlanModeTool;

impl Tool for ExitPlanModeTool {
    type Input = ExitPlanModeInput;

    fn name(&self) -> &str {
        PLAN_EXIT_TOOL
    }

    fn description(&self) -> &str {
        "Present the plan and ask the operator to leave plan mode so the agent can start making changes."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Execute
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        let message = match &input.plan {
            Some(plan) => format!("Approve this plan and leave plan mode?\n\n{}", plan),
            None => "Leave plan mode and allow changes to the workspace?".to_string(),
        };
        Some(ConfirmationDetails::exit_plan("Exit plan mode?", message))
    }

    async fn execute(
        &self,
        _input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        Ok("Plan approved. The session may leave plan mode.".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ConfirmationKind;

    #[test]
    fn test_name_matches_pipeline_exemption() {
        assert_eq!(ExitPlanModeTool.name(), PLAN_EXIT_TOOL);
    }

    #[test]
    fn test_confirmation_is_exit_plan_kind() {
        let details = ExitPlanModeTool
            .confirmation(&ExitPlanModeInput {
                plan: Some("1. refactor\n2. test".to_string()),
            })
            .unwrap();

        assert_eq!(details.kind, ConfirmationKind::ExitPlanMode);
        assert!(details.message.contains("refactor"));
    }

    #[tokio::test]
    async fn test_execute_returns_marker() {
        let result = ExitPlanModeTool
            .execute(
                ExitPlanModeInput { plan: None },
                &ExecutionContext::new("."),
            )
            .await
            .unwrap();

        assert!(result.as_text().contains("leave plan mode"));
    }
}
