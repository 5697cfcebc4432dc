//! Session permission modes.

use serde::{Deserialize, Serialize};

/// Tool name of the dedicated plan-mode exit action.
///
/// While a session is in [`PermissionMode::Plan`], every mutating tool call
/// is forced into a plan-violation confirmation except this one, whose own
/// confirmation asks the operator to approve leaving plan mode.
pub const PLAN_EXIT_TOOL: &str = "exit_plan_mode";

/// Session-wide override reshaping how policy decisions translate into
/// confirmation requirements.
///
/// The mode is carried inside each
/// [`ExecutionContext`](crate::pipeline::ExecutionContext) rather than held
/// as process-wide state; changing it affects the next call, never one
/// already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Honor policy decisions as-is; read-only tools skip confirmation.
    #[default]
    Default,

    /// Edit-kind tools skip confirmation; everything else as `Default`.
    AutoEdit,

    /// Mutating tools are held back behind a plan-violation confirmation
    /// until the operator approves leaving the mode.
    Plan,

    /// No confirmations, and deny rules are bypassed. Use with caution.
    Yolo,
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionMode::Default => write!(f, "default"),
            PermissionMode::AutoEdit => write!(f, "autoEdit"),
            PermissionMode::Plan => write!(f, "plan"),
            PermissionMode::Yolo => write!(f, "yolo"),
        }
    }
}
