//! Events emitted during pipeline execution.
//!
//! Every state transition of a tool call produces an event, letting
//! observers (UIs, session stores, metrics) track what the runtime decided
//! and why without being in the call path.

use std::time::Duration;

use serde_json::Value;

use crate::confirm::ConfirmationDetails;
use crate::permission::PolicyDecision;
use crate::pipeline::ErrorKind;
use crate::tool::ToolOutput;

/// One observable moment in a tool call's lifecycle.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A call entered the pipeline (fires exactly once per call).
    ToolRequested {
        /// Unique id for this call.
        call_id: String,
        /// Tool name.
        name: String,
        /// Raw input parameters.
        params: Value,
    },

    /// The policy engine evaluated the call.
    PolicyEvaluated {
        call_id: String,
        name: String,
        /// Raw policy decision, before mode overrides.
        decision: PolicyDecision,
        /// Rule that matched, if any.
        matched_rule: Option<String>,
    },

    /// The call suspended waiting for operator confirmation.
    ConfirmationRequested {
        call_id: String,
        name: String,
        details: ConfirmationDetails,
    },

    /// The operator (or responder) answered.
    ConfirmationResolved {
        call_id: String,
        name: String,
        approved: bool,
        reason: Option<String>,
    },

    /// The executor is about to run (all gates passed).
    ToolExecuting { call_id: String, name: String },

    /// The executor finished successfully.
    ToolCompleted {
        call_id: String,
        name: String,
        output: ToolOutput,
        duration: Duration,
    },

    /// The call failed in any state.
    ToolFailed {
        call_id: String,
        name: String,
        kind: ErrorKind,
        error: String,
        duration: Duration,
    },
}

/// Hook for observing pipeline events.
///
/// # Example
///
/// ```rust
/// use warden_core::events::{PipelineEvent, PipelineHook};
///
/// struct Logger;
///
/// impl PipelineHook for Logger {
///     fn on_event(&self, event: &PipelineEvent) {
///         if let PipelineEvent::ToolRequested { name, .. } = event {
///             eprintln!("tool requested: {}", name);
///         }
///     }
/// }
/// ```
pub trait PipelineHook: Send + Sync {
    /// Called synchronously as each event occurs.
    fn on_event(&self, event: &PipelineEvent);
}

/// Blanket implementation for closures.
impl<F> PipelineHook for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn on_event(&self, event: &PipelineEvent) {
        self(event)
    }
}
