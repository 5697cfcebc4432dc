//! The confirmation protocol between the execution pipeline and an operator.
//!
//! When a call needs human approval the pipeline builds a
//! [`ConfirmationDetails`] value and hands it to the context's
//! [`ConfirmationResponder`], then suspends that call (and only that call)
//! until a [`ConfirmationResponse`] arrives or the call is cancelled. The
//! responder is the whole UI contract: anything that can turn details into
//! an approve/reject answer can drive the pipeline.
//!
//! There is no built-in timeout. Callers that need one wrap the call's
//! cancellation token with a timer when they build the execution context.
//!
//! # Stock responders
//!
//! - [`AutoDenyResponder`] — rejects everything; the secure default for
//!   non-interactive environments (scripts, CI, unattended agents)
//! - [`AutoApproveResponder`] — approves everything
//! - [`ChannelResponder`] — forwards requests over an mpsc channel to a UI
//!   task and routes the reply back to the suspended call
//! - [`ScriptedResponder`] — replays a queue of canned responses and records
//!   every request, for driving the pipeline in tests without a UI

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// What category of action the operator is being asked to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationKind {
    /// A file modification.
    Edit,

    /// A command or process execution.
    Execute,

    /// A mutating call proposed while the session is in plan mode.
    EnterPlanMode,

    /// The dedicated action that leaves plan mode.
    ExitPlanMode,

    /// Anything else.
    Generic,
}

/// A confirmation request, produced by an `ask` policy decision or by a
/// tool's dynamic confirmation predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationDetails {
    /// Action category, used by UIs to pick a dialog style.
    pub kind: ConfirmationKind,

    /// Short heading, names the tool.
    pub title: String,

    /// Human-readable description of what will happen.
    pub message: String,
}

impl ConfirmationDetails {
    /// Details for a file modification.
    pub fn edit(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfirmationKind::Edit,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Details for a command execution.
    pub fn execute(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfirmationKind::Execute,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Details for a mutating call held back by plan mode.
    pub fn plan_violation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfirmationKind::EnterPlanMode,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Details for the plan-mode exit action.
    pub fn exit_plan(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfirmationKind::ExitPlanMode,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Details with no particular category.
    pub fn generic(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfirmationKind::Generic,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// The operator's answer to a confirmation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    /// Whether the call may proceed.
    pub approved: bool,

    /// Operator-supplied reason, usually present on rejection.
    pub reason: Option<String>,
}

impl ConfirmationResponse {
    /// An approval.
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    /// A rejection with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }

    /// A rejection without a reason.
    pub fn rejected_silently() -> Self {
        Self {
            approved: false,
            reason: None,
        }
    }
}

/// Turns confirmation requests into approve/reject responses.
///
/// Supplied by the embedding application per execution context. The
/// pipeline awaits [`request`](Self::request) while the call is suspended;
/// implementations must not block the thread.
#[async_trait]
pub trait ConfirmationResponder: Send + Sync {
    /// Present `details` to the operator and return their answer.
    async fn request(&self, details: ConfirmationDetails) -> ConfirmationResponse;
}

/// Rejects every request. The default responder: secure for environments
/// where no human is available to approve tool calls.
pub struct AutoDenyResponder;

#[async_trait]
impl ConfirmationResponder for AutoDenyResponder {
    async fn request(&self, _details: ConfirmationDetails) -> ConfirmationResponse {
        ConfirmationResponse::rejected("no operator available to approve this action")
    }
}

/// Approves every request.
pub struct AutoApproveResponder;

#[async_trait]
impl ConfirmationResponder for AutoApproveResponder {
    async fn request(&self, _details: ConfirmationDetails) -> ConfirmationResponse {
        ConfirmationResponse::approved()
    }
}

/// A confirmation request in flight over a [`ChannelResponder`].
#[derive(Debug)]
pub struct ConfirmationRequest {
    /// Unique id for correlating UI state with the suspended call.
    pub id: String,

    /// What the operator is being asked.
    pub details: ConfirmationDetails,

    reply: oneshot::Sender<ConfirmationResponse>,
}

impl ConfirmationRequest {
    /// Send the operator's answer back to the suspended call.
    ///
    /// Returns the response unchanged if the call is no longer waiting
    /// (cancelled in the meantime).
    pub fn respond(self, response: ConfirmationResponse) -> Result<(), ConfirmationResponse> {
        self.reply.send(response)
    }

    /// Shorthand for an approval.
    pub fn approve(self) -> Result<(), ConfirmationResponse> {
        self.respond(ConfirmationResponse::approved())
    }

    /// Shorthand for a rejection.
    pub fn reject(self, reason: impl Into<String>) -> Result<(), ConfirmationResponse> {
        self.respond(ConfirmationResponse::rejected(reason))
    }
}

/// Bridges the pipeline to a UI task over an mpsc channel.
///
/// The pipeline side sends a [`ConfirmationRequest`] and awaits the reply;
/// the UI side receives requests, renders a dialog, and calls
/// [`ConfirmationRequest::respond`]. Dropping the receiver (or a pending
/// request) reads as rejection, never as approval.
///
/// # Example
///
/// ```rust
/// use warden_core::confirm::{ChannelResponder, ConfirmationResponder, ConfirmationDetails};
///
/// # tokio_test::block_on(async {
/// let (responder, mut rx) = ChannelResponder::new(8);
///
/// let ui = tokio::spawn(async move {
///     let request = rx.recv().await.unwrap();
///     request.approve().unwrap();
/// });
///
/// let response = responder
///     .request(ConfirmationDetails::generic("demo", "run the demo?"))
///     .await;
/// assert!(response.approved);
/// # ui.await.unwrap();
/// # });
/// ```
pub struct ChannelResponder {
    tx: mpsc::Sender<ConfirmationRequest>,
}

impl ChannelResponder {
    /// Create a responder and the receiver the UI task should drain.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConfirmationRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ConfirmationResponder for ChannelResponder {
    async fn request(&self, details: ConfirmationDetails) -> ConfirmationResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ConfirmationRequest {
            id: Uuid::new_v4().to_string(),
            details,
            reply: reply_tx,
        };

        if self.tx.send(request).await.is_err() {
            return ConfirmationResponse::rejected("confirmation channel closed");
        }

        match reply_rx.await {
            Ok(response) => response,
            Err(_) => ConfirmationResponse::rejected("confirmation request dropped"),
        }
    }
}

/// Test responder that replays a fixed queue of responses and records every
/// request it receives.
///
/// An exhausted queue rejects, so a test that forgets to script a response
/// fails safe rather than silently approving.
pub struct ScriptedResponder {
    script: Mutex<VecDeque<ConfirmationResponse>>,
    seen: Mutex<Vec<ConfirmationDetails>>,
}

impl ScriptedResponder {
    /// A responder with an empty script (rejects everything).
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A responder that will answer with `responses` in order.
    pub fn with_responses(responses: impl IntoIterator<Item = ConfirmationResponse>) -> Self {
        let responder = Self::new();
        responder.script.lock().extend(responses);
        responder
    }

    /// Queue one more response.
    pub fn push(&self, response: ConfirmationResponse) {
        self.script.lock().push_back(response);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ConfirmationDetails> {
        self.seen.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Default for ScriptedResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationResponder for ScriptedResponder {
    async fn request(&self, details: ConfirmationDetails) -> ConfirmationResponse {
        self.seen.lock().push(details);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| ConfirmationResponse::rejected("no scripted response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_deny_rejects() {
        let response = AutoDenyResponder
            .request(ConfirmationDetails::generic("t", "m"))
            .await;
        assert!(!response.approved);
        assert!(response.reason.is_some());
    }

    #[tokio::test]
    async fn test_auto_approve_approves() {
        let response = AutoApproveResponder
            .request(ConfirmationDetails::generic("t", "m"))
            .await;
        assert!(response.approved);
    }

    #[tokio::test]
    async fn test_scripted_responder_replays_in_order() {
        let responder = ScriptedResponder::with_responses([
            ConfirmationResponse::approved(),
            ConfirmationResponse::rejected("second"),
        ]);

        let first = responder
            .request(ConfirmationDetails::execute("a", "first"))
            .await;
        let second = responder
            .request(ConfirmationDetails::execute("b", "second"))
            .await;

        assert!(first.approved);
        assert!(!second.approved);
        assert_eq!(second.reason.as_deref(), Some("second"));
        assert_eq!(responder.request_count(), 2);
        assert_eq!(responder.requests()[0].title, "a");
    }

    #[tokio::test]
    async fn test_scripted_responder_exhausted_rejects() {
        let responder = ScriptedResponder::new();
        let response = responder
            .request(ConfirmationDetails::generic("t", "m"))
            .await;
        assert!(!response.approved);
    }

    #[tokio::test]
    async fn test_channel_responder_round_trip() {
        let (responder, mut rx) = ChannelResponder::new(1);

        let ui = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.details.title, "Bash");
            assert!(!request.id.is_empty());
            request.reject("not today").unwrap();
        });

        let response = responder
            .request(ConfirmationDetails::execute("Bash", "run `rm -rf /tmp/x`?"))
            .await;

        assert!(!response.approved);
        assert_eq!(response.reason.as_deref(), Some("not today"));
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_responder_closed_channel_rejects() {
        let (responder, rx) = ChannelResponder::new(1);
        drop(rx);

        let response = responder
            .request(ConfirmationDetails::generic("t", "m"))
            .await;
        assert!(!response.approved);
    }

    #[test]
    fn test_details_constructors_set_kind() {
        assert_eq!(
            ConfirmationDetails::edit("t", "m").kind,
            ConfirmationKind::Edit
        );
        assert_eq!(
            ConfirmationDetails::execute("t", "m").kind,
            ConfirmationKind::Execute
        );
        assert_eq!(
            ConfirmationDetails::plan_violation("t", "m").kind,
            ConfirmationKind::EnterPlanMode
        );
        assert_eq!(
            ConfirmationDetails::exit_plan("t", "m").kind,
            ConfirmationKind::ExitPlanMode
        );
    }

    #[test]
    fn test_response_serde() {
        let json = serde_json::to_string(&ConfirmationResponse::rejected("why")).unwrap();
        let back: ConfirmationResponse = serde_json::from_str(&json).unwrap();
        assert!(!back.approved);
        assert_eq!(back.reason.as_deref(), Some("why"));
    }
}
