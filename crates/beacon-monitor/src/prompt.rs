//! Interactive prompt mediation.
//!
//! At most one prompt is outstanding per session; a new prompt replaces the
//! old one (the remote engine serializes prompts per session). `respond`
//! routes the answer through the control channel and clears the slot
//! optimistically — the authoritative clear is the engine resuming the
//! node, observed as a later start/completion event for it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use beacon_core::errors::PromptError;
use beacon_core::ids::{ExecutionId, NodeId};
use beacon_transport::ControlChannel;

use crate::state::InteractivePromptRequest;

/// Handler invoked when a new prompt is surfaced.
pub type PromptHandler = Box<dyn Fn(&InteractivePromptRequest) + Send + Sync>;

/// Single-slot interactive prompt channel.
pub struct PromptChannel {
    control: Arc<dyn ControlChannel>,
    outstanding: Mutex<Option<InteractivePromptRequest>>,
    handler: Mutex<Option<PromptHandler>>,
}

impl PromptChannel {
    /// Create a channel routing responses through the given control seam.
    pub fn new(control: Arc<dyn ControlChannel>) -> Self {
        Self {
            control,
            outstanding: Mutex::new(None),
            handler: Mutex::new(None),
        }
    }

    /// Register the single-slot prompt callback (replaces any previous one).
    pub fn on_prompt(&self, handler: PromptHandler) {
        *self.handler.lock() = Some(handler);
    }

    /// Surface a new prompt, replacing any outstanding request.
    pub fn surface(&self, request: InteractivePromptRequest) {
        {
            let mut slot = self.outstanding.lock();
            if let Some(old) = slot.replace(request.clone()) {
                debug!(
                    node_id = %old.node_id,
                    "replacing outstanding prompt"
                );
            }
        }
        if let Some(handler) = self.handler.lock().as_ref() {
            handler(&request);
        }
    }

    /// The currently outstanding request, if any.
    #[must_use]
    pub fn outstanding(&self) -> Option<InteractivePromptRequest> {
        self.outstanding.lock().clone()
    }

    /// Clear the outstanding request unconditionally.
    pub fn clear(&self) {
        *self.outstanding.lock() = None;
    }

    /// Clear the outstanding request if it targets the given node.
    pub fn clear_for_node(&self, node_id: &NodeId) {
        let mut slot = self.outstanding.lock();
        if slot.as_ref().is_some_and(|r| &r.node_id == node_id) {
            *slot = None;
        }
    }

    /// Send a response for the outstanding prompt.
    ///
    /// Fails with [`PromptError::NoActivePrompt`] unless the outstanding
    /// request matches the given execution/node pair. The slot clears once
    /// the control channel accepts the response; a send failure keeps the
    /// prompt outstanding so the caller can retry.
    pub async fn respond(
        &self,
        execution_id: &ExecutionId,
        node_id: &NodeId,
        response: &str,
    ) -> Result<(), PromptError> {
        let matches = self.outstanding.lock().as_ref().is_some_and(|request| {
            &request.execution_id == execution_id && &request.node_id == node_id
        });
        if !matches {
            return Err(PromptError::NoActivePrompt {
                execution_id: execution_id.to_string(),
                node_id: node_id.to_string(),
            });
        }

        self.control.respond(execution_id, node_id, response).await?;
        self.clear();
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use beacon_core::errors::ControlError;
    use beacon_transport::ControlAction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Control fake recording respond calls; optionally failing.
    struct FakeControl {
        responds: AtomicUsize,
        fail: bool,
    }

    impl FakeControl {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                responds: AtomicUsize::new(0),
                fail: false,
            })
        }
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                responds: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl ControlChannel for FakeControl {
        async fn control(
            &self,
            _execution_id: &ExecutionId,
            _action: ControlAction,
            _node_id: Option<&NodeId>,
        ) -> Result<(), ControlError> {
            Ok(())
        }

        async fn respond(
            &self,
            _execution_id: &ExecutionId,
            _node_id: &NodeId,
            _response: &str,
        ) -> Result<(), ControlError> {
            if self.fail {
                return Err(ControlError::Request {
                    reason: "socket gone".into(),
                });
            }
            let _ = self.responds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn request(node: &str) -> InteractivePromptRequest {
        InteractivePromptRequest {
            execution_id: ExecutionId::from("exec-1"),
            node_id: NodeId::from(node),
            prompt_text: "Continue?".into(),
            timeout_seconds: None,
        }
    }

    #[test]
    fn surface_invokes_handler() {
        let channel = PromptChannel::new(FakeControl::ok());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        channel.on_prompt(Box::new(move |r| {
            assert_eq!(r.node_id.as_str(), "n1");
            let _ = seen2.fetch_add(1, Ordering::SeqCst);
        }));
        channel.surface(request("n1"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(channel.outstanding().is_some());
    }

    #[test]
    fn new_prompt_replaces_outstanding() {
        let channel = PromptChannel::new(FakeControl::ok());
        channel.surface(request("n1"));
        channel.surface(request("n2"));
        assert_eq!(channel.outstanding().unwrap().node_id.as_str(), "n2");
    }

    #[test]
    fn clear_for_node_matches_only_that_node() {
        let channel = PromptChannel::new(FakeControl::ok());
        channel.surface(request("n1"));
        channel.clear_for_node(&NodeId::from("other"));
        assert!(channel.outstanding().is_some());
        channel.clear_for_node(&NodeId::from("n1"));
        assert!(channel.outstanding().is_none());
    }

    #[tokio::test]
    async fn respond_clears_slot() {
        let control = FakeControl::ok();
        let channel = PromptChannel::new(control.clone());
        channel.surface(request("n1"));
        channel
            .respond(&ExecutionId::from("exec-1"), &NodeId::from("n1"), "yes")
            .await
            .unwrap();
        assert!(channel.outstanding().is_none());
        assert_eq!(control.responds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn respond_without_prompt_is_typed_failure() {
        let channel = PromptChannel::new(FakeControl::ok());
        let err = channel
            .respond(&ExecutionId::from("exec-1"), &NodeId::from("n1"), "yes")
            .await
            .unwrap_err();
        assert_matches!(err, PromptError::NoActivePrompt { .. });
    }

    #[tokio::test]
    async fn respond_with_wrong_node_is_rejected() {
        let channel = PromptChannel::new(FakeControl::ok());
        channel.surface(request("n1"));
        let err = channel
            .respond(&ExecutionId::from("exec-1"), &NodeId::from("n2"), "yes")
            .await
            .unwrap_err();
        assert_matches!(err, PromptError::NoActivePrompt { .. });
        assert!(channel.outstanding().is_some(), "slot untouched");
    }

    #[tokio::test]
    async fn failed_send_keeps_prompt_outstanding() {
        let channel = PromptChannel::new(FakeControl::failing());
        channel.surface(request("n1"));
        let err = channel
            .respond(&ExecutionId::from("exec-1"), &NodeId::from("n1"), "yes")
            .await
            .unwrap_err();
        assert_matches!(err, PromptError::Control(_));
        assert!(channel.outstanding().is_some(), "caller can retry");
    }
}
