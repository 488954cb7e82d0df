//! Error Types
//!
//! The engine never lets a failure escape a flush. Instead, every isolated
//! failure is logged through `tracing` and recorded as a [`ReactiveError`]
//! in the runtime's diagnostics buffer (see
//! [`take_diagnostics`](crate::reactive::take_diagnostics)).

use thiserror::Error;

use crate::graph::NodeId;

/// Errors and usage faults detected by the reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// `on_cleanup` was called with no computation or root in scope.
    #[error("on_cleanup called outside of any computation or root; cleanup dropped")]
    CleanupOutsideOwner,

    /// A computation body panicked during its initial run or a flush.
    #[error("computation {node} panicked: {message}")]
    ComputationPanicked { node: NodeId, message: String },

    /// A cleanup callback registered on a computation or root panicked.
    #[error("cleanup of {node} panicked: {message}")]
    CleanupPanicked { node: NodeId, message: String },

    /// A computation wrote a source it had read during the same run. The
    /// re-enqueue is dropped.
    #[error("computation {node} re-triggered itself while running; skipped")]
    SelfCycle { node: NodeId },

    /// The body passed to `create_root` panicked. The root is still usable.
    #[error("root setup panicked: {message}")]
    RootSetupPanicked { message: String },

    /// `run_until_idle` gave up because flushes kept scheduling new flushes.
    #[error("flush did not settle after {passes} passes")]
    FlushLimitExceeded { passes: usize },

    /// The flush driver could not schedule a requested flush. Pending
    /// computations stay queued.
    #[error("flush request failed: {message}")]
    FlushRequestFailed { message: String },

    /// A runtime configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ReactiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_handles_str_and_string() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn errors_render_node_ids() {
        let err = ReactiveError::SelfCycle { node: NodeId::from(3) };
        assert_eq!(
            err.to_string(),
            "computation node#3 re-triggered itself while running; skipped"
        );
    }
}
