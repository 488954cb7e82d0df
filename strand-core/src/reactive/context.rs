//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! Entering a computation (or a root, or an untracked region) pushes an
//! entry; the guard pops it again when dropped, even if the computation
//! panics. Saving and restoring the previous entry this way makes nested
//! tracking compose: a memo evaluated inside an effect records its own
//! dependencies, and the effect picks up where it left off afterwards.
//!
//! Each entry separates two roles:
//!
//! - the *owner*, which receives `on_cleanup` registrations and nested
//!   computations;
//! - whether reads are *tracked*, i.e. recorded as dependencies of the
//!   owner.
//!
//! A root owns but does not track. `untrack` keeps the owner but stops
//! tracking.

use std::cell::RefCell;

use crate::graph::NodeId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContextEntry {
    /// The computation or root in scope, if any.
    owner: Option<NodeId>,
    /// Whether reads should be recorded against `owner`.
    tracking: bool,
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    entry: ContextEntry,
}

impl ReactiveContext {
    /// Enter the context of the given node.
    ///
    /// With `tracking` set, signals read while the guard lives register the
    /// node as a dependent.
    pub fn enter(owner: NodeId, tracking: bool) -> Self {
        Self::push(ContextEntry {
            owner: Some(owner),
            tracking,
        })
    }

    /// Enter an untracked region that keeps the current owner.
    pub fn untracked() -> Self {
        Self::push(ContextEntry {
            owner: Self::current_owner(),
            tracking: false,
        })
    }

    fn push(entry: ContextEntry) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(entry));
        Self { entry }
    }

    /// Check if reads are currently being tracked.
    pub fn is_tracking() -> bool {
        Self::current_observer().is_some()
    }

    /// The node that should receive dependencies for reads made now.
    pub fn current_observer() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .filter(|entry| entry.tracking)
                .and_then(|entry| entry.owner)
        })
    }

    /// The nearest enclosing computation or root, tracked or not.
    pub fn current_owner() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.owner))
    }

    /// Nesting depth of the context stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The stack may already be gone during thread teardown.
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right context.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry, self.entry,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.entry, entry
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_observer() {
        let id = NodeId::new();

        assert!(!ReactiveContext::is_tracking());
        assert!(ReactiveContext::current_observer().is_none());

        {
            let _ctx = ReactiveContext::enter(id, true);

            assert!(ReactiveContext::is_tracking());
            assert_eq!(ReactiveContext::current_observer(), Some(id));
            assert_eq!(ReactiveContext::current_owner(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_tracking());
        assert!(ReactiveContext::current_owner().is_none());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn untracked_keeps_owner() {
        let id = NodeId::new();
        let _ctx = ReactiveContext::enter(id, true);

        {
            let _untracked = ReactiveContext::untracked();
            assert_eq!(ReactiveContext::current_owner(), Some(id));
            assert!(ReactiveContext::current_observer().is_none());
        }

        assert_eq!(ReactiveContext::current_observer(), Some(id));
    }

    #[test]
    fn owner_without_tracking() {
        let root = NodeId::new();
        let _ctx = ReactiveContext::enter(root, false);

        assert_eq!(ReactiveContext::current_owner(), Some(root));
        assert!(!ReactiveContext::is_tracking());
    }

    #[test]
    fn nested_contexts() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        {
            let _ctx1 = ReactiveContext::enter(id1, true);
            assert_eq!(ReactiveContext::current_observer(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(id2, true);
                assert_eq!(ReactiveContext::current_observer(), Some(id2));
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_observer(), Some(id1));
        }

        assert!(ReactiveContext::current_observer().is_none());
    }

    #[test]
    fn guard_restores_after_panic() {
        let id = NodeId::new();
        let result = std::panic::catch_unwind(|| {
            let _ctx = ReactiveContext::enter(id, true);
            panic!("boom");
        });

        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
