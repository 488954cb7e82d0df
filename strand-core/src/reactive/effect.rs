//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is enqueued and re-runs on
//!    the next flush, at most once per flush.
//!
//! 3. Before re-running, the effect runs the cleanups registered during its
//!    previous run and drops its old dependencies, then tracks new ones
//!    during execution.
//!
//! # Use Cases
//!
//! Effects are used to synchronize reactive state with the outside world:
//!
//! - Updating the DOM when state changes
//! - Logging state changes
//! - Making network requests
//!
//! # Differences from Memo
//!
//! - Memos cache a value and can be read; effects cannot.
//! - Both run eagerly at creation and on every flush that finds them dirty.
//!
//! # Cleanup
//!
//! Call [`on_cleanup`](super::on_cleanup) from inside the body to register
//! teardown for resources like event listeners or timers. Cleanups run in
//! registration order before the next run and on disposal.

use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::{NodeId, NodeKind, RunFn};

use super::runtime::{self, Disposable};

/// Handle to a side-effecting computation.
///
/// The handle is a plain id: dropping it does **not** stop the effect.
/// Call [`Effect::dispose`], or let the owning root dispose it.
///
/// # Example
///
/// ```rust
/// use strand_core::reactive::{create_effect, create_signal, flush};
///
/// let count = create_signal(0);
///
/// let reader = count.clone();
/// let effect = create_effect(move || {
///     println!("Count is: {}", reader.get());
/// });
///
/// count.set(5);
/// flush(); // Prints: "Count is: 5"
/// effect.dispose();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    id: NodeId,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let run: RunFn = Rc::new(RefCell::new(run));
        let id = runtime::create_node(NodeKind::Effect, Some(run));
        runtime::run_node(id);
        Self { id }
    }

    /// Get the effect's node ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Dispose of the effect.
    ///
    /// Runs its cleanups, removes it from every subscriber set and from the
    /// pending queue. After disposal, the effect will not run again.
    pub fn dispose(&self) {
        runtime::dispose_node(self.id);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        runtime::is_node_disposed(self.id)
    }

    /// Whether the effect is waiting for the next flush.
    pub fn is_scheduled(&self) -> bool {
        runtime::is_node_scheduled(self.id)
    }

    /// Get the number of times the effect has run. Zero once disposed.
    pub fn run_count(&self) -> usize {
        runtime::node_run_count(self.id)
    }

    /// Get the number of dependencies recorded by the last run.
    pub fn dependency_count(&self) -> usize {
        runtime::node_dependency_count(self.id)
    }
}

impl Disposable for Effect {
    fn dispose(&self) {
        Effect::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Effect::is_disposed(self)
    }
}

/// Create an effect. Shorthand for [`Effect::new`].
pub fn create_effect<F>(run: F) -> Effect
where
    F: FnMut() + 'static,
{
    Effect::new(run)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
