//! Update Scheduler
//!
//! The scheduler coalesces every computation invalidated within one logical
//! turn into a single flush.
//!
//! # Algorithm
//!
//! 1. When a source changes, each subscriber is enqueued. The pending queue
//!    is an insertion-ordered set, so a computation enqueued N times is
//!    still pending once.
//! 2. The first enqueue of a turn raises the `flush_scheduled` flag and asks
//!    the driver for exactly one flush. Later enqueues see the flag and do
//!    not ask again.
//! 3. A flush lowers the flag *before* doing any work, then walks a snapshot
//!    of the queue in enqueue order. Writes made by the computations it runs
//!    therefore schedule a fresh flush instead of looping the current one.
//!
//! There is no topological ordering: computations run in the order they
//! were first enqueued.

use indexmap::IndexSet;

use super::node::NodeId;

/// The pending queue plus the single flush-in-flight flag.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    /// Pending computations in first-enqueue order.
    pending: IndexSet<NodeId>,

    /// Whether a flush has been requested and not yet started.
    flush_scheduled: bool,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a computation to the pending queue.
    ///
    /// Returns `true` if the caller must request a flush from the driver.
    pub fn enqueue(&mut self, node: NodeId) -> bool {
        self.pending.insert(node);
        if self.flush_scheduled {
            return false;
        }
        self.flush_scheduled = true;
        true
    }

    /// Start a flush: lower the flag and snapshot the queue.
    pub fn begin_flush(&mut self) -> Vec<NodeId> {
        self.flush_scheduled = false;
        self.pending.iter().copied().collect()
    }

    /// Remove a computation that is about to run.
    ///
    /// Returns `false` if it was no longer pending, e.g. because it was
    /// disposed earlier in the same flush.
    pub fn take(&mut self, node: NodeId) -> bool {
        self.pending.shift_remove(&node)
    }

    /// Lower the flag after the driver failed to schedule a flush, so the
    /// next enqueue asks again.
    pub fn abort_flush(&mut self) {
        self.flush_scheduled = false;
    }

    /// Drop a computation from the queue without running it.
    pub fn cancel(&mut self, node: NodeId) {
        self.pending.shift_remove(&node);
    }

    pub fn is_pending(&self, node: NodeId) -> bool {
        self.pending.contains(&node)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }
}
