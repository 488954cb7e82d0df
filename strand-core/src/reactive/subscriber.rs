//! Source and subscriber bookkeeping.
//!
//! A source is anything a computation can read reactively: a signal or a
//! memo. Each source owns a subscriber set in the runtime, holding the ids
//! of the computations that read it during their last run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

use crate::graph::NodeId;

/// Unique identifier for a reactive source.
///
/// Each signal and memo gets a unique ID when created. This ID keys its
/// subscriber set in the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Generate a new unique source ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// The computations subscribed to one source.
///
/// Insertion ordered so notification (and therefore flush) order is
/// deterministic.
#[derive(Debug, Default)]
pub(crate) struct SubscriberSet {
    nodes: IndexSet<NodeId>,
}

impl SubscriberSet {
    /// Returns `true` if the node was not subscribed yet.
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    pub fn remove(&mut self, node: NodeId) {
        self.nodes.shift_remove(&node);
    }

    pub fn snapshot(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
