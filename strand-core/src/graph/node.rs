//! Graph Nodes
//!
//! This module defines the computation records that live in the runtime's
//! node arena. A node is the shared shape behind effects, memos and roots.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::reactive::SourceId;

/// The body of a re-runnable computation.
///
/// Shared behind an `Rc` so the runner can call it without holding the
/// runtime borrow.
pub(crate) type RunFn = Rc<RefCell<dyn FnMut()>>;

/// A teardown callback registered with `on_cleanup`.
pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A side-effecting computation. Re-runs when its dependencies change.
    Effect,

    /// A derived value. Re-runs like an effect and caches its result.
    Memo,

    /// A disposal scope. Owns cleanups, never tracks and never re-runs.
    Root,
}

impl NodeKind {
    /// Whether reads performed while this node is ambient record edges.
    pub fn tracks(self) -> bool {
        matches!(self, NodeKind::Effect | NodeKind::Memo)
    }
}

/// A computation record in the runtime's arena.
pub(crate) struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// What kind of node this is.
    kind: NodeKind,

    /// The body. `None` for roots and for nodes whose body was released.
    run: Option<RunFn>,

    /// Cleanups in registration order.
    cleanups: SmallVec<[Cleanup; 2]>,

    /// Sources read during the last run. Mirrors the subscriber sets.
    dependencies: SmallVec<[SourceId; 4]>,

    disposed: bool,
    running: bool,
    run_count: usize,
}

impl Node {
    pub fn new(kind: NodeKind, run: Option<RunFn>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            run,
            cleanups: SmallVec::new(),
            dependencies: SmallVec::new(),
            disposed: false,
            running: false,
            run_count: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Record a dependency. Returns `false` if it was already recorded.
    pub fn add_dependency(&mut self, source: SourceId) -> bool {
        if self.dependencies.contains(&source) {
            return false;
        }
        self.dependencies.push(source);
        true
    }

    pub fn remove_dependency(&mut self, source: SourceId) {
        self.dependencies.retain(|s| *s != source);
    }

    pub fn take_dependencies(&mut self) -> SmallVec<[SourceId; 4]> {
        std::mem::take(&mut self.dependencies)
    }

    pub fn dependencies(&self) -> &[SourceId] {
        &self.dependencies
    }

    pub fn push_cleanup(&mut self, cleanup: Cleanup) {
        self.cleanups.push(cleanup);
    }

    pub fn take_cleanups(&mut self) -> SmallVec<[Cleanup; 2]> {
        std::mem::take(&mut self.cleanups)
    }

    pub fn run_fn(&self) -> Option<RunFn> {
        self.run.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn mark_disposed(&mut self) {
        self.disposed = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn run_count(&self) -> usize {
        self.run_count
    }

    pub fn record_run(&mut self) {
        self.run_count += 1;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("cleanups", &self.cleanups.len())
            .field("disposed", &self.disposed)
            .field("running", &self.running)
            .field("run_count", &self.run_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn only_effects_and_memos_track() {
        assert!(NodeKind::Effect.tracks());
        assert!(NodeKind::Memo.tracks());
        assert!(!NodeKind::Root.tracks());
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let mut node = Node::new(NodeKind::Effect, None);
        let a = SourceId::new();
        let b = SourceId::new();

        assert!(node.add_dependency(a));
        assert!(node.add_dependency(b));
        assert!(!node.add_dependency(a));
        assert_eq!(node.dependencies(), &[a, b]);

        node.remove_dependency(a);
        assert_eq!(node.dependencies(), &[b]);

        let taken = node.take_dependencies();
        assert_eq!(taken.as_slice(), &[b]);
        assert!(node.dependencies().is_empty());
    }

    #[test]
    fn cleanups_keep_registration_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut node = Node::new(NodeKind::Root, None);
        for i in 0..3 {
            let log = log.clone();
            node.push_cleanup(Box::new(move || log.borrow_mut().push(i)));
        }

        for cleanup in node.take_cleanups() {
            cleanup();
        }
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(node.take_cleanups().is_empty());
    }
}
