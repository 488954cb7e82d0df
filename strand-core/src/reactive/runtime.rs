//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos,
//! effects and roots. It owns the node arena, the subscriber sets of every
//! live source and the scheduler, and it implements the computation runner
//! shared by effects and memos.
//!
//! # How It Works
//!
//! 1. When a computation is created, it is inserted into the arena and, if
//!    another computation or root is in scope, its disposer is registered
//!    as a cleanup of that owner.
//!
//! 2. When a computation reads a source, the runtime records the edge on
//!    both sides: the node joins the source's subscriber set and the source
//!    joins the node's dependency list.
//!
//! 3. When a source changes, the runtime enqueues every subscriber. The
//!    first enqueue of a turn asks the flush driver for one flush.
//!
//! 4. A run tears down the previous run's cleanups and edges, enters the
//!    node's context, executes the body under `catch_unwind`, and restores
//!    the previous context.
//!
//! # Threading
//!
//! There is one runtime per thread and nothing in it is `Send`. The
//! `RefCell` around it is never borrowed while user code runs: bodies,
//! cleanups and dropped closures all execute between borrows.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::config::RuntimeConfig;
use crate::error::{panic_message, ReactiveError};
use crate::graph::{Cleanup, FlushDriver, ManualDriver, Node, NodeId, NodeKind, RunFn, UpdateScheduler};

use super::context::ReactiveContext;
use super::subscriber::{SourceId, SubscriberSet};

/// A value source that computations can depend on.
pub trait Trackable {
    /// The id keying this source's subscriber set.
    fn source_id(&self) -> SourceId;

    /// Record a dependency of the current computation on this source
    /// without reading the value.
    fn track(&self) {
        track_read(self.source_id());
    }
}

/// A computation or scope with an explicit end of life.
pub trait Disposable {
    /// Tear down the computation. Calling this more than once is a no-op.
    fn dispose(&self);

    /// Whether `dispose` has been called (or the owner disposed it).
    fn is_disposed(&self) -> bool;
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// The per-thread reactive runtime.
pub(crate) struct Runtime {
    /// All live computations and roots, keyed by id.
    nodes: HashMap<NodeId, Node>,

    /// Subscriber sets of sources that currently have subscribers.
    sources: HashMap<SourceId, SubscriberSet>,

    scheduler: UpdateScheduler,
    driver: Rc<dyn FlushDriver>,
    config: RuntimeConfig,

    /// Most recent isolated failures, oldest first.
    diagnostics: VecDeque<ReactiveError>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            sources: HashMap::new(),
            scheduler: UpdateScheduler::new(),
            driver: Rc::new(ManualDriver::new()),
            config: RuntimeConfig::default(),
            diagnostics: VecDeque::new(),
        }
    }

    fn report(&mut self, err: ReactiveError) {
        let capacity = self.config.diagnostics_capacity;
        if capacity == 0 {
            return;
        }
        while self.diagnostics.len() >= capacity {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(err);
    }

    /// Remove `node` from the subscriber sets of `sources`.
    fn unlink(&mut self, node: NodeId, sources: impl IntoIterator<Item = SourceId>) {
        for source in sources {
            if let Some(set) = self.sources.get_mut(&source) {
                set.remove(node);
                if set.is_empty() {
                    self.sources.remove(&source);
                }
            }
        }
    }

    /// Returns `(disposed, running)` or `None` for unknown nodes.
    fn node_state(&self, node: NodeId) -> Option<(bool, bool)> {
        self.nodes
            .get(&node)
            .map(|n| (n.is_disposed(), n.is_running()))
    }

    /// Returns `true` if the caller must request a flush.
    fn enqueue(&mut self, node: NodeId) -> bool {
        match self.node_state(node) {
            None | Some((true, _)) => false,
            Some((false, true)) => {
                tracing::warn!(node = %node, "computation re-triggered itself while running; skipping");
                self.report(ReactiveError::SelfCycle { node });
                false
            }
            Some((false, false)) => self.scheduler.enqueue(node),
        }
    }

    /// Pop `node` from the pending queue and decide whether it runs now.
    ///
    /// A node leaves the queue before it starts running and `enqueue`
    /// refuses running nodes, so a queued node is never running here.
    fn take_due(&mut self, node: NodeId) -> bool {
        self.scheduler.take(node) && self.node_state(node) == Some((false, false))
    }

    /// Tear down the previous run's edges and mark the node running.
    fn begin_run(&mut self, id: NodeId) -> Option<RunFn> {
        let node = self.nodes.get_mut(&id)?;
        if node.is_disposed() {
            return None;
        }
        let run = node.run_fn()?;
        let dependencies = node.take_dependencies();
        node.set_running(true);
        self.unlink(id, dependencies);
        Some(run)
    }

    /// Clear the running flag. Returns the node if it was disposed mid-run
    /// so the caller can drop it outside the borrow.
    fn finish_run(&mut self, id: NodeId, failure: Option<String>) -> Option<Node> {
        if let Some(message) = failure {
            tracing::error!(node = %id, error = %message, "computation panicked");
            self.report(ReactiveError::ComputationPanicked { node: id, message });
        }

        let node = self.nodes.get_mut(&id)?;
        node.set_running(false);
        node.record_run();
        if !node.is_disposed() {
            return None;
        }
        let dependencies = node.take_dependencies();
        self.unlink(id, dependencies);
        self.nodes.remove(&id)
    }

    fn begin_dispose(&mut self, id: NodeId) -> Option<(Vec<Cleanup>, Option<Node>)> {
        let node = self.nodes.get_mut(&id)?;
        if node.is_disposed() {
            return None;
        }
        node.mark_disposed();
        let cleanups = node.take_cleanups().into_vec();
        let dependencies = node.take_dependencies();
        let running = node.is_running();

        self.unlink(id, dependencies);
        self.scheduler.cancel(id);

        // A running node is removed by `finish_run` once its body returns.
        let removed = if running { None } else { self.nodes.remove(&id) };
        Some((cleanups, removed))
    }
}

fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> R {
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

/// Like `with_runtime`, but does nothing during thread teardown or if the
/// runtime is already borrowed. Used from `Drop` impls.
fn try_with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME
        .try_with(|rt| rt.try_borrow_mut().ok().map(|mut rt| f(&mut rt)))
        .ok()
        .flatten()
}

// ----------------------------------------------------------------------------
// Graph maintenance
// ----------------------------------------------------------------------------

/// Insert a new node. Effects and memos are owned by the computation or
/// root in scope, which disposes them from its cleanup list.
///
/// A computation created under an owner that is already disposed is never
/// inserted: it reads as disposed and never runs.
pub(crate) fn create_node(kind: NodeKind, run: Option<RunFn>) -> NodeId {
    let owner = ReactiveContext::current_owner().filter(|_| kind != NodeKind::Root);
    let node = Node::new(kind, run);
    let id = node.id();

    let rejected = with_runtime(|rt| {
        if let Some(owner) = owner {
            // Disposed owners that are not running have left the arena.
            match rt.nodes.get_mut(&owner) {
                Some(owner) if !owner.is_disposed() => {
                    owner.push_cleanup(Box::new(move || dispose_node(id)));
                }
                _ => return Some(node),
            }
        }
        rt.nodes.insert(id, node);
        None
    });

    if let Some(node) = rejected {
        tracing::debug!(node = %id, "owner already disposed; computation not created");
        drop(node);
    }
    id
}

/// Record that the current observer read `source`.
pub(crate) fn track_read(source: SourceId) {
    let Some(observer) = ReactiveContext::current_observer() else {
        return;
    };
    with_runtime(|rt| {
        let Some(node) = rt.nodes.get_mut(&observer) else {
            return;
        };
        if node.is_disposed() || !node.kind().tracks() {
            return;
        }
        if node.add_dependency(source) {
            rt.sources.entry(source).or_default().insert(observer);
        }
    });
}

/// Enqueue every subscriber of `source`.
pub(crate) fn notify(source: SourceId) {
    let driver = with_runtime(|rt| {
        let subscribers = rt
            .sources
            .get(&source)
            .map(SubscriberSet::snapshot)
            .unwrap_or_default();

        let mut request = false;
        for node in subscribers {
            request |= rt.enqueue(node);
        }
        request.then(|| Rc::clone(&rt.driver))
    });

    if let Some(driver) = driver {
        tracing::trace!(source = %source, "requesting flush");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| driver.request_flush()))
            .unwrap_or_else(|payload| {
                Err(ReactiveError::FlushRequestFailed {
                    message: panic_message(payload.as_ref()),
                })
            });
        if let Err(err) = outcome {
            tracing::error!(source = %source, error = %err, "flush driver failed; computations stay queued");
            with_runtime(|rt| {
                rt.scheduler.abort_flush();
                rt.report(err);
            });
        }
    }
}

/// Forget a dropped source and every edge pointing at it.
pub(crate) fn release_source(source: SourceId) {
    try_with_runtime(|rt| {
        if let Some(set) = rt.sources.remove(&source) {
            for node in set.snapshot() {
                if let Some(node) = rt.nodes.get_mut(&node) {
                    node.remove_dependency(source);
                }
            }
        }
    });
}

pub(crate) fn subscriber_count(source: SourceId) -> usize {
    with_runtime(|rt| rt.sources.get(&source).map_or(0, SubscriberSet::len))
}

pub(crate) fn report(err: ReactiveError) {
    with_runtime(|rt| rt.report(err));
}

// ----------------------------------------------------------------------------
// Computation runner
// ----------------------------------------------------------------------------

fn run_cleanups(owner: NodeId, cleanups: impl IntoIterator<Item = Cleanup>) {
    for cleanup in cleanups {
        let _ctx = ReactiveContext::untracked();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(cleanup)) {
            let message = panic_message(payload.as_ref());
            tracing::error!(node = %owner, error = %message, "cleanup panicked");
            report(ReactiveError::CleanupPanicked { node: owner, message });
        }
    }
}

/// Run (or re-run) a computation.
///
/// Cleanups from the previous run execute first, in registration order,
/// then the previous edges are removed and the body runs with this node as
/// the ambient context. A panic in the body is caught and logged; the
/// edges recorded before the panic are kept.
pub(crate) fn run_node(id: NodeId) {
    let cleanups = with_runtime(|rt| match rt.nodes.get_mut(&id) {
        Some(node) if !node.is_disposed() => Some(node.take_cleanups()),
        _ => None,
    });
    let Some(cleanups) = cleanups else {
        return;
    };
    run_cleanups(id, cleanups);

    // A cleanup may have disposed the node.
    let Some(run) = with_runtime(|rt| rt.begin_run(id)) else {
        return;
    };

    tracing::trace!(node = %id, "running computation");
    let outcome = {
        let _ctx = ReactiveContext::enter(id, true);
        panic::catch_unwind(AssertUnwindSafe(|| (&mut *run.borrow_mut())()))
    };
    let failure = outcome.err().map(|payload| panic_message(payload.as_ref()));

    let released = with_runtime(|rt| rt.finish_run(id, failure));
    drop(run);
    drop(released);
}

/// Dispose a computation or root. Idempotent.
pub(crate) fn dispose_node(id: NodeId) {
    let Some((cleanups, removed)) = try_with_runtime(|rt| rt.begin_dispose(id)).flatten() else {
        return;
    };
    tracing::trace!(node = %id, "disposing");
    run_cleanups(id, cleanups);
    drop(removed);
}

pub(crate) fn is_node_disposed(id: NodeId) -> bool {
    with_runtime(|rt| rt.nodes.get(&id).map_or(true, Node::is_disposed))
}

pub(crate) fn node_run_count(id: NodeId) -> usize {
    with_runtime(|rt| rt.nodes.get(&id).map_or(0, Node::run_count))
}

pub(crate) fn node_dependency_count(id: NodeId) -> usize {
    with_runtime(|rt| rt.nodes.get(&id).map_or(0, |n| n.dependencies().len()))
}

pub(crate) fn is_node_scheduled(id: NodeId) -> bool {
    with_runtime(|rt| rt.scheduler.is_pending(id))
}

// ----------------------------------------------------------------------------
// Public operations
// ----------------------------------------------------------------------------

/// Register a teardown callback on the nearest enclosing computation or
/// root.
///
/// Cleanups run in registration order before the owner re-runs and when it
/// is disposed. Called outside of any owner, the callback is dropped with a
/// warning.
pub fn on_cleanup<F>(f: F)
where
    F: FnOnce() + 'static,
{
    let Some(owner) = ReactiveContext::current_owner() else {
        tracing::warn!("on_cleanup called outside of any computation or root; ignoring");
        report(ReactiveError::CleanupOutsideOwner);
        return;
    };

    let rejected = with_runtime(move |rt| match rt.nodes.get_mut(&owner) {
        Some(node) if !node.is_disposed() => {
            node.push_cleanup(Box::new(f));
            None
        }
        _ => Some(f),
    });

    if let Some(f) = rejected {
        tracing::debug!(node = %owner, "owner already disposed; running cleanup now");
        run_cleanups(owner, [Box::new(f) as Cleanup]);
    }
}

/// Run `f` without recording any dependencies.
///
/// The current owner stays in scope, so `on_cleanup` and nested
/// computations still attach to it.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

/// Run one flush: every computation pending when the flush starts runs at
/// most once, in enqueue order.
///
/// Computations enqueued while the flush runs are left for the next one.
/// Nothing raised by a computation escapes this function.
pub fn flush() {
    let batch = with_runtime(|rt| rt.scheduler.begin_flush());
    if batch.is_empty() {
        return;
    }

    tracing::debug!(pending = batch.len(), "flushing computations");
    for id in batch {
        if with_runtime(|rt| rt.take_due(id)) {
            run_node(id);
        }
    }
}

/// Flush repeatedly until no flush is pending.
///
/// Returns the number of passes performed. Gives up after
/// `RuntimeConfig::max_flush_passes` and records a diagnostic.
pub fn run_until_idle() -> usize {
    let max_passes = with_runtime(|rt| rt.config.max_flush_passes);
    let mut passes = 0;
    while is_flush_pending() {
        if passes == max_passes {
            tracing::error!(passes, "flush did not settle");
            report(ReactiveError::FlushLimitExceeded { passes });
            break;
        }
        flush();
        passes += 1;
    }
    passes
}

/// Whether a flush has been requested and has not started yet.
pub fn is_flush_pending() -> bool {
    with_runtime(|rt| rt.scheduler.is_flush_scheduled())
}

/// Install the driver that runs requested flushes on this thread.
pub fn set_driver<D>(driver: D)
where
    D: FlushDriver + 'static,
{
    let driver: Rc<dyn FlushDriver> = Rc::new(driver);
    let previous = with_runtime(|rt| std::mem::replace(&mut rt.driver, driver));
    drop(previous);
}

/// Replace the runtime configuration of this thread.
pub fn configure(config: RuntimeConfig) {
    with_runtime(|rt| {
        let capacity = config.diagnostics_capacity;
        while rt.diagnostics.len() > capacity {
            rt.diagnostics.pop_front();
        }
        rt.config = config;
    });
}

/// Drain the diagnostics recorded on this thread, oldest first.
pub fn take_diagnostics() -> Vec<ReactiveError> {
    with_runtime(|rt| rt.diagnostics.drain(..).collect())
}
