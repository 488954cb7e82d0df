//! Memo Implementation
//!
//! A Memo is a cached derived value. It is a computation (it tracks the
//! sources it reads and re-runs when they change) and a source at the same
//! time (other computations can read it and depend on it).
//!
//! # How Memos Work
//!
//! 1. On creation, the memo runs its computation and caches the result.
//!
//! 2. When a dependency changes, the memo is enqueued like an effect and
//!    recomputes on the next flush.
//!
//! 3. If the fresh value equals the cached one, nothing else happens.
//!    Otherwise the cache is replaced and the memo's own subscribers are
//!    enqueued.
//!
//! 4. Reads return the cached value; they never recompute. A memo whose
//!    computation has not completed yet reads as `None`.
//!
//! Because recomputation happens in a flush, a chain `signal -> memo ->
//! effect` settles over two flushes: the first recomputes the memo, whose
//! change enqueues the effect for the next one.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::graph::{NodeId, NodeKind, RunFn};

use super::runtime::{self, Disposable, Trackable};
use super::SourceId;

struct MemoInner<T> {
    node: NodeId,
    source: SourceId,
    /// `None` until the first computation succeeds.
    value: RefCell<Option<T>>,
}

impl<T> MemoInner<T>
where
    T: PartialEq,
{
    fn refresh(&self, next: T) {
        let changed = self.value.borrow().as_ref() != Some(&next);
        if changed {
            *self.value.borrow_mut() = Some(next);
            runtime::notify(self.source);
        }
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        runtime::dispose_node(self.node);
        runtime::release_source(self.source);
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. Must be Clone + PartialEq.
///
/// The PartialEq bound is needed to detect when the computed value actually
/// changed (some memos might return the same value even if inputs changed).
///
/// Dropping the last handle disposes the memo's computation.
pub struct Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    inner: Rc<MemoInner<T>>,
}

impl<T> Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation runs immediately.
    pub fn new<F>(mut compute: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<MemoInner<T>>| {
            let weak = weak.clone();
            let run: RunFn = Rc::new(RefCell::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let next = compute();
                    inner.refresh(next);
                }
            }));
            MemoInner {
                node: runtime::create_node(NodeKind::Memo, Some(run)),
                source: SourceId::new(),
                value: RefCell::new(None),
            }
        });
        runtime::run_node(inner.node);
        Self { inner }
    }

    /// Get the memo's computation node ID.
    pub fn id(&self) -> NodeId {
        self.inner.node
    }

    /// Get the cached value, tracking the read.
    ///
    /// Returns `None` until the computation completes once. A later failed
    /// run keeps the previous value.
    pub fn get(&self) -> Option<T> {
        runtime::track_read(self.inner.source);
        self.inner.value.borrow().clone()
    }

    /// Get the cached value without tracking the read.
    pub fn get_untracked(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Stop recomputing. The last cached value stays readable.
    pub fn dispose(&self) {
        runtime::dispose_node(self.inner.node);
    }

    pub fn is_disposed(&self) -> bool {
        runtime::is_node_disposed(self.inner.node)
    }

    /// Get the number of times the computation has run.
    pub fn run_count(&self) -> usize {
        runtime::node_run_count(self.inner.node)
    }

    /// Get the number of dependents.
    pub fn dependent_count(&self) -> usize {
        runtime::subscriber_count(self.inner.source)
    }
}

impl<T> Trackable for Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    fn source_id(&self) -> SourceId {
        self.inner.source
    }
}

impl<T> Disposable for Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    fn dispose(&self) {
        Memo::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Memo::is_disposed(self)
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.node)
            .field("value", &self.get_untracked())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

/// Create a memo. Shorthand for [`Memo::new`].
pub fn create_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    Memo::new(compute)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_effect, create_signal, flush, run_until_idle, take_diagnostics};
    use std::cell::Cell;

    #[test]
    fn memo_computes_on_creation() {
        let call_count = Rc::new(Cell::new(0));
        let counter = call_count.clone();

        let memo = Memo::new(move || {
            counter.set(counter.get() + 1);
            42
        });

        assert!(memo.has_value());
        assert_eq!(call_count.get(), 1);
        assert_eq!(memo.get(), Some(42));
    }

    #[test]
    fn memo_caches_value_between_changes() {
        let call_count = Rc::new(Cell::new(0));
        let signal = create_signal(2);

        let counter = call_count.clone();
        let input = signal.clone();
        let memo = Memo::new(move || {
            counter.set(counter.get() + 1);
            input.get() * 10
        });

        for _ in 0..3 {
            assert_eq!(memo.get(), Some(20));
        }
        assert_eq!(call_count.get(), 1);

        signal.set(3);
        // Reads before the flush still see the cache.
        assert_eq!(memo.get(), Some(20));
        flush();
        assert_eq!(memo.get(), Some(30));
        assert_eq!(memo.get(), Some(30));
        assert_eq!(call_count.get(), 2);
    }

    #[test]
    fn unchanged_result_does_not_notify() {
        let signal = create_signal(4);
        let input = signal.clone();
        let parity = Memo::new(move || input.get() % 2);

        let runs = Rc::new(Cell::new(0));
        let reader = parity.clone();
        let counter = runs.clone();
        let _effect = create_effect(move || {
            reader.get();
            counter.set(counter.get() + 1);
        });

        signal.set(6);
        run_until_idle();
        assert_eq!(runs.get(), 1);

        signal.set(7);
        run_until_idle();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn memo_depends_on_memo() {
        let base = create_signal(5);

        let input = base.clone();
        let doubled = Memo::new(move || input.get() * 2);

        let inner = doubled.clone();
        let plus_ten = Memo::new(move || inner.get().unwrap_or_default() + 10);

        assert_eq!(doubled.get(), Some(10));
        assert_eq!(plus_ten.get(), Some(20));
        assert_eq!(doubled.dependent_count(), 1);

        base.set(10);
        run_until_idle();

        assert_eq!(doubled.get(), Some(20));
        assert_eq!(plus_ten.get(), Some(30));
    }

    #[test]
    fn failed_first_computation_reads_as_none() {
        let signal = create_signal(0);
        let input = signal.clone();
        let memo: Memo<i32> = Memo::new(move || {
            let value = input.get();
            if value == 0 {
                panic!("no value yet");
            }
            value
        });
        assert!(!memo.has_value());
        assert_eq!(memo.get(), None);
        assert_eq!(take_diagnostics().len(), 1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let reader = memo.clone();
        let log = seen.clone();
        let _effect = create_effect(move || log.borrow_mut().push(reader.get()));
        assert_eq!(*seen.borrow(), vec![None]);

        // The failed run still subscribed to the signal.
        signal.set(7);
        run_until_idle();
        assert_eq!(memo.get(), Some(7));
        assert_eq!(*seen.borrow(), vec![None, Some(7)]);
    }

    #[test]
    fn dropping_last_handle_disposes() {
        let signal = create_signal(1);
        let input = signal.clone();
        let memo = Memo::new(move || input.get());
        let id = memo.id();

        assert_eq!(signal.subscriber_count(), 1);
        drop(memo);
        assert!(runtime::is_node_disposed(id));
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn disposed_memo_keeps_last_value() {
        let signal = create_signal(1);
        let input = signal.clone();
        let memo = Memo::new(move || input.get() + 1);

        memo.dispose();
        signal.set(5);
        flush();
        assert!(memo.is_disposed());
        assert_eq!(memo.get(), Some(2));
    }
}
