//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracking context (memo/effect), the
//!    signal registers that computation as a subscriber.
//!
//! 2. When a signal is written with a value different from the current one,
//!    every subscriber is enqueued in the scheduler. Writing an equal value
//!    does nothing at all.
//!
//! 3. Subscribers re-run on the next flush, not inside `set`.
//!
//! # Ownership
//!
//! A `Signal` is a cheap handle; clones share the same value. The
//! subscriber set lives in the runtime and is released when the last
//! handle is dropped.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::runtime::{self, Trackable};
use super::SourceId;

struct SignalInner<T> {
    id: SourceId,
    value: RefCell<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        runtime::release_source(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust
/// use strand_core::reactive::create_signal;
///
/// let count = create_signal(0);
///
/// // Read the value
/// assert_eq!(count.get(), 0);
///
/// // Update the value (enqueues subscribers)
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T>
where
    T: 'static,
{
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: SourceId::new(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a tracking context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        runtime::track_read(self.inner.id);
        self.inner.value.borrow().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value (tracked) without cloning it.
    ///
    /// The signal must not be written from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        runtime::track_read(self.inner.id);
        f(&self.inner.value.borrow())
    }

    /// Set a new value and enqueue subscribers.
    ///
    /// Does nothing if the new value equals the current one.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.inner.value.borrow_mut();
            if *guard == value {
                return;
            }
            *guard = value;
        }

        runtime::notify(self.inner.id);
    }

    /// Update the value using a function.
    ///
    /// This is useful for updates that depend on the current value. The
    /// read is untracked.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.inner.value.borrow();
            f(&guard)
        };
        self.set(new_value);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        runtime::subscriber_count(self.inner.id)
    }
}

impl<T> Trackable for Signal<T>
where
    T: 'static,
{
    fn source_id(&self) -> SourceId {
        self.inner.id
    }
}

impl<T> Clone for Signal<T>
where
    T: 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Create a new signal. Shorthand for [`Signal::new`].
pub fn create_signal<T>(value: T) -> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    Signal::new(value)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
