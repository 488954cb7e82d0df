//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, effects
//! and roots. These primitives form the foundation of Strand's fine-grained
//! reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (a memo or effect), the signal automatically
//! registers that computation as a dependent. When the signal's value
//! changes, all dependents are enqueued for the next flush.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It recomputes when one
//! of its dependencies changes and notifies its own dependents only if the
//! result is different.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! external systems, such as updating the DOM or logging.
//!
//! ## Roots
//!
//! A Root is a disposal scope. Computations and cleanups created under it
//! are torn down when it is disposed.
//!
//! # Batching
//!
//! Writes are synchronous, reactions are not. Every computation invalidated
//! during a turn runs at most once in the next flush, however many of its
//! dependencies changed. When the flush happens is up to the installed
//! [`FlushDriver`](crate::graph::FlushDriver).
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, register the dependency.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod context;
mod effect;
mod memo;
mod root;
mod runtime;
mod signal;
mod subscriber;

pub use context::ReactiveContext;
pub use effect::{create_effect, Effect};
pub use memo::{create_memo, Memo};
pub use root::{create_root, Root};
pub use runtime::{
    configure, flush, is_flush_pending, on_cleanup, run_until_idle, set_driver, take_diagnostics,
    untrack, Disposable, Trackable,
};
pub use signal::{create_signal, Signal};
pub use subscriber::SourceId;
