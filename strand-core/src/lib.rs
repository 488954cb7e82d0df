//! Strand Core
//!
//! This crate provides the dependency-tracking and scheduling engine of the
//! Strand reactive UI library. It implements:
//!
//! - Reactive primitives (signals, memos, effects, roots)
//! - Automatic dependency tracking through an ambient context
//! - Batched, deduplicated re-execution with cycle and re-entrance guards
//! - Cleanup-on-rerun and scoped disposal
//!
//! Rendering and routing live in other crates and only use the public
//! operations re-exported here.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Reactive primitives, the ambient context and the runtime
//! - `graph`: Computation records, the update scheduler and flush drivers
//! - `config`: Runtime tunables
//! - `error`: Diagnostics reported by the runtime
//!
//! # Example
//!
//! ```rust
//! use strand_core::{create_effect, create_memo, create_signal, run_until_idle};
//!
//! // Create a signal
//! let count = create_signal(0);
//!
//! // Create a derived value
//! let input = count.clone();
//! let doubled = create_memo(move || input.get() * 2);
//!
//! // Create an effect
//! let reader = doubled.clone();
//! create_effect(move || {
//!     println!("Doubled: {:?}", reader.get());
//! });
//!
//! // Update the signal; the effect runs when the flush settles
//! count.set(5);
//! run_until_idle();
//! // Prints: "Doubled: Some(10)"
//! assert_eq!(doubled.get(), Some(10));
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::RuntimeConfig;
pub use error::ReactiveError;
pub use graph::{FlushDriver, ManualDriver, TokioDriver};
pub use reactive::{
    create_effect, create_memo, create_root, create_signal, flush, on_cleanup, run_until_idle,
    untrack, Disposable, Effect, Memo, Root, Signal, Trackable,
};
