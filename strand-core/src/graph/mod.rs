//! Dependency Graph
//!
//! This module holds the bookkeeping side of the engine: the computation
//! records stored in the runtime's arena and the scheduler that batches
//! their re-execution.
//!
//! # Overview
//!
//! - Nodes represent computations (effects, memos) and disposal scopes
//!   (roots). Signals are not nodes; they are sources identified by a
//!   [`SourceId`](crate::reactive::SourceId).
//! - Edges run from a source to the nodes that read it. Each node mirrors
//!   its edges in its own dependency list so teardown is two-way and never
//!   scans every source.
//!
//! # Design Decisions
//!
//! 1. Nodes live in an id-keyed arena owned by the thread's runtime.
//!    Sources and nodes refer to each other by id only, so there are no
//!    reference cycles between signals and computations.
//!
//! 2. The scheduler is a plain data structure. When a flush actually runs
//!    is decided by an injectable [`FlushDriver`].

mod driver;
mod node;
mod scheduler;

pub use driver::{FlushDriver, ManualDriver, TokioDriver};
pub use node::{NodeId, NodeKind};
pub use scheduler::UpdateScheduler;

pub(crate) use node::{Cleanup, Node, RunFn};
