//! Disposal roots.
//!
//! A root is an untracked scope that owns cleanups. Everything created
//! while it is the ambient owner (effects, memos, `on_cleanup` callbacks)
//! is torn down when the root is disposed.
//!
//! ```rust
//! use strand_core::reactive::{create_effect, create_root, create_signal, on_cleanup};
//!
//! let count = create_signal(0);
//! let reader = count.clone();
//!
//! let root = create_root(move |_root| {
//!     create_effect(move || println!("count: {}", reader.get()));
//!     on_cleanup(|| println!("torn down"));
//! });
//!
//! root.dispose();
//! assert_eq!(count.subscriber_count(), 0);
//! ```

use std::panic::{self, AssertUnwindSafe};

use crate::error::{panic_message, ReactiveError};
use crate::graph::{NodeId, NodeKind};

use super::context::ReactiveContext;
use super::runtime::{self, Disposable};

/// Handle to a disposal scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Root {
    id: NodeId,
}

impl Root {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Run every cleanup registered on this root, in registration order.
    /// Calling this more than once is a no-op.
    pub fn dispose(&self) {
        runtime::dispose_node(self.id);
    }

    pub fn is_disposed(&self) -> bool {
        runtime::is_node_disposed(self.id)
    }
}

impl Disposable for Root {
    fn dispose(&self) {
        Root::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Root::is_disposed(self)
    }
}

/// Run `setup` inside a new root and return the root's handle.
///
/// The root is the ambient owner while `setup` runs, but reads are not
/// tracked. A panic in `setup` is caught and logged; the returned root is
/// still valid and owns whatever was registered before the panic.
///
/// Roots are independent of any enclosing owner: disposing an outer
/// computation does not dispose a root created inside it.
pub fn create_root<F>(setup: F) -> Root
where
    F: FnOnce(Root),
{
    let root = Root {
        id: runtime::create_node(NodeKind::Root, None),
    };

    let outcome = {
        let _ctx = ReactiveContext::enter(root.id, false);
        panic::catch_unwind(AssertUnwindSafe(|| setup(root)))
    };

    if let Err(payload) = outcome {
        let message = panic_message(payload.as_ref());
        tracing::error!(node = %root.id, error = %message, "root setup panicked");
        runtime::report(ReactiveError::RootSetupPanicked { message });
    }
    root
}
