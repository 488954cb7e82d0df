//! Flush Drivers
//!
//! A driver decides *when* a requested flush runs. The scheduler asks for
//! at most one flush at a time; the driver must run
//! [`flush`](crate::reactive::flush) later, never from inside
//! `request_flush` itself. A driver that cannot schedule the flush returns
//! an error and the runtime asks again on the next write.
//!
//! - [`ManualDriver`] only counts requests. Tests (and hosts with their own
//!   event loop) call `flush` or `run_until_idle` themselves.
//! - [`TokioDriver`] spawns the flush as a local task on the current
//!   `tokio::task::LocalSet`, so it runs on the next turn of the executor.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::ReactiveError;
use crate::reactive;

/// Strategy used by the runtime to defer a flush.
pub trait FlushDriver {
    /// Arrange for `reactive::flush()` to be called on a later turn.
    fn request_flush(&self) -> Result<(), ReactiveError>;
}

/// A driver that never runs anything on its own.
///
/// This is the default driver of every thread's runtime.
#[derive(Debug, Clone, Default)]
pub struct ManualDriver {
    requests: Rc<Cell<usize>>,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flushes requested so far.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FlushDriver for ManualDriver {
    fn request_flush(&self) -> Result<(), ReactiveError> {
        self.requests.set(self.requests.get() + 1);
        Ok(())
    }
}

/// A driver that flushes on a tokio `LocalSet`.
///
/// Writes must happen inside `LocalSet::run_until` (or a task spawned on
/// the set). Outside a tokio runtime the request fails with
/// [`ReactiveError::FlushRequestFailed`]; outside a `LocalSet` tokio panics,
/// which the runtime catches and reports the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDriver;

impl TokioDriver {
    pub fn new() -> Self {
        Self
    }

    /// Wait until no flush is pending on this thread.
    ///
    /// Each turn parks behind the local tasks already queued, so a flush
    /// that schedules a follow-up flush is waited for as well.
    pub async fn settled() {
        while reactive::is_flush_pending() {
            let marker = tokio::task::spawn_local(async {});
            if marker.await.is_err() {
                tracing::warn!("local marker task was cancelled while waiting for flush");
                break;
            }
        }
    }
}

impl FlushDriver for TokioDriver {
    fn request_flush(&self) -> Result<(), ReactiveError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ReactiveError::FlushRequestFailed {
                message: "no tokio runtime on this thread".to_string(),
            });
        }
        tracing::trace!("spawning flush on local set");
        tokio::task::spawn_local(async {
            reactive::flush();
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_driver_counts_requests() {
        let driver = ManualDriver::new();
        let shared = driver.clone();

        assert!(driver.request_flush().is_ok());
        assert!(shared.request_flush().is_ok());

        assert_eq!(driver.requests(), 2);
    }

    #[tokio::test]
    async fn tokio_driver_runs_flush_on_local_set() {
        use crate::reactive::{create_effect, create_signal, set_driver};
        use std::cell::RefCell;

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                set_driver(TokioDriver::new());

                let seen = Rc::new(RefCell::new(Vec::new()));
                let count = create_signal(0);

                let effect_count = count.clone();
                let effect_seen = seen.clone();
                let _effect = create_effect(move || effect_seen.borrow_mut().push(effect_count.get()));

                count.set(1);
                assert!(reactive::is_flush_pending());
                assert_eq!(*seen.borrow(), vec![0]);

                TokioDriver::settled().await;
                assert_eq!(*seen.borrow(), vec![0, 1]);
            })
            .await;
    }

    #[test]
    fn tokio_driver_without_runtime_keeps_writes_flushable() {
        use crate::reactive::{create_effect, create_signal, flush, set_driver, take_diagnostics};
        use std::cell::RefCell;

        set_driver(TokioDriver::new());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let count = create_signal(0);
        let (reader, log) = (count.clone(), seen.clone());
        let _effect = create_effect(move || log.borrow_mut().push(reader.get()));

        count.set(1);
        assert!(!reactive::is_flush_pending());
        assert!(matches!(
            take_diagnostics().as_slice(),
            [ReactiveError::FlushRequestFailed { .. }]
        ));

        flush();
        assert_eq!(*seen.borrow(), vec![0, 1]);

        // The next write asks the driver again.
        count.set(2);
        assert_eq!(take_diagnostics().len(), 1);
    }

    #[tokio::test]
    async fn tokio_driver_outside_local_set_is_reported() {
        use crate::reactive::{create_effect, create_signal, flush, set_driver, take_diagnostics};

        set_driver(TokioDriver::new());

        let runs = Rc::new(Cell::new(0));
        let count = create_signal(0);
        let (reader, counter) = (count.clone(), runs.clone());
        let _effect = create_effect(move || {
            reader.get();
            counter.set(counter.get() + 1);
        });

        count.set(1);
        assert!(!reactive::is_flush_pending());
        assert!(matches!(
            take_diagnostics().as_slice(),
            [ReactiveError::FlushRequestFailed { .. }]
        ));

        flush();
        assert_eq!(runs.get(), 2);
    }
}
