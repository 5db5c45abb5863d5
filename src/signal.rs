//! Invalidation signal
//!
//! A process-wide dirty flag that decouples mutation sites (note creation,
//! document upload, delete) from the views that list content. Mutations mark
//! the signal dirty; a mounted view consumes the flag and refetches.
//!
//! States are `clean` and `dirty`:
//! - `mark_dirty`: clean|dirty -> dirty (idempotent)
//! - `consume_if_dirty`: dirty -> clean, then runs the callback; no-op on clean
//!
//! The flag is reset *before* the callback runs, so a `mark_dirty` that lands
//! while the callback (typically a refetch) is in progress is kept and
//! triggers another refresh.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;

/// Shared dirty flag coordinating refetch after mutation
#[derive(Debug, Default)]
pub struct InvalidationSignal {
    dirty: AtomicBool,
    /// Total mark_dirty calls, for diagnostics
    marks: AtomicU64,
    notify: Notify,
}

static GLOBAL: OnceLock<Arc<InvalidationSignal>> = OnceLock::new();

impl InvalidationSignal {
    /// Create an independent signal in the clean state
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide signal
    pub fn global() -> Arc<InvalidationSignal> {
        GLOBAL.get_or_init(|| Arc::new(InvalidationSignal::new())).clone()
    }

    /// Mark content as changed. Calling this repeatedly before anyone
    /// consumes the flag has the same effect as calling it once.
    pub fn mark_dirty(&self) {
        let was_dirty = self.dirty.swap(true, Ordering::AcqRel);
        self.marks.fetch_add(1, Ordering::Relaxed);
        if !was_dirty {
            tracing::debug!("Content invalidated");
        }
        self.notify.notify_waiters();
    }

    /// Reset the flag if it is set, returning whether it was.
    ///
    /// Each `true` must be paired with exactly one refetch by the caller.
    pub fn take_dirty(&self) -> bool {
        self.dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// If dirty, reset the flag and run `callback`. Returns whether it ran.
    pub fn consume_if_dirty<F: FnOnce()>(&self, callback: F) -> bool {
        if self.take_dirty() {
            callback();
            true
        } else {
            false
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Number of mark_dirty calls over the signal's lifetime
    pub fn dirty_count(&self) -> u64 {
        self.marks.load(Ordering::Relaxed)
    }

    /// Wait until the signal is dirty. Returns immediately if it already is.
    ///
    /// Does not reset the flag; follow with [`take_dirty`](Self::take_dirty).
    pub async fn wait_dirty(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a mark between the check and the
            // await still wakes us
            notified.as_mut().enable();

            if self.is_dirty() {
                return;
            }
            notified.await;
        }
    }
}
