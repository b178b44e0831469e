//! Mutual exclusion between crawl runs
//!
//! A run starts with an atomic check-and-set on a shared flag. The returned
//! [`RunGuard`] resets the flag when dropped, which covers early returns,
//! `?` propagation and panics alike.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "a run is active" flag
#[derive(Debug, Clone, Default)]
pub struct RunState {
    active: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a run as active
    ///
    /// Returns `None` without side effects when another run already holds
    /// the flag.
    pub fn try_begin(&self) -> Option<RunGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                active: Arc::clone(&self.active),
            })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Proof that the current task owns the run; releases it on drop
#[derive(Debug)]
pub struct RunGuard {
    active: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
