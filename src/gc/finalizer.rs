/*!
 * Finalizer Registry
 * Runs cleanup exactly once when a managed wrapper becomes unreachable
 */

use crate::core::types::WrapperId;
use ahash::RandomState;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// Cleanup closure armed for a wrapper
type Finalizer = Box<dyn FnOnce() + Send + Sync>;

/// Registry mapping wrapper identity to a pending cleanup closure.
///
/// The host collector calls [`notify_unreachable`](Self::notify_unreachable)
/// at most once per registration, strictly before reclaiming the wrapper,
/// and with only finalization context available. Cleanup is idempotent by
/// construction: the entry is atomically removed before its closure runs,
/// so late, repeated, or post-cancellation notifications are no-ops.
pub struct FinalizerRegistry {
    entries: Arc<DashMap<WrapperId, Finalizer, RandomState>>,
}

impl FinalizerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Arm a cleanup closure for `wrapper`, replacing any previous one.
    ///
    /// Callers maintain at most one registration per wrapper; a replaced
    /// entry would mean a buffer was attached twice without release.
    pub fn arm(&self, wrapper: WrapperId, finalizer: Finalizer) {
        let previous = self.entries.insert(wrapper, finalizer);
        debug_assert!(previous.is_none(), "finalizer re-armed for {wrapper}");
        debug!("Armed finalizer for {}", wrapper);
    }

    /// Revoke a pending registration, e.g. on explicit dispose.
    /// Returns whether a registration was actually armed.
    pub fn cancel(&self, wrapper: WrapperId) -> bool {
        let cancelled = self.entries.remove(&wrapper).is_some();
        if cancelled {
            debug!("Cancelled finalizer for {}", wrapper);
        }
        cancelled
    }

    /// Collector entry point: the wrapper is no longer reachable.
    ///
    /// Removes the entry first, then runs it, so a racing explicit dispose
    /// and a late finalization pass still release exactly once. Returns
    /// whether a cleanup closure ran.
    pub fn notify_unreachable(&self, wrapper: WrapperId) -> bool {
        match self.entries.remove(&wrapper) {
            Some((_, finalizer)) => {
                debug!("Running finalizer for unreachable {}", wrapper);
                finalizer();
                true
            }
            None => false,
        }
    }

    /// Whether a registration is currently armed for `wrapper`
    pub fn is_armed(&self, wrapper: WrapperId) -> bool {
        self.entries.contains_key(&wrapper)
    }

    /// Number of armed registrations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Clone for FinalizerRegistry {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl Default for FinalizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
