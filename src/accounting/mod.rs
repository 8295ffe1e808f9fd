/*!
 * External Memory Accounting
 * Tracks net native bytes attributed to the managed heap and reports them
 * to the collector's pressure heuristics
 */

use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Collector-side pressure hook.
///
/// The accountant reports every adjustment here so the collector can factor
/// external memory into its scheduling heuristics (the counterpart of V8's
/// `AdjustAmountOfExternalAllocatedMemory`).
pub trait PressureHook: Send + Sync {
    /// Called after each adjustment with the delta applied and the new total.
    fn external_memory_adjusted(&self, delta: i64, total: i64);
}

/// Accounting snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountingStats {
    pub external_bytes: i64,
    pub peak_external_bytes: i64,
    pub adjustments: usize,
}

/// External memory accountant.
///
/// A signed running total of native bytes attributable to managed wrappers.
/// Exactly one positive adjustment per attachment and one matching negative
/// adjustment per release; a negative total indicates a double-accounting
/// bug upstream.
pub struct MemoryAccountant {
    total: Arc<AtomicI64>,
    peak: Arc<AtomicI64>,
    adjustments: Arc<AtomicUsize>,
    hook: Arc<RwLock<Option<Arc<dyn PressureHook>>>>,
}

impl MemoryAccountant {
    pub fn new() -> Self {
        Self {
            total: Arc::new(AtomicI64::new(0)),
            peak: Arc::new(AtomicI64::new(0)),
            adjustments: Arc::new(AtomicUsize::new(0)),
            hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Install the collector's pressure hook
    pub fn set_pressure_hook(&self, hook: Arc<dyn PressureHook>) {
        *self.hook.write() = Some(hook);
    }

    /// Apply a signed delta from a single allocation or release event and
    /// return the new total.
    pub fn adjust(&self, delta: i64) -> i64 {
        if delta == 0 {
            return self.total.load(Ordering::SeqCst);
        }

        let new_total = self.total.fetch_add(delta, Ordering::SeqCst) + delta;
        self.adjustments.fetch_add(1, Ordering::SeqCst);
        self.peak.fetch_max(new_total, Ordering::SeqCst);

        debug_assert!(
            new_total >= 0,
            "external memory total went negative ({new_total}): double release?"
        );
        if new_total < 0 {
            warn!(
                "External memory total went negative ({} after delta {}), double release suspected",
                new_total, delta
            );
        }

        if let Some(hook) = self.hook.read().as_ref() {
            hook.external_memory_adjusted(delta, new_total);
        }

        new_total
    }

    /// Current net external bytes
    pub fn external_bytes(&self) -> i64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Highest total observed since construction
    pub fn peak_external_bytes(&self) -> i64 {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> AccountingStats {
        AccountingStats {
            external_bytes: self.external_bytes(),
            peak_external_bytes: self.peak_external_bytes(),
            adjustments: self.adjustments.load(Ordering::SeqCst),
        }
    }
}

impl Clone for MemoryAccountant {
    fn clone(&self) -> Self {
        Self {
            total: Arc::clone(&self.total),
            peak: Arc::clone(&self.peak),
            adjustments: Arc::clone(&self.adjustments),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl Default for MemoryAccountant {
    fn default() -> Self {
        Self::new()
    }
}
