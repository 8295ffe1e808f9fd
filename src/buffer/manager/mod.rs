/*!
 * Buffer Lifecycle Manager
 *
 * Orchestrates allocation, attachment, weak-finalization, explicit disposal,
 * and bounds-checked transfer for wrapper-attached external buffers.
 *
 * ## Lifecycle
 *
 * One slot per wrapper: `Unattached -> Attached -> Released`. `Unattached`
 * exists only mid-allocation; the `Attached -> Released` transition is
 * claimed by atomically removing the slot record, so exactly one of
 * {`dispose`, `on_wrapper_unreachable`} ever runs the release policy even
 * if a host collector finalizes on another thread.
 *
 * ## Ownership
 *
 * An owning slot holds its backing block and the release policy (default
 * free, or a custom closure for embedder-owned memory). A sliced buffer is
 * a non-owning alias view `(block id, byte offset)`: releasing it detaches
 * the view but never frees the block or touches the accountant.
 */

mod alloc;
mod release;
mod storage;
mod transfer;

pub use release::{ReleaseFn, ReleasePolicy, RELEASE_RECORD_OVERHEAD};

use super::traits::{BufferLifecycle, BufferTransfer, ExternalMemoryInfo};
use super::types::{BufferResult, ElementKind};
use crate::accounting::{AccountingStats, MemoryAccountant, PressureHook};
use crate::core::types::{BlockId, Size, WrapperId};
use crate::gc::FinalizerRegistry;
use ahash::RandomState;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use storage::Block;

/// Position of a buffer's bytes inside a backing block
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockView {
    pub block: BlockId,
    pub offset: Size,
}

/// Who frees the backing block when the slot is released
pub(crate) enum Ownership {
    Owned(ReleasePolicy),
    Alias,
}

impl fmt::Debug for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Owned(policy) => write!(f, "Owned({policy:?})"),
            Ownership::Alias => write!(f, "Alias"),
        }
    }
}

/// The per-wrapper external buffer record.
///
/// `view` is `None` iff `byte_length == 0` (the null-data representation).
/// `accounted` is exactly what this slot added to the accountant at
/// attachment and exactly what release subtracts; zero for aliases.
#[derive(Debug)]
pub(crate) struct BufferSlot {
    pub view: Option<BlockView>,
    pub byte_length: Size,
    pub kind: ElementKind,
    pub ownership: Ownership,
    pub accounted: Size,
}

impl BufferSlot {
    pub fn is_alias(&self) -> bool {
        matches!(self.ownership, Ownership::Alias)
    }
}

/// Shared tables behind the manager.
///
/// Finalizer closures capture a clone of this (not the registry), so the
/// registry never holds itself alive through its own entries.
#[derive(Clone)]
pub(crate) struct BufferTable {
    pub slots: Arc<DashMap<WrapperId, BufferSlot, RandomState>>,
    pub storage: Arc<DashMap<BlockId, Block, RandomState>>,
    pub accountant: MemoryAccountant,
    pub next_block: Arc<AtomicU64>,
}

impl BufferTable {
    fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::with_hasher(RandomState::new())),
            storage: Arc::new(DashMap::with_hasher(RandomState::new())),
            accountant: MemoryAccountant::new(),
            next_block: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// External buffer lifecycle manager
pub struct BufferManager {
    pub(crate) table: BufferTable,
    finalizers: FinalizerRegistry,
}

impl BufferManager {
    pub fn new() -> Self {
        Self {
            table: BufferTable::new(),
            finalizers: FinalizerRegistry::new(),
        }
    }

    /// Install the collector's pressure hook at construction
    pub fn with_pressure_hook(self, hook: Arc<dyn PressureHook>) -> Self {
        self.table.accountant.set_pressure_hook(hook);
        self
    }

    /// Weak-finalization registry the host collector drives
    pub fn finalizers(&self) -> &FinalizerRegistry {
        &self.finalizers
    }

    /// Accountant shared by all clones of this manager
    pub fn accountant(&self) -> &MemoryAccountant {
        &self.table.accountant
    }

    /// Whether `wrapper` currently has an attached buffer
    pub fn has_attached_buffer(&self, wrapper: WrapperId) -> bool {
        self.table.slots.contains_key(&wrapper)
    }

    /// Byte length of the attached buffer, if any
    pub fn byte_length(&self, wrapper: WrapperId) -> Option<Size> {
        self.table.slots.get(&wrapper).map(|slot| slot.byte_length)
    }

    /// Element kind of the attached buffer, if any
    pub fn element_kind(&self, wrapper: WrapperId) -> Option<ElementKind> {
        self.table.slots.get(&wrapper).map(|slot| slot.kind)
    }

    /// Whether the attached buffer is a non-owning alias view
    pub fn is_alias(&self, wrapper: WrapperId) -> Option<bool> {
        self.table.slots.get(&wrapper).map(|slot| slot.is_alias())
    }

    /// Number of wrappers with an attached buffer
    pub fn attached_count(&self) -> usize {
        self.table.slots.len()
    }

    /// Net native bytes currently attributed to managed wrappers
    pub fn external_bytes(&self) -> i64 {
        self.table.accountant.external_bytes()
    }

    pub fn accounting_stats(&self) -> AccountingStats {
        self.table.accountant.stats()
    }

    pub(crate) fn arm_finalizer(&self, wrapper: WrapperId) {
        let table = self.table.clone();
        self.finalizers.arm(
            wrapper,
            Box::new(move || {
                table.release(wrapper);
            }),
        );
    }
}

// Implement trait interfaces
impl BufferLifecycle for BufferManager {
    fn allocate(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
    ) -> BufferResult<Size> {
        BufferManager::allocate(self, wrapper, element_count, kind)
    }

    fn allocate_with_release(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
        release_fn: ReleaseFn,
    ) -> BufferResult<Size> {
        BufferManager::allocate_with_release(self, wrapper, element_count, kind, release_fn)
    }

    fn dispose(&self, wrapper: WrapperId) -> BufferResult<Size> {
        BufferManager::dispose(self, wrapper)
    }

    fn on_wrapper_unreachable(&self, wrapper: WrapperId) -> bool {
        BufferManager::on_wrapper_unreachable(self, wrapper)
    }

    fn has_attached_buffer(&self, wrapper: WrapperId) -> bool {
        BufferManager::has_attached_buffer(self, wrapper)
    }
}

impl BufferTransfer for BufferManager {
    fn copy_onto(
        &self,
        source: WrapperId,
        source_start: u32,
        dest: WrapperId,
        dest_start: u32,
        copy_length: u32,
    ) -> BufferResult<()> {
        BufferManager::copy_onto(self, source, source_start, dest, dest_start, copy_length)
    }

    fn slice_onto(
        &self,
        source: WrapperId,
        dest: WrapperId,
        start: u32,
        end: u32,
    ) -> BufferResult<Size> {
        BufferManager::slice_onto(self, source, dest, start, end)
    }
}

impl ExternalMemoryInfo for BufferManager {
    fn external_bytes(&self) -> i64 {
        BufferManager::external_bytes(self)
    }

    fn accounting_stats(&self) -> AccountingStats {
        BufferManager::accounting_stats(self)
    }

    fn attached_count(&self) -> usize {
        BufferManager::attached_count(self)
    }
}

impl Clone for BufferManager {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            finalizers: self.finalizers.clone(),
        }
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}
