/*!
 * Buffer Traits
 * Seam abstractions over the buffer lifecycle manager
 */

use super::manager::ReleaseFn;
use super::types::{BufferResult, ElementKind};
use crate::accounting::AccountingStats;
use crate::core::types::{Size, WrapperId};

/// Allocation and disposal of wrapper-attached external buffers
pub trait BufferLifecycle: Send + Sync {
    /// Allocate a native block of `element_count` elements of `kind` and
    /// attach it to `wrapper`. Returns the byte length attached.
    fn allocate(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
    ) -> BufferResult<Size>;

    /// Same contract as `allocate`, but release hands the reclaimed bytes
    /// to `release_fn` instead of freeing them. Trusted callers only.
    fn allocate_with_release(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
        release_fn: ReleaseFn,
    ) -> BufferResult<Size>;

    /// Explicit, caller-initiated release. Returns the bytes released.
    fn dispose(&self, wrapper: WrapperId) -> BufferResult<Size>;

    /// Collector entry point for an unreachable wrapper; never errors.
    /// Returns whether a release actually ran.
    fn on_wrapper_unreachable(&self, wrapper: WrapperId) -> bool;

    /// Pure query: does `wrapper` currently have an attached buffer?
    fn has_attached_buffer(&self, wrapper: WrapperId) -> bool;
}

/// Bounds-checked bulk transfer between attached buffers
pub trait BufferTransfer: Send + Sync {
    /// Overlap-safe copy of `copy_length` (element-scaled) bytes from
    /// `source` at `source_start` to `dest` at `dest_start`.
    fn copy_onto(
        &self,
        source: WrapperId,
        source_start: u32,
        dest: WrapperId,
        dest_start: u32,
        copy_length: u32,
    ) -> BufferResult<()>;

    /// Attach a non-owning alias of `source[start..end]` (element offsets)
    /// to the fresh wrapper `dest`.
    fn slice_onto(
        &self,
        source: WrapperId,
        dest: WrapperId,
        start: u32,
        end: u32,
    ) -> BufferResult<Size>;
}

/// External memory statistics provider
pub trait ExternalMemoryInfo: Send + Sync {
    /// Net native bytes currently attributed to managed wrappers
    fn external_bytes(&self) -> i64;

    /// Accounting snapshot
    fn accounting_stats(&self) -> AccountingStats;

    /// Number of wrappers with an attached buffer
    fn attached_count(&self) -> usize;
}

/// Full external buffer manager interface
pub trait ExternalBufferManager:
    BufferLifecycle + BufferTransfer + ExternalMemoryInfo + Clone + Send + Sync
{
}

/// Implement ExternalBufferManager for types that implement all required traits
impl<T> ExternalBufferManager for T where
    T: BufferLifecycle + BufferTransfer + ExternalMemoryInfo + Clone + Send + Sync
{
}
