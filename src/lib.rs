/*!
 * External Memory Library
 * Lifecycle management for native buffers attached to collector-managed wrappers
 */

pub mod accounting;
pub mod buffer;
pub mod core;
pub mod gc;

// Re-exports
pub use accounting::{AccountingStats, MemoryAccountant, PressureHook};
pub use buffer::{
    BufferError, BufferLifecycle, BufferManager, BufferResult, BufferTransfer, ElementKind,
    ExternalMemoryInfo, RangeCheck, ReleaseFn, ReleasePolicy, TransferRole,
    RELEASE_RECORD_OVERHEAD,
};
pub use crate::core::limits::MAX_BYTE_LENGTH;
pub use crate::core::types::{Size, WrapperId};
pub use gc::FinalizerRegistry;
