/*!
 * Buffer Module
 * External buffer lifecycle, accounting, and bounds-checked transfer
 */

pub mod manager;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use manager::{BufferManager, ReleaseFn, ReleasePolicy, RELEASE_RECORD_OVERHEAD};
pub use traits::{BufferLifecycle, BufferTransfer, ExternalBufferManager, ExternalMemoryInfo};
pub use types::{BufferError, BufferResult, ElementKind, RangeCheck, TransferRole};
