/*!
 * Buffer Allocation
 * Validate-then-mutate allocation and attachment
 */

use super::release::{ReleaseFn, ReleasePolicy, RELEASE_RECORD_OVERHEAD};
use super::storage::Block;
use super::{BlockView, BufferManager, BufferSlot, Ownership};
use crate::buffer::types::{BufferError, BufferResult, ElementKind};
use crate::core::limits::{DEFAULT_ELEMENT_TAG, MAX_BYTE_LENGTH};
use crate::core::types::{BlockId, Size, WrapperId};
use log::{error, info};
use std::sync::atomic::Ordering;

impl BufferManager {
    /// Allocate a zeroed native block of `element_count` elements of `kind`,
    /// attach it to `wrapper`, and arm a finalizer so the collector releases
    /// it if the wrapper becomes unreachable before explicit disposal.
    ///
    /// Returns the attached byte length. All validation happens before any
    /// mutation; a rejected call leaves buffers and accounting untouched.
    /// Native allocation failure aborts the process: no caller checks for a
    /// null payload afterward.
    pub fn allocate(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
    ) -> BufferResult<Size> {
        self.attach(wrapper, element_count, kind, ReleasePolicy::Default)
    }

    /// Host-boundary allocation: resolves a numeric element tag before
    /// touching any state, defaulting to the single-byte kind when the host
    /// passes no tag. An unrecognized tag is a recoverable type error.
    pub fn allocate_tagged(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        tag: Option<u32>,
    ) -> BufferResult<Size> {
        let kind = ElementKind::from_tag(tag.unwrap_or(DEFAULT_ELEMENT_TAG))?;
        self.allocate(wrapper, element_count, kind)
    }

    /// Same contract as [`allocate`](Self::allocate), but release hands the
    /// reclaimed bytes to `release_fn` instead of freeing them.
    ///
    /// For embedder-owned memory that needs managed-lifetime cleanup; the
    /// release hint is whatever the closure captured. Accounting reserves
    /// [`RELEASE_RECORD_OVERHEAD`] on top of the byte length so the true
    /// native footprint, side record included, reaches the collector.
    /// Trusted callers only: not for exposure to untrusted host code.
    pub fn allocate_with_release(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
        release_fn: ReleaseFn,
    ) -> BufferResult<Size> {
        self.attach(wrapper, element_count, kind, ReleasePolicy::Custom(release_fn))
    }

    fn attach(
        &self,
        wrapper: WrapperId,
        element_count: u32,
        kind: ElementKind,
        policy: ReleasePolicy,
    ) -> BufferResult<Size> {
        if self.table.slots.contains_key(&wrapper) {
            return Err(BufferError::AlreadyAttached { wrapper });
        }

        let width = kind.width();
        let byte_length = (element_count as u64)
            .checked_mul(width as u64)
            .filter(|&len| len <= MAX_BYTE_LENGTH as u64)
            .ok_or(BufferError::LengthOverflow {
                count: element_count as u64,
                width,
            })? as Size;

        let overhead = match policy {
            ReleasePolicy::Default => 0,
            ReleasePolicy::Custom(_) => RELEASE_RECORD_OVERHEAD,
        };
        let accounted = byte_length + overhead;

        let view = if byte_length == 0 {
            None
        } else {
            let block = Block::zeroed(byte_length).unwrap_or_else(|| {
                error!(
                    "BufferManager::allocate: out of memory allocating {} bytes for {}",
                    byte_length, wrapper
                );
                std::process::abort();
            });
            let id = BlockId(self.table.next_block.fetch_add(1, Ordering::SeqCst));
            self.table.storage.insert(id, block);
            Some(BlockView {
                block: id,
                offset: 0,
            })
        };

        if accounted > 0 {
            self.table.accountant.adjust(accounted as i64);
        }

        self.table.slots.insert(
            wrapper,
            BufferSlot {
                view,
                byte_length,
                kind,
                ownership: Ownership::Owned(policy),
                accounted,
            },
        );
        self.arm_finalizer(wrapper);

        info!(
            "Attached {} byte {:?} buffer to {} ({} bytes accounted)",
            byte_length, kind, wrapper, accounted
        );
        Ok(byte_length)
    }
}
