/*!
 * Bounds-Checked Transfer
 * Overlap-safe bulk copy and non-owning sub-range slicing
 */

use super::{BlockView, BufferManager, BufferSlot, Ownership};
use crate::buffer::types::{BufferError, BufferResult, RangeCheck, TransferRole};
use crate::core::types::{Size, WrapperId};
use log::info;

/// Transfer-relevant shape of an attached buffer, copied out of the slot
/// map so no shard lock is held across the byte move.
struct TransferShape {
    view: Option<BlockView>,
    byte_length: Size,
    width: Size,
}

impl BufferManager {
    fn transfer_shape(&self, wrapper: WrapperId, role: TransferRole) -> BufferResult<TransferShape> {
        let slot = self
            .table
            .slots
            .get(&wrapper)
            .ok_or(BufferError::NotABuffer { role })?;
        Ok(TransferShape {
            view: slot.view,
            byte_length: slot.byte_length,
            width: slot.kind.width(),
        })
    }

    /// Copy `copy_length` units from `source` at `source_start` to `dest`
    /// at `dest_start`.
    ///
    /// When both element widths are 1, `copy_length` is a byte count;
    /// otherwise it is scaled by the source's element width (checked for
    /// overflow). Start offsets are byte offsets. The six bounds
    /// inequalities are validated in order, each failure naming the
    /// violated comparison, before any byte moves; overlapping same-block
    /// ranges move with memmove semantics.
    pub fn copy_onto(
        &self,
        source: WrapperId,
        source_start: u32,
        dest: WrapperId,
        dest_start: u32,
        copy_length: u32,
    ) -> BufferResult<()> {
        let src = self.transfer_shape(source, TransferRole::Source)?;
        let dst = self.transfer_shape(dest, TransferRole::Dest)?;

        let source_start = source_start as Size;
        let dest_start = dest_start as Size;
        let mut copy_length = copy_length as Size;

        // Byte-count fast path for single-byte kinds on both sides; stored
        // byte lengths are pre-scaled at allocation so only the caller's
        // copy_length needs the scale-overflow check, and it runs before
        // any offset arithmetic uses the product.
        if src.width != 1 || dst.width != 1 {
            copy_length = copy_length.checked_mul(src.width).ok_or(
                BufferError::LengthOverflow {
                    count: copy_length as u64,
                    width: src.width,
                },
            )?;
        }

        if copy_length > src.byte_length {
            return Err(BufferError::Range(RangeCheck::CopyLengthExceedsSource));
        }
        if copy_length > dst.byte_length {
            return Err(BufferError::Range(RangeCheck::CopyLengthExceedsDest));
        }
        if source_start > src.byte_length {
            return Err(BufferError::Range(RangeCheck::SourceStartOutOfBounds));
        }
        if dest_start > dst.byte_length {
            return Err(BufferError::Range(RangeCheck::DestStartOutOfBounds));
        }
        if source_start + copy_length > src.byte_length {
            return Err(BufferError::Range(RangeCheck::SourceRangeOutOfBounds));
        }
        if dest_start + copy_length > dst.byte_length {
            return Err(BufferError::Range(RangeCheck::DestRangeOutOfBounds));
        }

        if copy_length == 0 {
            return Ok(());
        }

        // byte_length > 0 guarantees the views exist
        let (Some(src_view), Some(dst_view)) = (src.view, dst.view) else {
            debug_assert!(false, "non-empty transfer shape without a view");
            return Err(BufferError::Range(RangeCheck::AccessOutOfBounds));
        };

        let src_at = src_view.offset + source_start;
        let dst_at = dst_view.offset + dest_start;

        if src_view.block == dst_view.block {
            let mut block = self
                .table
                .storage
                .get_mut(&src_view.block)
                .ok_or(BufferError::AliasDangling { wrapper: source })?;
            block
                .as_mut_slice()
                .copy_within(src_at..src_at + copy_length, dst_at);
        } else {
            let scratch = {
                let block = self
                    .table
                    .storage
                    .get(&src_view.block)
                    .ok_or(BufferError::AliasDangling { wrapper: source })?;
                block.as_slice()[src_at..src_at + copy_length].to_vec()
            };
            let mut block = self
                .table
                .storage
                .get_mut(&dst_view.block)
                .ok_or(BufferError::AliasDangling { wrapper: dest })?;
            block.as_mut_slice()[dst_at..dst_at + copy_length].copy_from_slice(&scratch);
        }

        Ok(())
    }

    /// Attach a non-owning alias of `source[start..end]` (element offsets)
    /// to the fresh wrapper `dest`.
    ///
    /// The alias shares the source's backing block and element kind; it is
    /// never accounted and its release never frees. Block ownership and
    /// release responsibility stay with the original allocation. Returns
    /// the alias's byte length.
    pub fn slice_onto(
        &self,
        source: WrapperId,
        dest: WrapperId,
        start: u32,
        end: u32,
    ) -> BufferResult<Size> {
        // shape copied out before touching the dest key
        let (src_view, src_byte_length, kind) = {
            let slot = self
                .table
                .slots
                .get(&source)
                .ok_or(BufferError::NotABuffer {
                    role: TransferRole::Source,
                })?;
            (slot.view, slot.byte_length, slot.kind)
        };
        if self.table.slots.contains_key(&dest) {
            return Err(BufferError::AlreadyAttached { wrapper: dest });
        }

        let width = kind.width();
        let (start, end) = (start as Size, end as Size);
        if start > end {
            return Err(BufferError::Range(RangeCheck::SliceStartAfterEnd));
        }
        let start_bytes = start
            .checked_mul(width)
            .ok_or(BufferError::LengthOverflow {
                count: start as u64,
                width,
            })?;
        let end_bytes = end.checked_mul(width).ok_or(BufferError::LengthOverflow {
            count: end as u64,
            width,
        })?;
        if end_bytes > src_byte_length {
            return Err(BufferError::Range(RangeCheck::SliceEndOutOfBounds));
        }

        let byte_length = end_bytes - start_bytes;
        let view = match src_view {
            Some(v) if byte_length > 0 => {
                // refuse to mint a view onto an already-released block
                if !self.table.storage.contains_key(&v.block) {
                    return Err(BufferError::AliasDangling { wrapper: source });
                }
                Some(BlockView {
                    block: v.block,
                    offset: v.offset + start_bytes,
                })
            }
            _ => None,
        };

        self.table.slots.insert(
            dest,
            BufferSlot {
                view,
                byte_length,
                kind,
                ownership: Ownership::Alias,
                accounted: 0,
            },
        );
        self.arm_finalizer(dest);

        info!(
            "Attached {} byte alias of {} to {} (elements {}..{})",
            byte_length, source, dest, start, end
        );
        Ok(byte_length)
    }
}
