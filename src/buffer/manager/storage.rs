/*!
 * Block Storage
 * Native backing blocks and the host data path through views
 */

use super::{BufferManager, BufferTable};
use crate::buffer::types::{BufferError, BufferResult, RangeCheck};
use crate::core::types::{Size, WrapperId};

/// One native backing allocation
pub(crate) struct Block {
    bytes: Box<[u8]>,
}

impl Block {
    /// Allocate a zeroed block, or `None` if the native allocation fails
    pub fn zeroed(len: Size) -> Option<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).ok()?;
        bytes.resize(len, 0u8);
        Some(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.bytes
    }
}

impl BufferTable {
    /// Resolve `wrapper` to its view's block range, bounds-checked against
    /// the slot's byte length.
    fn resolve(
        &self,
        wrapper: WrapperId,
        offset: Size,
        len: Size,
    ) -> BufferResult<Option<(super::BlockView, Size)>> {
        let slot = self
            .slots
            .get(&wrapper)
            .ok_or(BufferError::NoBufferAttached { wrapper })?;

        if offset > slot.byte_length || len > slot.byte_length - offset {
            return Err(BufferError::Range(RangeCheck::AccessOutOfBounds));
        }
        if len == 0 {
            return Ok(None);
        }

        debug_assert!(slot.view.is_some(), "non-empty slot without a view");
        match slot.view {
            Some(view) => Ok(Some((view, offset))),
            None => Err(BufferError::Range(RangeCheck::AccessOutOfBounds)),
        }
    }
}

impl BufferManager {
    /// Read `len` bytes at `offset` from the buffer attached to `wrapper`.
    ///
    /// This is the host's data path; reads through an alias view observe
    /// the owner's block directly.
    pub fn read_bytes(&self, wrapper: WrapperId, offset: Size, len: Size) -> BufferResult<Vec<u8>> {
        let Some((view, offset)) = self.table.resolve(wrapper, offset, len)? else {
            return Ok(Vec::new());
        };

        let block = self
            .table
            .storage
            .get(&view.block)
            .ok_or(BufferError::AliasDangling { wrapper })?;
        let start = view.offset + offset;
        Ok(block.as_slice()[start..start + len].to_vec())
    }

    /// Write `data` at `offset` into the buffer attached to `wrapper`.
    pub fn write_bytes(&self, wrapper: WrapperId, offset: Size, data: &[u8]) -> BufferResult<()> {
        let Some((view, offset)) = self.table.resolve(wrapper, offset, data.len())? else {
            return Ok(());
        };

        let mut block = self
            .table
            .storage
            .get_mut(&view.block)
            .ok_or(BufferError::AliasDangling { wrapper })?;
        let start = view.offset + offset;
        block.as_mut_slice()[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
