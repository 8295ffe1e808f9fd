/*!
 * Buffer Types
 * Element catalogue and error types for external buffers
 */

use crate::core::limits::MAX_BYTE_LENGTH;
use crate::core::types::WrapperId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Buffer operation result
pub type BufferResult<T> = Result<T, BufferError>;

/// How the bytes of a buffer are presented by its managed wrapper.
///
/// Numeric tags (1..=9) follow the external-array catalogue order used by
/// JS engines, so hosts can pass the tag straight through the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    /// Clamped unsigned byte, as used for canvas pixel data
    PixelUInt8,
}

impl ElementKind {
    /// Byte width of one element; always >= 1
    pub const fn width(self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::UInt8 | ElementKind::PixelUInt8 => 1,
            ElementKind::Int16 | ElementKind::UInt16 => 2,
            ElementKind::Int32 | ElementKind::UInt32 | ElementKind::Float32 => 4,
            ElementKind::Float64 => 8,
        }
    }

    /// Numeric tag used at the host boundary
    pub const fn tag(self) -> u32 {
        match self {
            ElementKind::Int8 => 1,
            ElementKind::UInt8 => 2,
            ElementKind::Int16 => 3,
            ElementKind::UInt16 => 4,
            ElementKind::Int32 => 5,
            ElementKind::UInt32 => 6,
            ElementKind::Float32 => 7,
            ElementKind::Float64 => 8,
            ElementKind::PixelUInt8 => 9,
        }
    }

    /// Resolve a host boundary tag; unrecognized tags are recoverable
    /// type errors, reported before any allocation or accounting occurs.
    pub fn from_tag(tag: u32) -> BufferResult<Self> {
        match tag {
            1 => Ok(ElementKind::Int8),
            2 => Ok(ElementKind::UInt8),
            3 => Ok(ElementKind::Int16),
            4 => Ok(ElementKind::UInt16),
            5 => Ok(ElementKind::Int32),
            6 => Ok(ElementKind::UInt32),
            7 => Ok(ElementKind::Float32),
            8 => Ok(ElementKind::Float64),
            9 => Ok(ElementKind::PixelUInt8),
            _ => Err(BufferError::UnknownElementKind(tag)),
        }
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        ElementKind::UInt8
    }
}

/// Which side of a transfer failed a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRole {
    Source,
    Dest,
}

impl fmt::Display for TransferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferRole::Source => write!(f, "source"),
            TransferRole::Dest => write!(f, "dest"),
        }
    }
}

/// Buffer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("{wrapper} already has an attached external buffer")]
    AlreadyAttached { wrapper: WrapperId },

    #[error("{wrapper} has no attached external buffer")]
    NoBufferAttached { wrapper: WrapperId },

    #[error("{role} has no external buffer data")]
    NotABuffer { role: TransferRole },

    #[error("{wrapper} aliases a buffer that was already released")]
    AliasDangling { wrapper: WrapperId },

    #[error("unknown element kind tag: {0}")]
    UnknownElementKind(u32),

    #[error("length overflow: {count} elements x {width} bytes exceeds the {MAX_BYTE_LENGTH} byte limit")]
    LengthOverflow { count: u64, width: usize },

    #[error("range check failed: {0}")]
    Range(RangeCheck),
}

/// The specific violated inequality of a rejected transfer.
///
/// Display output spells out the failing comparison so hosts can surface
/// it verbatim as a RangeError message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    #[error("copy_length > source_length")]
    CopyLengthExceedsSource,
    #[error("copy_length > dest_length")]
    CopyLengthExceedsDest,
    #[error("source_start > source_length")]
    SourceStartOutOfBounds,
    #[error("dest_start > dest_length")]
    DestStartOutOfBounds,
    #[error("source_start + copy_length > source_length")]
    SourceRangeOutOfBounds,
    #[error("dest_start + copy_length > dest_length")]
    DestRangeOutOfBounds,
    #[error("start > end")]
    SliceStartAfterEnd,
    #[error("end > source_length")]
    SliceEndOutOfBounds,
    #[error("offset + length > byte_length")]
    AccessOutOfBounds,
}
