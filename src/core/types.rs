/*!
 * Core Types
 * Common types used across the buffer subsystem
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size type for byte lengths and offsets
pub type Size = usize;

/// Identity of a collector-managed wrapper object.
///
/// The host collector owns the wrapper's lifetime; this crate only keys
/// native state off its identity and observes unreachability through the
/// finalizer registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrapperId(pub u64);

impl fmt::Display for WrapperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wrapper#{}", self.0)
    }
}

impl From<u64> for WrapperId {
    fn from(raw: u64) -> Self {
        WrapperId(raw)
    }
}

/// Identity of a native backing block.
///
/// Aliased views reference the owning block by id rather than carrying an
/// adjusted raw pointer, so alias-vs-owner is a checkable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub(crate) u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}
