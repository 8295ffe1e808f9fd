/*!
 * Buffer Release
 * Exactly-once release via dispose or collector finalization
 */

use super::{BufferManager, BufferTable, Ownership};
use crate::buffer::types::{BufferError, BufferResult};
use crate::core::types::{Size, WrapperId};
use log::{info, warn};
use std::fmt;

/// Custom release callback: receives the reclaimed bytes instead of the
/// default free. Any release hint the embedder needs travels as captured
/// closure state.
pub type ReleaseFn = Box<dyn FnOnce(Box<[u8]>) + Send + Sync>;

/// What happens to an owned block when its slot is released
pub enum ReleasePolicy {
    /// Free the block
    Default,
    /// Hand the block's bytes to the embedder's callback
    Custom(ReleaseFn),
}

impl fmt::Debug for ReleasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleasePolicy::Default => write!(f, "Default"),
            ReleasePolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Bookkeeping bytes a custom-release record adds to the native footprint,
/// reserved by the accountant alongside the buffer itself.
pub const RELEASE_RECORD_OVERHEAD: usize = std::mem::size_of::<ReleasePolicy>();

impl BufferTable {
    /// Release the slot attached to `wrapper`, if it is still attached.
    ///
    /// The atomic slot removal is the single-release claim: whichever of
    /// {dispose, finalizer} removes the record runs the release policy and
    /// the matching accountant decrement; the loser sees `None`. Alias
    /// slots detach only, their block and accounting stay with the owner.
    pub(crate) fn release(&self, wrapper: WrapperId) -> Option<Size> {
        let (_, slot) = self.slots.remove(&wrapper)?;

        match slot.ownership {
            Ownership::Owned(policy) => {
                let bytes = slot
                    .view
                    .and_then(|view| self.storage.remove(&view.block))
                    .map(|(_, block)| block.into_bytes());

                match policy {
                    ReleasePolicy::Default => drop(bytes),
                    ReleasePolicy::Custom(release_fn) => {
                        release_fn(bytes.unwrap_or_default());
                    }
                }

                if slot.accounted > 0 {
                    self.accountant.adjust(-(slot.accounted as i64));
                }
                info!(
                    "Released {} byte buffer from {} ({} bytes unaccounted)",
                    slot.byte_length, wrapper, slot.accounted
                );
            }
            Ownership::Alias => {
                info!(
                    "Detached {} byte alias view from {}",
                    slot.byte_length, wrapper
                );
            }
        }

        Some(slot.byte_length)
    }
}

impl BufferManager {
    /// Explicit, caller-initiated release of the buffer attached to
    /// `wrapper`. Revokes the pending finalizer registration so the
    /// collector never attempts a second release, then runs the release
    /// policy and the accountant decrement. Returns the bytes released.
    pub fn dispose(&self, wrapper: WrapperId) -> BufferResult<Size> {
        self.finalizers().cancel(wrapper);

        match self.table.release(wrapper) {
            Some(byte_length) => Ok(byte_length),
            None => {
                warn!("Dispose of {} with no attached buffer", wrapper);
                Err(BufferError::NoBufferAttached { wrapper })
            }
        }
    }

    /// Collector entry point: `wrapper` is no longer reachable.
    ///
    /// Runs the identical release sequence through the armed finalizer.
    /// Safe in finalization context (touches only this crate's own tables)
    /// and a no-op if `dispose` already ran. Never surfaces an error; there
    /// is no caller to report one to.
    pub fn on_wrapper_unreachable(&self, wrapper: WrapperId) -> bool {
        self.finalizers().notify_unreachable(wrapper)
    }
}
