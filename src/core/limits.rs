/*!
 * Limits and Constants
 *
 * Centralized location for buffer subsystem limits and thresholds.
 */

/// Maximum byte length of a single external buffer (1GB - 1).
/// Keeps element_count * element_width arithmetic well inside usize range
/// and matches the largest length the u32 host boundary can address once
/// scaled by the widest (8-byte) element kind.
pub const MAX_BYTE_LENGTH: usize = 0x3fff_ffff;

/// Default element kind tag at the host boundary (unsigned byte).
pub const DEFAULT_ELEMENT_TAG: u32 = 2;
