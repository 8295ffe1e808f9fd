/*!
 * Transfer Tests
 * Bounds-checked copy and non-owning slice views
 */

use extmem::{
    BufferError, BufferManager, ElementKind, RangeCheck, TransferRole, WrapperId,
};
use pretty_assertions::assert_eq;

const SRC: WrapperId = WrapperId(1);
const DST: WrapperId = WrapperId(2);
const VIEW: WrapperId = WrapperId(3);

fn manager_with_pattern(len: u32) -> BufferManager {
    let mgr = BufferManager::new();
    mgr.allocate(SRC, len, ElementKind::UInt8).unwrap();
    let pattern: Vec<u8> = (0..len).map(|i| i as u8).collect();
    mgr.write_bytes(SRC, 0, &pattern).unwrap();
    mgr
}

#[test]
fn test_copy_moves_exactly_the_requested_range() {
    crate::init_logs();
    let mgr = manager_with_pattern(256);
    mgr.allocate(DST, 256, ElementKind::UInt8).unwrap();

    mgr.copy_onto(SRC, 10, DST, 5, 20).unwrap();

    let src = mgr.read_bytes(SRC, 0, 256).unwrap();
    let dst = mgr.read_bytes(DST, 0, 256).unwrap();
    assert_eq!(&dst[5..25], &src[10..30]);
    assert_eq!(&dst[0..5], &[0u8; 5]);
    assert!(dst[25..].iter().all(|&b| b == 0));
}

#[test]
fn test_copy_of_zero_bytes_is_a_noop() {
    let mgr = manager_with_pattern(16);
    mgr.allocate(DST, 16, ElementKind::UInt8).unwrap();

    mgr.copy_onto(SRC, 16, DST, 16, 0).unwrap();
    assert_eq!(mgr.read_bytes(DST, 0, 16).unwrap(), vec![0u8; 16]);
}

#[test]
fn test_copy_requires_attached_buffers() {
    let mgr = BufferManager::new();
    mgr.allocate(DST, 8, ElementKind::UInt8).unwrap();

    assert_eq!(
        mgr.copy_onto(SRC, 0, DST, 0, 1),
        Err(BufferError::NotABuffer {
            role: TransferRole::Source
        })
    );

    let mgr = manager_with_pattern(8);
    assert_eq!(
        mgr.copy_onto(SRC, 0, DST, 0, 1),
        Err(BufferError::NotABuffer {
            role: TransferRole::Dest
        })
    );
}

#[test]
fn test_copy_bounds_violations_name_the_inequality() {
    let mgr = manager_with_pattern(16);
    mgr.allocate(DST, 8, ElementKind::UInt8).unwrap();

    let cases = [
        // (source_start, dest_start, copy_length, violated inequality)
        (0, 0, 20, RangeCheck::CopyLengthExceedsSource),
        (0, 0, 10, RangeCheck::CopyLengthExceedsDest),
        (17, 0, 0, RangeCheck::SourceStartOutOfBounds),
        (0, 9, 0, RangeCheck::DestStartOutOfBounds),
        (10, 0, 8, RangeCheck::SourceRangeOutOfBounds),
        (0, 4, 8, RangeCheck::DestRangeOutOfBounds),
    ];

    for (source_start, dest_start, copy_length, check) in cases {
        assert_eq!(
            mgr.copy_onto(SRC, source_start, DST, dest_start, copy_length),
            Err(BufferError::Range(check)),
            "case ({source_start}, {dest_start}, {copy_length})"
        );
    }

    // every rejected call left the destination untouched
    assert_eq!(mgr.read_bytes(DST, 0, 8).unwrap(), vec![0u8; 8]);
}

#[test]
fn test_copy_length_is_scaled_by_element_width() {
    let mgr = BufferManager::new();
    mgr.allocate(SRC, 10, ElementKind::Int32).unwrap(); // 40 bytes
    mgr.allocate(DST, 5, ElementKind::Int32).unwrap(); // 20 bytes

    // 5 elements = 20 bytes: exactly fills the destination
    mgr.copy_onto(SRC, 0, DST, 0, 5).unwrap();

    // 6 elements = 24 bytes: checked against 20 bytes, not 6
    assert_eq!(
        mgr.copy_onto(SRC, 0, DST, 0, 6),
        Err(BufferError::Range(RangeCheck::CopyLengthExceedsDest))
    );
}

#[test]
fn test_copy_scales_by_source_width_across_kinds() {
    let mgr = BufferManager::new();
    mgr.allocate(SRC, 4, ElementKind::Float64).unwrap(); // 32 bytes
    mgr.allocate(DST, 64, ElementKind::UInt8).unwrap();

    // mixed widths still scale: 3 source elements = 24 bytes
    mgr.copy_onto(SRC, 0, DST, 0, 3).unwrap();
    assert_eq!(
        mgr.copy_onto(SRC, 0, DST, 0, 5),
        Err(BufferError::Range(RangeCheck::CopyLengthExceedsSource))
    );
}

#[test]
fn test_overlapping_copy_within_one_block_is_move_safe() {
    let mgr = manager_with_pattern(10);
    mgr.slice_onto(SRC, VIEW, 0, 10).unwrap();

    // shift source bytes 0..8 onto the same block at offset 2
    mgr.copy_onto(SRC, 0, VIEW, 2, 8).unwrap();

    let expected: Vec<u8> = vec![0, 1, 0, 1, 2, 3, 4, 5, 6, 7];
    assert_eq!(mgr.read_bytes(SRC, 0, 10).unwrap(), expected);
}

#[test]
fn test_slice_produces_an_aliasing_view() {
    let mgr = manager_with_pattern(16);

    let len = mgr.slice_onto(SRC, VIEW, 4, 12).unwrap();
    assert_eq!(len, 8);
    assert_eq!(mgr.byte_length(VIEW), Some(8));
    assert_eq!(mgr.element_kind(VIEW), Some(ElementKind::UInt8));
    assert_eq!(mgr.is_alias(VIEW), Some(true));

    let src = mgr.read_bytes(SRC, 0, 16).unwrap();
    assert_eq!(mgr.read_bytes(VIEW, 0, 8).unwrap(), src[4..12].to_vec());

    // mutation through the source is observable through the view
    mgr.write_bytes(SRC, 5, &[0xAA]).unwrap();
    assert_eq!(mgr.read_bytes(VIEW, 1, 1).unwrap(), vec![0xAA]);

    // and mutation through the view is observable through the source
    mgr.write_bytes(VIEW, 0, &[0xBB]).unwrap();
    assert_eq!(mgr.read_bytes(SRC, 4, 1).unwrap(), vec![0xBB]);
}

#[test]
fn test_slice_offsets_are_element_scaled() {
    let mgr = BufferManager::new();
    mgr.allocate(SRC, 10, ElementKind::Int32).unwrap();
    let pattern: Vec<u8> = (0u8..40).collect();
    mgr.write_bytes(SRC, 0, &pattern).unwrap();

    let len = mgr.slice_onto(SRC, VIEW, 1, 3).unwrap();
    assert_eq!(len, 8);
    assert_eq!(mgr.read_bytes(VIEW, 0, 8).unwrap(), pattern[4..12].to_vec());
}

#[test]
fn test_slice_preconditions() {
    let mgr = manager_with_pattern(16);

    assert_eq!(
        mgr.slice_onto(DST, VIEW, 0, 4),
        Err(BufferError::NotABuffer {
            role: TransferRole::Source
        })
    );
    assert_eq!(
        mgr.slice_onto(SRC, SRC, 0, 4),
        Err(BufferError::AlreadyAttached { wrapper: SRC })
    );
    assert_eq!(
        mgr.slice_onto(SRC, VIEW, 8, 4),
        Err(BufferError::Range(RangeCheck::SliceStartAfterEnd))
    );
    assert_eq!(
        mgr.slice_onto(SRC, VIEW, 0, 17),
        Err(BufferError::Range(RangeCheck::SliceEndOutOfBounds))
    );

    // no alias was attached by the rejected calls
    assert!(!mgr.has_attached_buffer(VIEW));
}

#[test]
fn test_zero_length_slice() {
    let mgr = manager_with_pattern(16);

    assert_eq!(mgr.slice_onto(SRC, VIEW, 7, 7).unwrap(), 0);
    assert!(mgr.has_attached_buffer(VIEW));
    assert_eq!(mgr.read_bytes(VIEW, 0, 0).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_alias_release_leaves_owner_and_accounting_alone() {
    let mgr = manager_with_pattern(16);
    assert_eq!(mgr.external_bytes(), 16);

    mgr.slice_onto(SRC, VIEW, 0, 8).unwrap();
    assert_eq!(mgr.external_bytes(), 16); // aliases are never accounted

    assert_eq!(mgr.dispose(VIEW).unwrap(), 8);
    assert_eq!(mgr.external_bytes(), 16);
    assert_eq!(mgr.read_bytes(SRC, 0, 4).unwrap(), vec![0, 1, 2, 3]);

    mgr.dispose(SRC).unwrap();
    assert_eq!(mgr.external_bytes(), 0);
}

#[test]
fn test_collected_alias_wrapper_detaches_cleanly() {
    let mgr = manager_with_pattern(16);
    mgr.slice_onto(SRC, VIEW, 0, 8).unwrap();

    assert!(mgr.on_wrapper_unreachable(VIEW));
    assert!(!mgr.has_attached_buffer(VIEW));
    assert_eq!(mgr.external_bytes(), 16);
    assert_eq!(mgr.read_bytes(SRC, 0, 1).unwrap(), vec![0]);
}

#[test]
fn test_dangling_alias_is_detected_not_dereferenced() {
    let mgr = manager_with_pattern(16);
    mgr.slice_onto(SRC, VIEW, 0, 8).unwrap();

    // release the owner out from under the view
    mgr.dispose(SRC).unwrap();

    assert_eq!(
        mgr.read_bytes(VIEW, 0, 8),
        Err(BufferError::AliasDangling { wrapper: VIEW })
    );
    assert_eq!(
        mgr.write_bytes(VIEW, 0, &[1]),
        Err(BufferError::AliasDangling { wrapper: VIEW })
    );
    assert_eq!(
        mgr.slice_onto(VIEW, DST, 0, 4),
        Err(BufferError::AliasDangling { wrapper: VIEW })
    );

    // the view still detaches normally
    assert_eq!(mgr.dispose(VIEW).unwrap(), 8);
    assert_eq!(mgr.external_bytes(), 0);
}

#[test]
fn test_slice_of_slice_shares_the_root_block() {
    let mgr = manager_with_pattern(16);
    mgr.slice_onto(SRC, VIEW, 4, 12).unwrap();

    let nested = WrapperId(4);
    assert_eq!(mgr.slice_onto(VIEW, nested, 2, 6).unwrap(), 4);
    assert_eq!(
        mgr.read_bytes(nested, 0, 4).unwrap(),
        mgr.read_bytes(SRC, 6, 4).unwrap()
    );

    mgr.write_bytes(nested, 0, &[0xCC]).unwrap();
    assert_eq!(mgr.read_bytes(SRC, 6, 1).unwrap(), vec![0xCC]);
}
