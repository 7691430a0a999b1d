//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// INV-RING-01: Nonzero Capacity
// =============================================================================

/// Assert that a queue was constructed with a nonzero capacity.
///
/// Used in: `MpmcQueue::init`
macro_rules! debug_assert_nonzero_capacity {
    ($capacity:expr) => {
        debug_assert!($capacity > 0, "INV-RING-01 violated: zero-capacity queue")
    };
}

// =============================================================================
// INV-RING-02: Monotonic Cursor
// =============================================================================

/// Assert that the enqueue/dequeue cursor only advances.
///
/// Used in: `MpmcQueue::try_push` and `MpmcQueue::try_pop` after a
/// successful claim of the cursor.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-RING-02 violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-RING-03: Segment Header Sanity
// =============================================================================

/// Assert that an attached segment's header reports a capacity and element
/// size consistent with what the caller requested.
///
/// Used in: `Ring::attach`
macro_rules! debug_assert_header_sane {
    ($capacity:expr, $elem_size:expr) => {
        debug_assert!(
            $capacity > 0 && $elem_size > 0,
            "INV-RING-03 violated: degenerate header (capacity={}, elem_size={})",
            $capacity,
            $elem_size
        )
    };
}

// =============================================================================
// INV-RING-04: No Torn Records
// =============================================================================

/// Assert that a dequeued record's length matches the fixed element size
/// for this ring; a mismatch would mean the copy was torn or the header
/// was corrupted.
///
/// Used in: `Ring::dequeue`
macro_rules! debug_assert_record_size {
    ($actual:expr, $expected:expr) => {
        debug_assert_eq!(
            $actual, $expected,
            "INV-RING-04 violated: record size {} does not match element size {}",
            $actual, $expected
        )
    };
}

pub(crate) use debug_assert_header_sane;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_nonzero_capacity;
pub(crate) use debug_assert_record_size;
