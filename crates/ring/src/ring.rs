//! Named, shared-memory-backed MPMC ring: the glue between
//! [`crate::shm::SharedSegment`] and [`crate::mpmc::MpmcQueue`] that gives
//! callers the `ring_init` / `ring_lookup` / `ring_enqueue` / `ring_dequeue`
//! / `ring_free` operations.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, RingError};
use crate::invariants::{debug_assert_header_sane, debug_assert_record_size};
use crate::mpmc::MpmcQueue;
use crate::record::{Record, RECORD_SIZE};
use crate::shm::SharedSegment;

/// Largest number of effective slots a ring may be created with.
pub const MAX_CAPACITY: usize = 8192;

const ONE_MIB: usize = 1024 * 1024;

/// Bounded number of spin-backoff rounds to wait for a concurrently
/// in-progress `ring_init` to finish publishing its header before giving
/// up with [`RingError::NotReady`]. Not specified by the data model; chosen
/// generously since segment construction only involves a handful of
/// `ftruncate`/`mmap` syscalls and placement-writes.
const READY_WAIT_ROUNDS: usize = 10_000;

/// Header placed at the very start of the segment, ahead of the
/// [`MpmcQueue`]. Lets an attach-only caller (`ring_lookup`) discover the
/// capacity and element size the creator chose without being told in
/// advance, and lets it tell a segment that's mid-construction from one
/// that's ready to use.
///
/// `align(128)` forces `size_of::<SegmentHeader>()` up to 128 bytes (Rust
/// always pads a type's size to a multiple of its alignment), which puts
/// the `MpmcQueue` that follows it on a 128-byte boundary — the alignment
/// `MpmcQueue`'s `CacheAligned<AtomicU64>` fields require. Without this,
/// the placement-new at offset 24 would violate `MpmcQueue`'s alignment.
#[repr(C, align(128))]
struct SegmentHeader {
    ready: AtomicU64,
    capacity: u64,
    elem_size: u64,
}

impl SegmentHeader {
    fn size_for(capacity: usize) -> usize {
        std::mem::size_of::<Self>() + MpmcQueue::<Record>::size_for_capacity(capacity)
    }
}

/// A handle to one process's attachment of a named ring.
///
/// Dropping a `Ring` detaches this process's mapping only (`munmap`); it
/// never removes the segment for other attachments. Call [`Ring::destroy`]
/// to remove the segment from the system explicitly.
#[derive(Debug)]
pub struct Ring {
    name: String,
    segment: SharedSegment,
}

// SAFETY: all shared state lives behind the header's `ready` atomic and the
// queue's own atomics; `Ring` itself holds no non-atomic mutable state.
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

impl Ring {
    /// `ring_init`: creates segment `SEG4xRING_<name>` sized for `capacity`
    /// records of `elem_size` bytes and place-constructs an MPMC queue
    /// inside it. If a segment by this name already exists, attaches to it
    /// instead (find-or-construct semantics, matching the guarantee that
    /// at most one segment per name is ever live and every attacher by
    /// that name sees the same queue instance).
    pub fn create(name: &str, capacity: usize, elem_size: usize) -> Result<Self> {
        if capacity > MAX_CAPACITY {
            return Err(RingError::CapacityExceeded {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }
        if elem_size != RECORD_SIZE {
            return Err(RingError::ElemSizeMismatch {
                given: elem_size,
                expected: RECORD_SIZE,
            });
        }

        let segment_size = capacity * elem_size * 8 + ONE_MIB;
        debug_assert!(segment_size >= SegmentHeader::size_for(capacity));

        match SharedSegment::create(name, segment_size) {
            Ok(segment) => {
                unsafe {
                    let header_ptr = segment.as_ptr().cast::<SegmentHeader>();
                    header_ptr.write(SegmentHeader {
                        ready: AtomicU64::new(0),
                        capacity: capacity as u64,
                        elem_size: elem_size as u64,
                    });
                    let queue_ptr = segment.as_ptr().add(std::mem::size_of::<SegmentHeader>());
                    MpmcQueue::<Record>::init(queue_ptr, capacity);
                    (*header_ptr).ready.store(1, Ordering::Release);
                }
                tracing::debug!(name, capacity, segment_size, "created ring segment");
                Ok(Self {
                    name: name.to_string(),
                    segment,
                })
            }
            Err(RingError::AlreadyExists { .. }) => {
                tracing::debug!(name, "segment already exists, attaching instead");
                Self::attach(name)
            }
            Err(other) => Err(other),
        }
    }

    /// `ring_lookup`: open-only attach to an existing segment. Fails with
    /// [`RingError::NotFound`] if no segment by this name exists.
    pub fn attach(name: &str) -> Result<Self> {
        let segment = SharedSegment::open(name)?;
        wait_until_ready(&segment, name)?;

        let (capacity, elem_size) = unsafe {
            let header = &*segment.as_ptr().cast::<SegmentHeader>();
            (header.capacity as usize, header.elem_size as usize)
        };
        debug_assert_header_sane!(capacity, elem_size);
        debug_assert_record_size!(elem_size, RECORD_SIZE);

        Ok(Self {
            name: name.to_string(),
            segment,
        })
    }

    fn queue(&self) -> &MpmcQueue<Record> {
        unsafe {
            let ptr = self
                .segment
                .as_ptr()
                .add(std::mem::size_of::<SegmentHeader>());
            &*ptr.cast::<MpmcQueue<Record>>()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.queue().capacity()
    }

    /// Approximate number of records currently queued.
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `ring_enqueue`: non-blocking; returns `false` if the ring is full.
    pub fn enqueue(&self, record: &Record) -> bool {
        self.queue().try_push(*record)
    }

    /// `ring_dequeue`: non-blocking; returns `None` if the ring is empty.
    pub fn dequeue(&self) -> Option<Record> {
        self.queue().try_pop()
    }

    /// Removes the segment from the system. Other attachments already
    /// mapped remain valid until they drop; no further `attach`/`create`
    /// by this name will succeed until something re-creates it.
    pub fn destroy(self) -> Result<()> {
        tracing::debug!(name = self.name, "destroying ring segment");
        self.segment.destroy()
    }
}

fn wait_until_ready(segment: &SharedSegment, name: &str) -> Result<()> {
    let header = unsafe { &*segment.as_ptr().cast::<SegmentHeader>() };
    let mut backoff = crate::backoff::Backoff::new();
    for _ in 0..READY_WAIT_ROUNDS {
        if header.ready.load(Ordering::Acquire) == 1 {
            return Ok(());
        }
        backoff.snooze();
    }
    Err(RingError::NotReady {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("ring-test-{tag}-{}-{}", std::process::id(), line!())
    }

    #[test]
    fn create_push_pop_matches_scenario_one() {
        let name = unique_name("create-push-pop");
        let ring = Ring::create(&name, 50, RECORD_SIZE).unwrap();
        let e1 = Record::new(1234, b"hello");
        assert!(ring.enqueue(&e1));
        let e2 = ring.dequeue().unwrap();
        assert_eq!(e2.id, 1234);
        assert_eq!(e2.payload(), b"hello");
        assert!(ring.dequeue().is_none());
        ring.destroy().unwrap();
    }

    #[test]
    fn create_rejects_oversize_capacity() {
        let name = unique_name("too-large");
        let err = Ring::create(&name, MAX_CAPACITY + 1, RECORD_SIZE).unwrap_err();
        assert!(matches!(err, RingError::CapacityExceeded { .. }));
    }

    #[test]
    fn fills_exactly_to_capacity() {
        let name = unique_name("to-capacity");
        let ring = Ring::create(&name, MAX_CAPACITY, RECORD_SIZE).unwrap();
        for i in 0..MAX_CAPACITY as u64 {
            assert!(ring.enqueue(&Record::new(i, &[])));
        }
        assert!(!ring.enqueue(&Record::new(999, &[])));
        for i in 0..MAX_CAPACITY as u64 {
            assert_eq!(ring.dequeue().unwrap().id, i);
        }
        ring.destroy().unwrap();
    }

    #[test]
    fn second_process_attaches_by_name_and_sees_same_queue() {
        let name = unique_name("two-attach");
        let producer = Ring::create(&name, 50, RECORD_SIZE).unwrap();
        assert!(producer.enqueue(&Record::new(42, b"")));

        let consumer = Ring::attach(&name).unwrap();
        let record = consumer.dequeue().unwrap();
        assert_eq!(record.id, 42);

        producer.destroy().unwrap();
    }

    #[test]
    fn attach_to_missing_ring_fails() {
        let name = unique_name("missing");
        let err = Ring::attach(&name).unwrap_err();
        assert!(matches!(err, RingError::NotFound { .. }));
    }

    #[test]
    fn dequeue_after_empty_returns_none() {
        let name = unique_name("dequeue-empty");
        let ring = Ring::create(&name, 100, RECORD_SIZE).unwrap();
        assert!(ring.dequeue().is_none());
        ring.destroy().unwrap();
    }

    #[test]
    fn create_twice_with_same_name_attaches_to_existing_queue() {
        let name = unique_name("create-twice");
        let first = Ring::create(&name, 50, RECORD_SIZE).unwrap();
        assert!(first.enqueue(&Record::new(7, b"x")));

        let second = Ring::create(&name, 50, RECORD_SIZE).unwrap();
        assert_eq!(second.dequeue().unwrap().id, 7);

        first.destroy().unwrap();
    }
}
