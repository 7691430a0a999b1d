//! msgbus-ring: a named, shared-memory-backed MPMC ring buffer of
//! fixed-size records.
//!
//! Producers and consumers in unrelated processes attach to the same named
//! segment and exchange 136-byte records through a lock-free bounded queue.
//! There is no broker in the data path: once a ring is attached, enqueue
//! and dequeue touch only atomics living in the shared segment.
//!
//! # Example
//!
//! ```no_run
//! use msgbus_ring::{Record, Ring, RECORD_SIZE};
//!
//! let ring = Ring::create("demo_channel", 128, RECORD_SIZE).unwrap();
//! ring.enqueue(&Record::new(1, b"hello"));
//!
//! let attached = Ring::attach("demo_channel").unwrap();
//! let record = attached.dequeue().unwrap();
//! assert_eq!(record.payload(), b"hello");
//! ```

mod backoff;
mod error;
mod invariants;
mod mpmc;
mod record;
mod ring;
mod shm;

pub use backoff::Backoff;
pub use error::{Result, RingError};
pub use record::{Record, DATA_SIZE, RECORD_SIZE};
pub use ring::{Ring, MAX_CAPACITY};
