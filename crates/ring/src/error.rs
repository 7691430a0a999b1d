//! Error types surfaced by segment creation, attachment, and queue operations.

use std::io;
use thiserror::Error;

/// Errors from constructing or attaching to a named ring.
#[derive(Debug, Error)]
pub enum RingError {
    #[error("requested capacity {requested} exceeds maximum {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("element size {given} does not match the record size {expected}")]
    ElemSizeMismatch { given: usize, expected: usize },

    #[error("segment {name:?} already exists")]
    AlreadyExists { name: String },

    #[error("segment {name:?} not found")]
    NotFound { name: String },

    #[error("failed to create shared-memory segment {name:?}: {source}")]
    SegmentCreateFailed { name: String, source: io::Error },

    #[error("failed to open shared-memory segment {name:?}: {source}")]
    SegmentOpenFailed { name: String, source: io::Error },

    #[error("ring name {name:?} exceeds {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("segment {name:?} header is not yet initialized")]
    NotReady { name: String },
}

pub type Result<T> = std::result::Result<T, RingError>;
