//! FIFO errors.

use thiserror::Error;

/// Every failure a FIFO operation can report.
///
/// After any error the buffer is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FifoError {
    /// Push into a full buffer, or a bulk push larger than the free space.
    #[error("FIFO overflow: not enough free slots")]
    Overflow,

    /// Pop, peek, or checksum past the buffered elements.
    #[error("FIFO underflow: not enough buffered elements")]
    Underflow,

    /// The backing store could not be reserved.
    #[error("failed to allocate {requested} bytes of FIFO storage")]
    AllocationFailure { requested: usize },

    #[error("FIFO capacity must be greater than zero")]
    ZeroCapacity,

    #[error("FIFO element size must be greater than zero")]
    ZeroElementSize,

    /// A byte slice is not a whole number of records.
    #[error("expected a multiple of {expected} bytes, got {actual}")]
    ElementSize { expected: usize, actual: usize },

    #[error("invalid FIFO configuration: {0}")]
    Config(String),
}

pub type Result<T, E = FifoError> = std::result::Result<T, E>;
