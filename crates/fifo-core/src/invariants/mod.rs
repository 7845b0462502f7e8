//! Invariant traits for the verified FIFO.
//!
//! - `ring_buffer`: NoLostMessages, FIFO_Order, BoundedCapacity, IndexConsistency

pub mod ring_buffer;

pub use ring_buffer::{RingBufferProperties, RingBufferPropertyChecker, RingIndices};
