//! # fifo
//!
//! Fixed-capacity circular buffers for embedded and resource-constrained
//! code: storage is reserved once at construction and never grows.
//!
//! - [`RingBuffer<T, L>`]: typed FIFO with single and bulk push/pop,
//!   relative-index peek, and a 16-bit additive checksum for `u8` buffers
//! - [`RawFifo<L>`]: the same over fixed-width byte records
//! - [`RawLock`]: the exclusion primitive, chosen per deployment
//!   ([`ParkingLock`], [`SpinLock`], [`LocalLock`])
//! - [`TrackedRing`]: a `u64` buffer that logs its history for the
//!   `fifo-core` invariant checker
//!
//! Full and empty never block. They come back as
//! [`FifoError::Overflow`] and [`FifoError::Underflow`], and a failed call
//! leaves the buffer untouched. Bulk operations are all-or-nothing;
//! `push_partial`/`pop_partial` give the best-effort variant.
//!
//! # Verification
//!
//! - Unit tests and integration tests (`tests/`)
//! - proptest properties over random operation sequences
//! - DST against a `VecDeque` model via `fifo-dst`
//! - loom tests: `RUSTFLAGS="--cfg loom" cargo test -p fifo --release`
//! - Kani proofs: `cargo kani -p fifo`

pub mod config;
pub mod cursor;
pub mod error;
pub mod kani_proofs;
pub mod lock;
pub mod raw;
pub mod ring;
pub mod tracked;

pub use config::FifoConfig;
pub use cursor::Cursor;
pub use error::{FifoError, Result};
pub use lock::{LocalLock, ParkingLock, RawLock, SpinLock};
pub use raw::RawFifo;
pub use ring::RingBuffer;
pub use tracked::TrackedRing;
