//! Byte-oriented FIFO of fixed-width records.
//!
//! For wire and byte-stream use where the element type is only known as
//! a width in bytes. Records go in and out as byte slices; everything
//! else (wraparound, all-or-nothing bulk ops, lock discipline) matches
//! [`RingBuffer`](crate::RingBuffer).

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::FifoConfig;
use crate::cursor::Cursor;
use crate::error::{FifoError, Result};
use crate::lock::{Locked, ParkingLock, RawLock};

struct RawRing {
    bytes: Box<[u8]>,
    width: usize,
    cursor: Cursor,
}

impl RawRing {
    fn record(&self, slot: usize) -> &[u8] {
        let start = slot * self.width;
        &self.bytes[start..start + self.width]
    }

    fn record_mut(&mut self, slot: usize) -> &mut [u8] {
        let start = slot * self.width;
        &mut self.bytes[start..start + self.width]
    }

    fn write(&mut self, record: &[u8]) {
        let slot = self.cursor.advance_head();
        self.record_mut(slot).copy_from_slice(record);
    }

    fn read(&mut self, out: &mut [u8]) {
        let slot = self.cursor.advance_tail();
        out.copy_from_slice(self.record(slot));
    }

    fn get(&self, relative: usize) -> Option<&[u8]> {
        self.cursor.slot(relative).map(|slot| self.record(slot))
    }
}

/// A fixed-capacity FIFO of `element_size`-byte records.
///
/// ```
/// use fifo::{FifoError, RawFifo};
///
/// let fifo: RawFifo = RawFifo::new(4, 2)?;
/// fifo.push_bulk(&[1, 0, 2, 0])?;
/// let mut record = [0u8; 2];
/// fifo.pop(&mut record)?;
/// assert_eq!(record, [1, 0]);
/// # Ok::<(), FifoError>(())
/// ```
pub struct RawFifo<L: RawLock = ParkingLock> {
    inner: Locked<L, RawRing>,
    capacity: usize,
    element_size: usize,
}

impl<L: RawLock> RawFifo<L> {
    /// Allocate `capacity * element_size` bytes of storage.
    pub fn new(capacity: usize, element_size: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FifoError::ZeroCapacity);
        }
        if element_size == 0 {
            return Err(FifoError::ZeroElementSize);
        }
        let requested = capacity
            .checked_mul(element_size)
            .ok_or(FifoError::AllocationFailure { requested: usize::MAX })?;

        let mut bytes = Vec::new();
        if bytes.try_reserve_exact(requested).is_err() {
            warn!(capacity, element_size, requested, "FIFO storage allocation failed");
            return Err(FifoError::AllocationFailure { requested });
        }
        bytes.resize(requested, 0);
        debug!(capacity, element_size, "raw FIFO allocated");

        Ok(Self {
            inner: Locked::new(RawRing {
                bytes: bytes.into_boxed_slice(),
                width: element_size,
                cursor: Cursor::new(capacity),
            }),
            capacity,
            element_size,
        })
    }

    pub fn with_config(config: &FifoConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity, config.element_size)
    }

    /// Capacity in records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().cursor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().cursor.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.lock().cursor.is_full()
    }

    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.inner.lock().cursor.free()
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.inner.lock().cursor
    }

    /// Number of whole records in `bytes`.
    fn records_in(&self, bytes: usize) -> Result<usize> {
        if bytes % self.element_size != 0 {
            return Err(FifoError::ElementSize {
                expected: self.element_size,
                actual: bytes,
            });
        }
        Ok(bytes / self.element_size)
    }

    fn expect_one_record(&self, bytes: usize) -> Result<()> {
        if bytes != self.element_size {
            return Err(FifoError::ElementSize {
                expected: self.element_size,
                actual: bytes,
            });
        }
        Ok(())
    }

    /// Append one record; `record.len()` must equal `element_size`.
    pub fn push(&self, record: &[u8]) -> Result<()> {
        self.expect_one_record(record.len())?;
        let mut ring = self.inner.lock();
        if ring.cursor.is_full() {
            trace!(capacity = self.capacity, "push rejected: FIFO full");
            return Err(FifoError::Overflow);
        }
        ring.write(record);
        Ok(())
    }

    /// Remove the oldest record into `out`.
    pub fn pop(&self, out: &mut [u8]) -> Result<()> {
        self.expect_one_record(out.len())?;
        let mut ring = self.inner.lock();
        if ring.cursor.is_empty() {
            trace!("pop rejected: FIFO empty");
            return Err(FifoError::Underflow);
        }
        ring.read(out);
        Ok(())
    }

    /// Append every record in `data`, or none.
    pub fn push_bulk(&self, data: &[u8]) -> Result<()> {
        let n = self.records_in(data.len())?;
        let mut ring = self.inner.lock();
        if n > ring.cursor.free() {
            trace!(requested = n, free = ring.cursor.free(), "bulk push rejected");
            return Err(FifoError::Overflow);
        }
        for record in data.chunks_exact(self.element_size) {
            ring.write(record);
        }
        Ok(())
    }

    /// Fill `out` with the oldest records, or fail untouched.
    pub fn pop_bulk(&self, out: &mut [u8]) -> Result<()> {
        let n = self.records_in(out.len())?;
        let mut ring = self.inner.lock();
        if n > ring.cursor.len() {
            trace!(requested = n, len = ring.cursor.len(), "bulk pop rejected");
            return Err(FifoError::Underflow);
        }
        for record in out.chunks_exact_mut(self.element_size) {
            ring.read(record);
        }
        Ok(())
    }

    /// Discard up to `max` records (all for `None`); returns how many.
    pub fn clear(&self, max: Option<usize>) -> usize {
        let mut ring = self.inner.lock();
        let len = ring.cursor.len();
        let n = max.map_or(len, |max| max.min(len));
        for _ in 0..n {
            ring.cursor.advance_tail();
        }
        n
    }

    /// Copy the record `relative` places after the oldest into `out`.
    pub fn peek(&self, out: &mut [u8], relative: usize) -> Result<()> {
        self.expect_one_record(out.len())?;
        let ring = self.inner.lock();
        let record = ring.get(relative).ok_or(FifoError::Underflow)?;
        out.copy_from_slice(record);
        Ok(())
    }

    /// Copy as many whole records as fit in `out`, oldest first, without
    /// removing them. Returns the number of **bytes** copied.
    pub fn peek_bulk(&self, out: &mut [u8]) -> usize {
        let ring = self.inner.lock();
        let n = (out.len() / self.element_size).min(ring.cursor.len());
        for (relative, dst) in out.chunks_exact_mut(self.element_size).take(n).enumerate() {
            if let Some(record) = ring.get(relative) {
                dst.copy_from_slice(record);
            }
        }
        n * self.element_size
    }

    /// 16-bit wrapping sum over every byte of `len` records, starting
    /// `offset` records after the oldest.
    pub fn checksum(&self, offset: usize, len: usize) -> Result<u16> {
        let ring = self.inner.lock();
        let end = match offset.checked_add(len) {
            Some(end) if end <= ring.cursor.len() => end,
            _ => {
                trace!(offset, len, buffered = ring.cursor.len(), "checksum rejected");
                return Err(FifoError::Underflow);
            }
        };
        Ok((offset..end)
            .filter_map(|relative| ring.get(relative))
            .flatten()
            .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte))))
    }
}

impl<L: RawLock> fmt::Debug for RawFifo<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFifo")
            .field("capacity", &self.capacity)
            .field("element_size", &self.element_size)
            .finish_non_exhaustive()
    }
}
