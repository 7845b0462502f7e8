//! Typed fixed-capacity FIFO.
//!
//! # Invariants
//!
//! | Property | Enforced by |
//! |----------|-------------|
//! | `0 <= len <= capacity` | `Cursor` |
//! | push on full fails, no mutation | `try_push`, `push_bulk` pre-flight |
//! | pop on empty fails, no mutation | `pop`, `pop_bulk` pre-flight |
//! | FIFO order | single head/tail pair, modulo wrap |
//!
//! Storage is reserved once, fallibly, at construction and never grows.
//! Every operation takes the buffer's lock for its whole duration and
//! never waits on full/empty: those report `Overflow`/`Underflow`.

use std::fmt;
use std::mem;

use tracing::{debug, trace, warn};

use crate::config::FifoConfig;
use crate::cursor::Cursor;
use crate::error::{FifoError, Result};
use crate::lock::{Locked, ParkingLock, RawLock};

/// Slots plus the cursor that indexes them.
struct Ring<T> {
    slots: Box<[Option<T>]>,
    cursor: Cursor,
}

impl<T> Ring<T> {
    fn write(&mut self, value: T) {
        let slot = self.cursor.advance_head();
        self.slots[slot] = Some(value);
    }

    fn read(&mut self) -> Option<T> {
        if self.cursor.is_empty() {
            return None;
        }
        let slot = self.cursor.advance_tail();
        let value = self.slots[slot].take();
        debug_assert!(value.is_some(), "live slot {} was empty", slot);
        value
    }

    fn get(&self, relative: usize) -> Option<&T> {
        self.cursor
            .slot(relative)
            .and_then(|slot| self.slots[slot].as_ref())
    }
}

/// Reserve `capacity` empty slots without aborting on allocation failure.
fn allocate_slots<T>(capacity: usize) -> Result<Box<[Option<T>]>> {
    let mut slots = Vec::new();
    if slots.try_reserve_exact(capacity).is_err() {
        let requested = capacity.saturating_mul(mem::size_of::<Option<T>>());
        warn!(capacity, requested, "FIFO storage allocation failed");
        return Err(FifoError::AllocationFailure { requested });
    }
    slots.resize_with(capacity, || None);
    Ok(slots.into_boxed_slice())
}

/// A fixed-capacity FIFO of `T`, guarded by the lock `L`.
///
/// Dropping the buffer releases its storage exactly once; there is no
/// separate destroy call to forget or repeat.
///
/// ```
/// use fifo::{FifoError, RingBuffer};
///
/// let fifo: RingBuffer<i32> = RingBuffer::new(2)?;
/// fifo.push(1)?;
/// fifo.push(2)?;
/// assert_eq!(fifo.push(3), Err(FifoError::Overflow));
/// assert_eq!(fifo.pop()?, 1);
/// # Ok::<(), FifoError>(())
/// ```
pub struct RingBuffer<T, L: RawLock = ParkingLock> {
    inner: Locked<L, Ring<T>>,
    capacity: usize,
}

impl<T, L: RawLock> RingBuffer<T, L> {
    /// Allocate an empty buffer of `capacity` elements.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FifoError::ZeroCapacity);
        }
        let slots = allocate_slots(capacity)?;
        debug!(
            capacity,
            element_size = mem::size_of::<T>(),
            "FIFO allocated"
        );
        Ok(Self {
            inner: Locked::new(Ring {
                slots,
                cursor: Cursor::new(capacity),
            }),
            capacity,
        })
    }

    /// Allocate from a validated config. `element_size` is not consulted.
    pub fn with_config(config: &FifoConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

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

    /// Snapshot of the index bookkeeping.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.inner.lock().cursor
    }

    /// Append `value`. On a full buffer the value is dropped.
    pub fn push(&self, value: T) -> Result<()> {
        self.try_push(value).map_err(|(_, e)| e)
    }

    /// Append `value`, handing it back on overflow.
    pub fn try_push(&self, value: T) -> Result<(), (T, FifoError)> {
        let mut ring = self.inner.lock();
        if ring.cursor.is_full() {
            trace!(capacity = self.capacity, "push rejected: FIFO full");
            return Err((value, FifoError::Overflow));
        }
        ring.write(value);
        Ok(())
    }

    /// Remove and return the oldest element.
    pub fn pop(&self) -> Result<T> {
        let mut ring = self.inner.lock();
        ring.read().ok_or_else(|| {
            trace!("pop rejected: FIFO empty");
            FifoError::Underflow
        })
    }

    /// Append every item, or none of them.
    ///
    /// The iterator's reported length is checked against the free slots
    /// before anything is written.
    pub fn push_bulk<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let requested = items.len();
        let mut ring = self.inner.lock();
        if requested > ring.cursor.free() {
            trace!(requested, free = ring.cursor.free(), "bulk push rejected");
            return Err(FifoError::Overflow);
        }
        for item in items.take(requested) {
            ring.write(item);
        }
        Ok(())
    }

    /// Fill `out` with the oldest `out.len()` elements, or fail untouched.
    pub fn pop_bulk(&self, out: &mut [T]) -> Result<()> {
        let mut ring = self.inner.lock();
        if out.len() > ring.cursor.len() {
            trace!(requested = out.len(), len = ring.cursor.len(), "bulk pop rejected");
            return Err(FifoError::Underflow);
        }
        for dst in out.iter_mut() {
            if let Some(value) = ring.read() {
                *dst = value;
            }
        }
        Ok(())
    }

    /// Best-effort append: writes until the buffer fills, returns how many.
    ///
    /// Items past the first rejected one are not pulled from the iterator.
    pub fn push_partial<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut items = items.into_iter();
        let mut ring = self.inner.lock();
        let mut written = 0;
        while !ring.cursor.is_full() {
            let Some(item) = items.next() else { break };
            ring.write(item);
            written += 1;
        }
        written
    }

    /// Best-effort pop into `out`; returns how many slots were filled.
    pub fn pop_partial(&self, out: &mut [T]) -> usize {
        let mut ring = self.inner.lock();
        let mut read = 0;
        for dst in out.iter_mut() {
            let Some(value) = ring.read() else { break };
            *dst = value;
            read += 1;
        }
        read
    }

    /// Discard up to `max` of the oldest elements (all of them for `None`).
    /// Returns the number removed.
    pub fn clear(&self, max: Option<usize>) -> usize {
        let mut ring = self.inner.lock();
        let len = ring.cursor.len();
        let n = max.map_or(len, |max| max.min(len));
        for _ in 0..n {
            drop(ring.read());
        }
        n
    }

    /// Call `f` on the element `relative` places after the oldest one.
    ///
    /// Runs under the lock; `f` must not touch this buffer.
    pub fn peek_with<R>(&self, relative: usize, f: impl FnOnce(&T) -> R) -> Result<R> {
        let ring = self.inner.lock();
        ring.get(relative).map(f).ok_or(FifoError::Underflow)
    }

    /// Destroy the buffer, returning whatever was still queued, oldest first.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        let mut ring = self.inner.into_inner();
        let mut out = Vec::with_capacity(ring.cursor.len());
        while let Some(value) = ring.read() {
            out.push(value);
        }
        out
    }
}

impl<T: Clone, L: RawLock> RingBuffer<T, L> {
    /// Clone of the element `relative` places after the oldest one.
    ///
    /// `peek(0)` is what the next `pop` would return.
    pub fn peek(&self, relative: usize) -> Result<T> {
        self.peek_with(relative, T::clone)
    }

    /// Copy up to `out.len()` of the oldest elements into `out` without
    /// removing them. Returns the number copied.
    pub fn peek_bulk(&self, out: &mut [T]) -> usize {
        let ring = self.inner.lock();
        let n = out.len().min(ring.cursor.len());
        for (relative, dst) in out.iter_mut().take(n).enumerate() {
            if let Some(value) = ring.get(relative) {
                dst.clone_from(value);
            }
        }
        n
    }

    /// Clone of the whole queue, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let ring = self.inner.lock();
        (0..ring.cursor.len())
            .filter_map(|relative| ring.get(relative).cloned())
            .collect()
    }
}

impl<L: RawLock> RingBuffer<u8, L> {
    /// 16-bit wrapping sum of `len` bytes starting `offset` bytes after
    /// the oldest one.
    ///
    /// This is a cheap rolling sum for framing checks, not an integrity
    /// guarantee. Fails with `Underflow` unless `offset + len` bytes are
    /// buffered.
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
            .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte))))
    }
}

impl<T, L: RawLock> fmt::Debug for RingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("RingBuffer");
        d.field("capacity", &self.capacity);
        match self.inner.try_lock() {
            Some(ring) => d.field("cursor", &ring.cursor),
            None => d.field("cursor", &format_args!("<locked>")),
        };
        d.finish()
    }
}


/// Loom tests - exhaustively check producer/consumer interleavings.
#[cfg(all(test, loom))]
mod loom_tests {
    use super::*;
    use crate::lock::SpinLock;
    use loom::sync::Arc;
    use loom::thread;

    #[test]
    fn test_push_pop_race() {
        loom::model(|| {
            let fifo = Arc::new(RingBuffer::<u64, SpinLock>::new(2).unwrap());
            fifo.push(1).unwrap();

            let producer = {
                let fifo = Arc::clone(&fifo);
                thread::spawn(move || fifo.push(2))
            };
            let consumer = {
                let fifo = Arc::clone(&fifo);
                thread::spawn(move || fifo.pop())
            };

            assert!(producer.join().unwrap().is_ok());
            assert_eq!(consumer.join().unwrap(), Ok(1));
            assert_eq!(fifo.pop(), Ok(2));
            assert!(fifo.is_empty());
        });
    }

    #[test]
    fn test_full_buffer_race() {
        loom::model(|| {
            let fifo = Arc::new(RingBuffer::<u64, SpinLock>::new(1).unwrap());

            let f1 = Arc::clone(&fifo);
            let h1 = thread::spawn(move || f1.push(1).is_ok());
            let f2 = Arc::clone(&fifo);
            let h2 = thread::spawn(move || f2.push(2).is_ok());

            let pushed = [h1.join().unwrap(), h2.join().unwrap()];
            // Exactly one push fits.
            assert_eq!(pushed.iter().filter(|&&ok| ok).count(), 1);
            assert_eq!(fifo.len(), 1);
        });
    }
}
