//! A `RingBuffer<u64>` that records its own history.
//!
//! `TrackedRing` logs every value that goes in and comes out so the
//! invariant checker in `fifo-core` can judge the buffer after a run.
//! The log lock is held across each buffer operation, so the recorded
//! order is the order the buffer saw. The wrapped buffer is private; every
//! mutation goes through the log.

use fifo_core::{RingBufferProperties, RingIndices};
use parking_lot::Mutex;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::lock::{ParkingLock, RawLock};
use crate::ring::RingBuffer;

#[derive(Debug, Default)]
struct History {
    produced: Vec<u64>,
    consumed: Vec<u64>,
}

/// Ring buffer plus a produced/consumed log.
pub struct TrackedRing<L: RawLock = ParkingLock> {
    ring: RingBuffer<u64, L>,
    history: Mutex<History>,
}

impl<L: RawLock> TrackedRing<L> {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            ring: RingBuffer::new(capacity)?,
            history: Mutex::new(History::default()),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Snapshot of the wrapped buffer's index bookkeeping.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.ring.cursor()
    }

    pub fn push(&self, value: u64) -> Result<()> {
        let mut history = self.history.lock();
        self.ring.push(value)?;
        history.produced.push(value);
        Ok(())
    }

    pub fn pop(&self) -> Result<u64> {
        let mut history = self.history.lock();
        let value = self.ring.pop()?;
        history.consumed.push(value);
        Ok(value)
    }

    pub fn push_bulk(&self, values: &[u64]) -> Result<()> {
        let mut history = self.history.lock();
        self.ring.push_bulk(values.iter().copied())?;
        history.produced.extend_from_slice(values);
        Ok(())
    }

    pub fn pop_bulk(&self, count: usize) -> Result<Vec<u64>> {
        let mut history = self.history.lock();
        let mut out = vec![0; count];
        self.ring.pop_bulk(&mut out)?;
        history.consumed.extend_from_slice(&out);
        Ok(out)
    }

    /// Discarded values count as consumed.
    pub fn clear(&self, max: Option<usize>) -> usize {
        let mut history = self.history.lock();
        let capacity = self.ring.capacity();
        let mut discarded = vec![0; max.map_or(capacity, |max| max.min(capacity))];
        let n = self.ring.pop_partial(&mut discarded);
        history.consumed.extend_from_slice(&discarded[..n]);
        n
    }

    pub fn peek(&self, relative: usize) -> Result<u64> {
        self.ring.peek(relative)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<L: RawLock> RingBufferProperties for TrackedRing<L> {
    fn produced_messages(&self) -> Vec<u64> {
        self.history.lock().produced.clone()
    }

    fn consumed_messages(&self) -> Vec<u64> {
        self.history.lock().consumed.clone()
    }

    fn current_contents(&self) -> Vec<u64> {
        self.ring.to_vec()
    }

    fn capacity(&self) -> u64 {
        self.ring.capacity() as u64
    }

    fn indices(&self) -> RingIndices {
        let cursor = self.cursor();
        RingIndices {
            head: cursor.head() as u64,
            tail: cursor.tail() as u64,
            count: cursor.len() as u64,
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::error::FifoError;
    use crate::lock::SpinLock;
    use fifo_core::{PropertyChecker, RingBufferPropertyChecker};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_history_tracks_operations() {
        let ring: TrackedRing = TrackedRing::new(4).unwrap();
        ring.push_bulk(&[1, 2, 3]).unwrap();
        assert_eq!(ring.pop(), Ok(1));
        assert_eq!(ring.push_bulk(&[4, 5, 6]), Err(FifoError::Overflow));
        assert_eq!(ring.clear(Some(1)), 1);
        ring.push(4).unwrap();

        assert_eq!(ring.produced_messages(), vec![1, 2, 3, 4]);
        assert_eq!(ring.consumed_messages(), vec![1, 2]);
        assert_eq!(ring.current_contents(), vec![3, 4]);

        let checker = RingBufferPropertyChecker::new(&ring);
        assert!(checker.all_hold(), "{:?}", checker.violations());
    }

    #[test]
    fn test_properties_hold_across_wraparound() {
        let ring: TrackedRing = TrackedRing::new(3).unwrap();
        for i in 0..50 {
            ring.push(i).unwrap();
            if i % 2 == 1 {
                ring.pop_bulk(2).unwrap();
            }
        }
        let checker = RingBufferPropertyChecker::new(&ring);
        for result in checker.check_all() {
            assert!(result.holds, "{}", result);
        }
    }

    #[test]
    fn test_clear_logs_exactly_what_it_discards() {
        let ring: TrackedRing = TrackedRing::new(4).unwrap();
        ring.push_bulk(&[1, 2, 3]).unwrap();
        assert_eq!(ring.clear(Some(10)), 3);
        ring.push_bulk(&[4, 5]).unwrap();
        assert_eq!(ring.clear(Some(1)), 1);

        assert_eq!(ring.consumed_messages(), vec![1, 2, 3, 4]);
        assert_eq!(ring.current_contents(), vec![5]);
        assert_eq!(ring.capacity(), 4);
        assert!(ring.cursor().is_consistent());
        let checker = RingBufferPropertyChecker::new(&ring);
        assert!(checker.all_hold(), "{:?}", checker.violations());
    }

    #[test]
    fn test_clear_races_with_producer() {
        const ITEMS: u64 = 5_000;
        let ring = Arc::new(TrackedRing::<SpinLock>::new(4).unwrap());

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut next = 0;
                while next < ITEMS {
                    if ring.push(next).is_ok() {
                        next += 1;
                    }
                }
            })
        };

        let mut cleared = 0;
        while cleared < ITEMS as usize {
            cleared += ring.clear(Some(3));
        }
        producer.join().unwrap();

        let checker = RingBufferPropertyChecker::new(&*ring);
        assert!(checker.all_hold(), "{:?}", checker.violations());
        assert_eq!(ring.consumed_messages(), (0..ITEMS).collect::<Vec<_>>());
    }

    #[test]
    fn test_properties_hold_under_contention() {
        const PER_PRODUCER: u64 = 2_000;
        let ring = Arc::new(TrackedRing::<SpinLock>::new(8).unwrap());

        let producers: Vec<_> = (0..2)
            .map(|p| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    let mut next = 0;
                    while next < PER_PRODUCER {
                        if ring.push(p * PER_PRODUCER + next).is_ok() {
                            next += 1;
                        }
                    }
                })
            })
            .collect();

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut popped = 0;
                while popped < 2 * PER_PRODUCER {
                    if ring.pop().is_ok() {
                        popped += 1;
                    }
                }
            })
        };

        for producer in producers {
            producer.join().unwrap();
        }
        consumer.join().unwrap();

        let checker = RingBufferPropertyChecker::new(&*ring);
        assert!(checker.all_hold(), "{:?}", checker.violations());
        assert!(ring.is_empty());
        assert_eq!(ring.consumed_messages().len() as u64, 2 * PER_PRODUCER);
    }
}
