//! Ring index arithmetic.
//!
//! `Cursor` is the only place wraparound happens. Both the typed
//! [`RingBuffer`](crate::RingBuffer) and the byte-oriented
//! [`RawFifo`](crate::RawFifo) keep one next to their storage.
//!
//! # Invariants
//!
//! - `capacity > 0`
//! - `head < capacity` and `tail < capacity`
//! - `count <= capacity`
//! - `head == (tail + count) % capacity`
//!
//! Full and empty are decided by `count` alone, never by comparing
//! `head` with `tail` (they are equal in both states).

/// Head/tail/count bookkeeping for a ring of `capacity` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    head: usize,
    tail: usize,
    count: usize,
    capacity: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity must be positive");
        Self {
            head: 0,
            tail: 0,
            count: 0,
            capacity,
        }
    }

    /// Next write slot.
    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Next read slot.
    #[must_use]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Slots still available to the producer.
    #[must_use]
    pub const fn free(&self) -> usize {
        self.capacity - self.count
    }

    /// Physical slot of the element `relative` positions after `tail`,
    /// or `None` if fewer than `relative + 1` elements are buffered.
    #[must_use]
    pub fn slot(&self, relative: usize) -> Option<usize> {
        if relative >= self.count {
            return None;
        }
        Some(self.wrap_add(self.tail, relative))
    }

    /// `(index + n) % capacity` for `index, n < capacity`, without forming
    /// the sum. Zero-sized slots allow capacities near `usize::MAX`.
    const fn wrap_add(&self, index: usize, n: usize) -> usize {
        let until_wrap = self.capacity - index;
        if n < until_wrap {
            index + n
        } else {
            n - until_wrap
        }
    }

    /// Claim the head slot for a write and advance `head`.
    ///
    /// Callers check `is_full` first.
    pub fn advance_head(&mut self) -> usize {
        debug_assert!(!self.is_full(), "advance_head on full ring");
        let slot = self.head;
        self.head = (self.head + 1) % self.capacity;
        self.count += 1;
        slot
    }

    /// Release the tail slot after a read and advance `tail`.
    ///
    /// Callers check `is_empty` first.
    pub fn advance_tail(&mut self) -> usize {
        debug_assert!(!self.is_empty(), "advance_tail on empty ring");
        let slot = self.tail;
        self.tail = (self.tail + 1) % self.capacity;
        self.count -= 1;
        slot
    }

    /// True when every invariant in the module docs holds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.capacity > 0
            && self.head < self.capacity
            && self.tail < self.capacity
            && self.count <= self.capacity
            && self.head == self.wrap_add(self.tail, self.count % self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_empty_share_indices() {
        let mut cursor = Cursor::new(3);
        assert!(cursor.is_empty());
        for expected in 0..3 {
            assert_eq!(cursor.advance_head(), expected);
        }
        assert!(cursor.is_full());
        assert_eq!(cursor.head(), cursor.tail());
        assert_eq!(cursor.free(), 0);
    }

    #[test]
    fn test_wraparound_uses_every_slot() {
        let mut cursor = Cursor::new(4);
        let mut written = Vec::new();
        for _ in 0..10 {
            written.push(cursor.advance_head());
            cursor.advance_tail();
            assert!(cursor.is_consistent());
        }
        assert_eq!(written, vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_slot_wraps_relative_to_tail() {
        let mut cursor = Cursor::new(4);
        for _ in 0..3 {
            cursor.advance_head();
            cursor.advance_tail();
        }
        // tail=3, head=3
        for _ in 0..4 {
            cursor.advance_head();
        }
        assert_eq!(cursor.slot(0), Some(3));
        assert_eq!(cursor.slot(1), Some(0));
        assert_eq!(cursor.slot(3), Some(2));
        assert_eq!(cursor.slot(4), None);
    }

    #[test]
    fn test_slot_near_usize_max_capacity() {
        let cursor = Cursor {
            head: 1,
            tail: usize::MAX - 2,
            count: 3,
            capacity: usize::MAX,
        };
        assert!(cursor.is_consistent());
        assert_eq!(cursor.slot(0), Some(usize::MAX - 2));
        assert_eq!(cursor.slot(1), Some(usize::MAX - 1));
        assert_eq!(cursor.slot(2), Some(0));
        assert_eq!(cursor.slot(3), None);
    }

    #[test]
    fn test_single_slot_ring() {
        let mut cursor = Cursor::new(1);
        assert_eq!(cursor.advance_head(), 0);
        assert!(cursor.is_full());
        assert_eq!(cursor.slot(0), Some(0));
        assert_eq!(cursor.advance_tail(), 0);
        assert!(cursor.is_empty());
        assert!(cursor.is_consistent());
    }
}
