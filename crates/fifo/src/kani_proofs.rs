//! Kani proof harnesses for the cursor arithmetic and the typed buffer.
//!
//! Bounded model checking over every input up to the unwind bound.
//!
//! # Running the proofs
//!
//! ```bash
//! cargo kani -p fifo
//! cargo kani -p fifo --harness proof_cursor_stays_consistent
//! ```
//!
//! Kani explores sequential executions only. Lock interleavings are
//! covered by the loom tests.

#[cfg(kani)]
mod proofs {
    use crate::cursor::Cursor;
    use crate::error::FifoError;
    use crate::lock::LocalLock;
    use crate::ring::RingBuffer;

    /// Any sequence of guarded advances keeps the cursor consistent.
    #[kani::proof]
    #[kani::unwind(7)]
    fn proof_cursor_stays_consistent() {
        let capacity: usize = kani::any();
        kani::assume(capacity > 0 && capacity <= 4);
        let mut cursor = Cursor::new(capacity);

        for _ in 0..6 {
            let produce: bool = kani::any();
            if produce && !cursor.is_full() {
                let slot = cursor.advance_head();
                kani::assert(slot < capacity, "write slot in range");
            } else if !produce && !cursor.is_empty() {
                let slot = cursor.advance_tail();
                kani::assert(slot < capacity, "read slot in range");
            }
            kani::assert(cursor.is_consistent(), "cursor invariants hold");
        }
    }

    /// `slot(relative)` is in range exactly when `relative < len`.
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_slot_in_range() {
        let mut cursor = Cursor::new(4);
        let writes: usize = kani::any();
        let reads: usize = kani::any();
        kani::assume(writes <= 4 && reads <= writes);
        for _ in 0..writes {
            cursor.advance_head();
        }
        for _ in 0..reads {
            cursor.advance_tail();
        }

        let relative: usize = kani::any();
        kani::assume(relative < 8);
        match cursor.slot(relative) {
            Some(slot) => kani::assert(
                relative < cursor.len() && slot < 4,
                "slot only for buffered elements",
            ),
            None => kani::assert(relative >= cursor.len(), "buffered element has a slot"),
        }
    }

    /// Two pushes then two pops return the values in push order.
    #[kani::proof]
    #[kani::unwind(4)]
    fn proof_fifo_order() {
        let fifo: RingBuffer<u8, LocalLock> = match RingBuffer::new(2) {
            Ok(fifo) => fifo,
            Err(_) => return,
        };
        let v1: u8 = kani::any();
        let v2: u8 = kani::any();

        kani::assert(fifo.push(v1).is_ok(), "first push fits");
        kani::assert(fifo.push(v2).is_ok(), "second push fits");
        kani::assert(fifo.push(0) == Err(FifoError::Overflow), "third push overflows");
        kani::assert(fifo.pop() == Ok(v1), "oldest value first");
        kani::assert(fifo.pop() == Ok(v2), "then the next");
        kani::assert(fifo.pop() == Err(FifoError::Underflow), "then empty");
    }

    /// A rejected bulk push leaves the buffer untouched.
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_rejected_bulk_push_is_noop() {
        let fifo: RingBuffer<u8, LocalLock> = match RingBuffer::new(3) {
            Ok(fifo) => fifo,
            Err(_) => return,
        };
        let held: u8 = kani::any();
        kani::assert(fifo.push(held).is_ok(), "push fits");
        let before = fifo.cursor();

        let result = fifo.push_bulk([1u8, 2, 3]);
        kani::assert(result == Err(FifoError::Overflow), "three do not fit in two");
        kani::assert(fifo.cursor() == before, "cursor unchanged");
        kani::assert(fifo.peek(0) == Ok(held), "contents unchanged");
    }
}
