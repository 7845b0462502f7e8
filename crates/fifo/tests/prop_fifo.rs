#![cfg(not(loom))]

use std::collections::VecDeque;

use fifo::{Cursor, FifoError, LocalLock, RingBuffer};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(u8),
    Pop,
    PushBulk(Vec<u8>),
    PopBulk(usize),
    Clear(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u8>().prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => prop::collection::vec(any::<u8>(), 0..8).prop_map(Op::PushBulk),
        1 => (0usize..8).prop_map(Op::PopBulk),
        1 => (0usize..4).prop_map(Op::Clear),
    ]
}

fn ring_with(capacity: usize, values: &[u8]) -> RingBuffer<u8, LocalLock> {
    let fifo = RingBuffer::new(capacity).unwrap();
    fifo.push_bulk(values.iter().copied()).unwrap();
    fifo
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_sequence_matches_vecdeque(
        capacity in 1usize..10,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let fifo: RingBuffer<u8, LocalLock> = RingBuffer::new(capacity).unwrap();
        let mut model: VecDeque<u8> = VecDeque::with_capacity(capacity);

        for op in ops {
            match op {
                Op::Push(v) => {
                    let fits = model.len() < capacity;
                    prop_assert_eq!(fifo.push(v).is_ok(), fits);
                    if fits {
                        model.push_back(v);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(fifo.pop().ok(), model.pop_front());
                }
                Op::PushBulk(vs) => {
                    let fits = model.len() + vs.len() <= capacity;
                    prop_assert_eq!(fifo.push_bulk(vs.iter().copied()).is_ok(), fits);
                    if fits {
                        model.extend(vs);
                    }
                }
                Op::PopBulk(n) => {
                    let mut out = vec![0; n];
                    let result = fifo.pop_bulk(&mut out);
                    if n <= model.len() {
                        prop_assert!(result.is_ok());
                        let expected: Vec<u8> = model.drain(..n).collect();
                        prop_assert_eq!(out, expected);
                    } else {
                        prop_assert_eq!(result, Err(FifoError::Underflow));
                    }
                }
                Op::Clear(n) => {
                    let expected = n.min(model.len());
                    prop_assert_eq!(fifo.clear(Some(n)), expected);
                    model.drain(..expected);
                }
            }
            prop_assert_eq!(fifo.len(), model.len());
            prop_assert!(fifo.cursor().is_consistent());
        }

        prop_assert_eq!(fifo.into_vec(), Vec::from(model));
    }

    #[test]
    fn prop_push_then_pop_preserves_order(
        values in prop::collection::vec(any::<u32>(), 1..64),
    ) {
        let fifo: RingBuffer<u32, LocalLock> = RingBuffer::new(values.len()).unwrap();
        for &v in &values {
            fifo.push(v).unwrap();
        }
        prop_assert!(fifo.is_full());
        let popped: Vec<u32> = (0..values.len()).map(|_| fifo.pop().unwrap()).collect();
        prop_assert_eq!(popped, values);
        prop_assert!(fifo.is_empty());
    }

    #[test]
    fn prop_failed_ops_do_not_mutate(
        capacity in 1usize..16,
        extra in 1usize..8,
    ) {
        let values: Vec<u8> = (0..capacity).map(|i| i as u8).collect();
        let fifo = ring_with(capacity, &values);
        let before: Cursor = fifo.cursor();

        prop_assert_eq!(fifo.push(0xAA), Err(FifoError::Overflow));
        prop_assert_eq!(fifo.push_bulk(vec![0xBB; extra]), Err(FifoError::Overflow));
        let mut out = vec![0; capacity + extra];
        prop_assert_eq!(fifo.pop_bulk(&mut out), Err(FifoError::Underflow));
        prop_assert!(out.iter().all(|&b| b == 0));
        prop_assert_eq!(fifo.peek(capacity), Err(FifoError::Underflow));
        prop_assert_eq!(fifo.checksum(1, capacity), Err(FifoError::Underflow));

        prop_assert_eq!(fifo.cursor(), before);
        prop_assert_eq!(fifo.to_vec(), values);

        fifo.clear(None);
        let empty = fifo.cursor();
        prop_assert_eq!(fifo.pop(), Err(FifoError::Underflow));
        prop_assert_eq!(fifo.cursor(), empty);
    }

    #[test]
    fn prop_peek_matches_future_pops(
        rotate in 0usize..8,
        values in prop::collection::vec(any::<u8>(), 1..8),
    ) {
        // Rotate the indices first so peeks cross the wrap point.
        let fifo: RingBuffer<u8, LocalLock> = RingBuffer::new(8).unwrap();
        for _ in 0..rotate {
            fifo.push(0).unwrap();
            fifo.pop().unwrap();
        }
        fifo.push_bulk(values.iter().copied()).unwrap();

        let peeked: Vec<u8> = (0..values.len()).map(|i| fifo.peek(i).unwrap()).collect();
        prop_assert_eq!(fifo.peek(values.len()), Err(FifoError::Underflow));
        prop_assert_eq!(fifo.len(), values.len());

        let popped: Vec<u8> = (0..values.len()).map(|_| fifo.pop().unwrap()).collect();
        prop_assert_eq!(peeked, popped);
    }

    #[test]
    fn prop_checksum_is_wrapping_sum(
        rotate in 0usize..300,
        values in prop::collection::vec(any::<u8>(), 0..300),
        offset_seed in any::<usize>(),
    ) {
        let fifo: RingBuffer<u8, LocalLock> = RingBuffer::new(300).unwrap();
        for _ in 0..rotate {
            fifo.push(0).unwrap();
            fifo.pop().unwrap();
        }
        fifo.push_bulk(values.iter().copied()).unwrap();

        let wrapping_sum = |bytes: &[u8]| {
            bytes.iter().fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
        };
        prop_assert_eq!(fifo.checksum(0, values.len()), Ok(wrapping_sum(&values)));

        let offset = offset_seed % (values.len() + 1);
        let len = values.len() - offset;
        prop_assert_eq!(
            fifo.checksum(offset, len),
            Ok(wrapping_sum(&values[offset..]))
        );
        prop_assert_eq!(fifo.len(), values.len());
    }
}
