//! Ring buffer invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoLostMessages | Every produced message is in the buffer or consumed |
//! | FIFO_Order | Messages are consumed, and held, in production order |
//! | BoundedCapacity | The buffer never holds more than its capacity |
//! | IndexConsistency | `head`/`tail` stay in range and `head == (tail + count) % capacity` |

use std::collections::HashSet;

use crate::counterexample::{Counterexample, StateSnapshot};
use crate::property::{PropertyChecker, PropertyResult};

/// Raw index bookkeeping reported by an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingIndices {
    /// Next write slot
    pub head: u64,
    /// Next read slot
    pub tail: u64,
    /// Live elements
    pub count: u64,
}

/// Properties that any ring buffer implementation must satisfy.
pub trait RingBufferProperties {
    /// All messages that have been produced (in order).
    fn produced_messages(&self) -> Vec<u64>;

    /// All messages that have been consumed (in order).
    fn consumed_messages(&self) -> Vec<u64>;

    /// Current messages in the buffer (tail to head order).
    fn current_contents(&self) -> Vec<u64>;

    /// Maximum capacity of the buffer.
    fn capacity(&self) -> u64;

    /// Current head/tail/count.
    fn indices(&self) -> RingIndices;
}

/// Property checker for ring buffer implementations.
pub struct RingBufferPropertyChecker<'a, T: RingBufferProperties> {
    buffer: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: RingBufferProperties> RingBufferPropertyChecker<'a, T> {
    #[must_use]
    pub fn new(buffer: &'a T) -> Self {
        Self {
            buffer,
            dst_seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        self.dst_seed = Some(seed);
        self
    }

    fn counterexample(&self, description: String, variables: Vec<(String, String)>) -> Counterexample {
        let mut ce = match self.dst_seed {
            Some(seed) => Counterexample::with_seed(seed),
            None => Counterexample::new(),
        };
        ce.add_state(StateSnapshot {
            step: 1,
            description: description.clone(),
            variables,
        });
        ce.with_description(description)
    }

    fn check_no_lost_messages(&self) -> PropertyResult {
        let produced = self.buffer.produced_messages();
        let consumed = self.buffer.consumed_messages();
        let contents = self.buffer.current_contents();

        if produced.len() != consumed.len() + contents.len() {
            return PropertyResult::fail(
                "NoLostMessages",
                format!(
                    "{} produced but {} consumed + {} buffered",
                    produced.len(),
                    consumed.len(),
                    contents.len()
                ),
                None,
            );
        }

        let seen: HashSet<u64> = consumed.iter().chain(contents.iter()).copied().collect();
        for msg in &produced {
            if !seen.contains(msg) {
                let ce = self.counterexample(
                    format!("Message {} lost", msg),
                    vec![
                        ("produced".to_string(), format!("{:?}", produced)),
                        ("consumed".to_string(), format!("{:?}", consumed)),
                        ("contents".to_string(), format!("{:?}", contents)),
                    ],
                );
                return PropertyResult::fail(
                    "NoLostMessages",
                    format!("Message {} was produced but is neither buffered nor consumed", msg),
                    Some(ce),
                );
            }
        }

        PropertyResult::pass("NoLostMessages")
    }

    fn check_fifo_order(&self) -> PropertyResult {
        let produced = self.buffer.produced_messages();
        let consumed = self.buffer.consumed_messages();
        let contents = self.buffer.current_contents();

        for (i, msg) in consumed.iter().enumerate() {
            if i < produced.len() && *msg != produced[i] {
                return PropertyResult::fail(
                    "FIFO_Order",
                    format!(
                        "Consumed message at index {} is {} but produced was {}",
                        i, msg, produced[i]
                    ),
                    None,
                );
            }
        }

        let pending = produced.get(consumed.len()..).unwrap_or(&[]);
        if pending != contents.as_slice() {
            let ce = self.counterexample(
                "Buffered messages out of order".to_string(),
                vec![
                    ("expected".to_string(), format!("{:?}", pending)),
                    ("contents".to_string(), format!("{:?}", contents)),
                ],
            );
            return PropertyResult::fail(
                "FIFO_Order",
                format!("Buffer holds {:?} but pending production is {:?}", contents, pending),
                Some(ce),
            );
        }

        PropertyResult::pass("FIFO_Order")
    }

    fn check_bounded_capacity(&self) -> PropertyResult {
        let contents = self.buffer.current_contents();
        let capacity = self.buffer.capacity();

        if contents.len() as u64 > capacity {
            return PropertyResult::fail(
                "BoundedCapacity",
                format!(
                    "Buffer contains {} items but capacity is {}",
                    contents.len(),
                    capacity
                ),
                None,
            );
        }

        PropertyResult::pass("BoundedCapacity")
    }

    fn check_index_consistency(&self) -> PropertyResult {
        let RingIndices { head, tail, count } = self.buffer.indices();
        let capacity = self.buffer.capacity();
        let buffered = self.buffer.current_contents().len() as u64;

        let message = if capacity == 0 {
            Some("capacity is zero".to_string())
        } else if head >= capacity || tail >= capacity {
            Some(format!(
                "head={} tail={} out of range for capacity {}",
                head, tail, capacity
            ))
        } else if count != buffered {
            Some(format!("count={} but {} elements buffered", count, buffered))
        } else if head != (tail + count) % capacity {
            Some(format!(
                "head={} but (tail={} + count={}) % {} = {}",
                head,
                tail,
                count,
                capacity,
                (tail + count) % capacity
            ))
        } else {
            None
        };

        match message {
            Some(message) => PropertyResult::fail("IndexConsistency", message, None),
            None => PropertyResult::pass("IndexConsistency"),
        }
    }
}

impl<'a, T: RingBufferProperties> PropertyChecker for RingBufferPropertyChecker<'a, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_no_lost_messages(),
            self.check_fifo_order(),
            self.check_bounded_capacity(),
            self.check_index_consistency(),
        ]
    }
}
