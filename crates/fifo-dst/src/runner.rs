//! Model-checked DST runner for FIFO implementations.
//!
//! Every operation is applied both to the FIFO under test and to a
//! `VecDeque` reference model. The first disagreement stops the run and
//! is reported with the seed and the recent operation history.

use std::collections::VecDeque;
use std::fmt;

use fifo_core::{Actor, ActorAction, Counterexample, StateSnapshot};
use tracing::debug;

use crate::fault::{FaultConfig, FaultInjector, FaultType};
use crate::random::DeterministicRng;

/// Number of trailing actions kept for counterexamples.
const HISTORY_LEN_MAX: usize = 32;

/// Minimal FIFO surface the runner drives.
///
/// Bulk operations are all-or-nothing; `clear` returns the number removed.
pub trait DstTestableFifo: Sized {
    /// Build a FIFO, or `None` if construction failed.
    fn create(capacity: usize) -> Option<Self>;
    fn push(&self, value: u64) -> bool;
    fn pop(&self) -> Option<u64>;
    fn push_bulk(&self, values: &[u64]) -> bool;
    fn pop_bulk(&self, count: usize) -> Option<Vec<u64>>;
    fn peek(&self, index: usize) -> Option<u64>;
    fn peek_bulk(&self, max: usize) -> Vec<u64>;
    fn clear(&self, max: usize) -> usize;
    fn len(&self) -> usize;
}

/// One operation against the FIFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DstOp {
    Push(u64),
    Pop,
    PushBulk(Vec<u64>),
    PopBulk(usize),
    Peek(usize),
    PeekBulk(usize),
    Clear(usize),
}

impl DstOp {
    fn actor(&self) -> Actor {
        match self {
            DstOp::Push(_) | DstOp::PushBulk(_) => Actor::Producer,
            _ => Actor::Consumer,
        }
    }
}

impl fmt::Display for DstOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DstOp::Push(v) => write!(f, "push({})", v),
            DstOp::Pop => f.write_str("pop()"),
            DstOp::PushBulk(vs) => write!(f, "push_bulk({})", vs.len()),
            DstOp::PopBulk(n) => write!(f, "pop_bulk({})", n),
            DstOp::Peek(i) => write!(f, "peek({})", i),
            DstOp::PeekBulk(n) => write!(f, "peek_bulk({})", n),
            DstOp::Clear(n) => write!(f, "clear({})", n),
        }
    }
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct DstConfig {
    pub capacity: usize,
    pub iterations: u64,
    /// Upper bound on bulk operation sizes
    pub bulk_len_max: usize,
    pub faults: FaultConfig,
}

impl Default for DstConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            iterations: 10_000,
            bulk_len_max: 6,
            faults: FaultConfig::default(),
        }
    }
}

impl DstConfig {
    /// Small buffer, no faults.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            capacity: 8,
            iterations: 1_000,
            bulk_len_max: 4,
            faults: FaultConfig::none(),
        }
    }

    /// Odd capacity so wraparound never lines up with powers of two.
    #[must_use]
    pub fn stress() -> Self {
        Self {
            capacity: 5,
            iterations: 100_000,
            bulk_len_max: 12,
            faults: FaultConfig::aggressive(),
        }
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Counters for a run.
#[derive(Debug, Clone, Default)]
pub struct DstStats {
    pub operations_count: u64,
    pub overflows_count: u64,
    pub underflows_count: u64,
    pub stalls_count: u64,
    pub bursts_count: u64,
    pub len_max: usize,
}

impl fmt::Display for DstStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ops={} overflows={} underflows={} stalls={} bursts={} len_max={}",
            self.operations_count,
            self.overflows_count,
            self.underflows_count,
            self.stalls_count,
            self.bursts_count,
            self.len_max
        )
    }
}

/// DST failures.
#[derive(Debug, thiserror::Error)]
pub enum DstError {
    #[error("allocation fault injected creating FIFO of capacity {capacity} (DST_SEED={seed})")]
    AllocationFault { capacity: usize, seed: u64 },

    #[error("FIFO construction failed for capacity {capacity}")]
    CreateFailed { capacity: usize },

    #[error("divergence at step {step} (DST_SEED={seed}): {op} returned {actual}, model expected {expected}")]
    Divergence {
        seed: u64,
        step: u64,
        op: String,
        expected: String,
        actual: String,
        counterexample: Box<Counterexample>,
    },
}

impl DstError {
    /// Failure path for divergences.
    #[must_use]
    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            DstError::Divergence { counterexample, .. } => Some(counterexample),
            _ => None,
        }
    }
}

/// Drives a FIFO and a reference model in lockstep.
pub struct FifoDstRunner<F> {
    fifo: F,
    model: VecDeque<u64>,
    config: DstConfig,
    rng: DeterministicRng,
    faults: FaultInjector,
    next_value: u64,
    step: u64,
    history: VecDeque<ActorAction>,
    stats: DstStats,
}

impl<F: DstTestableFifo> FifoDstRunner<F> {
    /// Create the FIFO, possibly failing with an injected allocation fault.
    pub fn new(seed: u64, config: DstConfig) -> Result<Self, DstError> {
        debug_assert!(config.capacity > 0, "capacity must be positive");

        let mut rng = DeterministicRng::new(seed);
        let mut faults = FaultInjector::new(rng.fork(), config.faults.clone());
        if faults.should_inject(FaultType::AllocationFailure) {
            return Err(DstError::AllocationFault {
                capacity: config.capacity,
                seed,
            });
        }

        let fifo = F::create(config.capacity).ok_or(DstError::CreateFailed {
            capacity: config.capacity,
        })?;

        Ok(Self {
            fifo,
            model: VecDeque::with_capacity(config.capacity),
            rng,
            faults,
            next_value: 1,
            step: 0,
            history: VecDeque::with_capacity(HISTORY_LEN_MAX),
            stats: DstStats::default(),
            config,
        })
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub fn fifo(&self) -> &F {
        &self.fifo
    }

    #[must_use]
    pub fn stats(&self) -> &DstStats {
        &self.stats
    }

    /// Run the configured number of random steps, then drain and compare.
    pub fn run(&mut self) -> Result<DstStats, DstError> {
        for _ in 0..self.config.iterations {
            self.step()?;
        }
        self.drain()?;
        debug!(seed = self.seed(), stats = %self.stats, "DST run completed");
        Ok(self.stats.clone())
    }

    /// Pick and apply one random operation, honouring stall and burst faults.
    pub fn step(&mut self) -> Result<(), DstError> {
        let producer_turn = self.rng.gen_bool(0.5);

        if producer_turn {
            if self.faults.should_inject(FaultType::ProducerStall) {
                self.stats.stalls_count += 1;
                return Ok(());
            }
            if self.faults.should_inject(FaultType::Burst) {
                self.stats.bursts_count += 1;
                for _ in 0..=self.config.capacity {
                    let value = self.fresh_value();
                    self.apply(DstOp::Push(value))?;
                }
                return Ok(());
            }
            let op = if self.rng.gen_bool(0.7) {
                DstOp::Push(self.fresh_value())
            } else {
                let n = self.rng.gen_range(0..=self.config.bulk_len_max);
                DstOp::PushBulk((0..n).map(|_| self.fresh_value()).collect())
            };
            return self.apply(op);
        }

        if self.faults.should_inject(FaultType::ConsumerStall) {
            self.stats.stalls_count += 1;
            return Ok(());
        }
        let limit = self.config.capacity + 1;
        let op = match self.rng.gen_range(0..10_u8) {
            0..=3 => DstOp::Pop,
            4 | 5 => DstOp::PopBulk(self.rng.gen_range(0..=self.config.bulk_len_max)),
            6 | 7 => DstOp::Peek(self.rng.gen_range(0..=limit)),
            8 => DstOp::PeekBulk(self.rng.gen_range(0..=limit)),
            _ => DstOp::Clear(self.rng.gen_range(0..=limit)),
        };
        self.apply(op)
    }

    /// Apply one operation to both the FIFO and the model and compare.
    pub fn apply(&mut self, op: DstOp) -> Result<(), DstError> {
        self.step += 1;
        self.stats.operations_count += 1;
        let capacity = self.config.capacity;

        let (expected, actual) = match op {
            DstOp::Push(value) => {
                let expected = self.model.len() < capacity;
                if expected {
                    self.model.push_back(value);
                } else {
                    self.stats.overflows_count += 1;
                }
                let actual = self.fifo.push(value);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::Pop => {
                let expected = self.model.pop_front();
                if expected.is_none() {
                    self.stats.underflows_count += 1;
                }
                let actual = self.fifo.pop();
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::PushBulk(ref values) => {
                let expected = self.model.len() + values.len() <= capacity;
                if expected {
                    self.model.extend(values.iter().copied());
                } else {
                    self.stats.overflows_count += 1;
                }
                let actual = self.fifo.push_bulk(values);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::PopBulk(n) => {
                let expected: Option<Vec<u64>> = if n <= self.model.len() {
                    Some(self.model.drain(..n).collect())
                } else {
                    self.stats.underflows_count += 1;
                    None
                };
                let actual = self.fifo.pop_bulk(n);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::Peek(index) => {
                let expected = self.model.get(index).copied();
                let actual = self.fifo.peek(index);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::PeekBulk(n) => {
                let expected: Vec<u64> = self.model.iter().take(n).copied().collect();
                let actual = self.fifo.peek_bulk(n);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
            DstOp::Clear(n) => {
                let expected = n.min(self.model.len());
                self.model.drain(..expected);
                let actual = self.fifo.clear(n);
                (format!("{:?}", expected), format!("{:?}", actual))
            }
        };

        let success = expected == actual;
        self.record(&op, success);
        if !success {
            return Err(self.divergence(&op, expected, actual));
        }

        let len = self.fifo.len();
        if len != self.model.len() {
            return Err(self.divergence(
                &op,
                format!("len {}", self.model.len()),
                format!("len {}", len),
            ));
        }
        self.stats.len_max = self.stats.len_max.max(len);
        Ok(())
    }

    /// Pop everything left and compare against the model.
    fn drain(&mut self) -> Result<(), DstError> {
        while !self.model.is_empty() {
            self.apply(DstOp::Pop)?;
        }
        self.apply(DstOp::Pop)
    }

    fn fresh_value(&mut self) -> u64 {
        let value = self.next_value;
        self.next_value += 1;
        value
    }

    fn record(&mut self, op: &DstOp, success: bool) {
        if self.history.len() == HISTORY_LEN_MAX {
            self.history.pop_front();
        }
        self.history.push_back(ActorAction {
            actor: op.actor(),
            step: self.step,
            action: op.to_string(),
            success,
        });
    }

    fn divergence(&self, op: &DstOp, expected: String, actual: String) -> DstError {
        let mut ce = Counterexample::new().with_description(format!(
            "{} returned {} but the model expected {}",
            op, actual, expected
        ));
        ce.dst_seed = Some(self.seed());

        // Renumber so the diagram starts at step 1.
        for (i, action) in self.history.iter().enumerate() {
            let mut action = action.clone();
            action.step = i as u64 + 1;
            ce.add_action(action);
        }
        ce.add_state(StateSnapshot {
            step: self.history.len() as u64,
            description: format!("model={:?}", self.model),
            variables: vec![("model_len".to_string(), self.model.len().to_string())],
        });

        DstError::Divergence {
            seed: self.seed(),
            step: self.step,
            op: op.to_string(),
            expected,
            actual,
            counterexample: Box::new(ce),
        }
    }
}
