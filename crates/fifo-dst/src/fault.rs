//! Fault injection at operation boundaries.
//!
//! | Fault | Boundary | Effect |
//! |-------|----------|--------|
//! | AllocationFailure | construction | FIFO is never created |
//! | ProducerStall | before a producer op | op skipped, consumer runs ahead |
//! | ConsumerStall | before a consumer op | op skipped, producer fills up |
//! | Burst | producer op | producer pushes until it hits overflow |

use crate::random::DeterministicRng;

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    AllocationFailure,
    ProducerStall,
    ConsumerStall,
    Burst,
}

/// Per-fault probabilities.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    pub allocation_failure_probability: f64,
    pub producer_stall_probability: f64,
    pub consumer_stall_probability: f64,
    pub burst_probability: f64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            allocation_failure_probability: 0.01,
            producer_stall_probability: 0.05,
            consumer_stall_probability: 0.05,
            burst_probability: 0.02,
        }
    }
}

impl FaultConfig {
    /// No faults at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            allocation_failure_probability: 0.0,
            producer_stall_probability: 0.0,
            consumer_stall_probability: 0.0,
            burst_probability: 0.0,
        }
    }

    /// High fault rates; spends most of the run at the full/empty edges.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            allocation_failure_probability: 0.1,
            producer_stall_probability: 0.3,
            consumer_stall_probability: 0.3,
            burst_probability: 0.15,
        }
    }

    fn probability(&self, fault: FaultType) -> f64 {
        match fault {
            FaultType::AllocationFailure => self.allocation_failure_probability,
            FaultType::ProducerStall => self.producer_stall_probability,
            FaultType::ConsumerStall => self.consumer_stall_probability,
            FaultType::Burst => self.burst_probability,
        }
    }
}

/// Decides, deterministically, when to inject each fault.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
    injected_count: u64,
}

impl FaultInjector {
    #[must_use]
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        Self {
            rng,
            config,
            injected_count: 0,
        }
    }

    pub fn should_inject(&mut self, fault: FaultType) -> bool {
        let p = self.config.probability(fault);
        if p <= 0.0 {
            return false;
        }
        let inject = self.rng.gen_bool(p);
        if inject {
            self.injected_count += 1;
        }
        inject
    }

    #[must_use]
    pub fn injected_count(&self) -> u64 {
        self.injected_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_injects() {
        let mut faults = FaultInjector::new(DeterministicRng::new(3), FaultConfig::none());
        for _ in 0..1000 {
            assert!(!faults.should_inject(FaultType::Burst));
            assert!(!faults.should_inject(FaultType::AllocationFailure));
        }
        assert_eq!(faults.injected_count(), 0);
    }

    #[test]
    fn test_aggressive_injects_something() {
        let mut faults = FaultInjector::new(DeterministicRng::new(3), FaultConfig::aggressive());
        let hits = (0..1000)
            .filter(|_| faults.should_inject(FaultType::ProducerStall))
            .count();
        assert!(hits > 0);
        assert_eq!(faults.injected_count(), hits as u64);
    }
}
