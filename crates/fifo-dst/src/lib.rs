//! # fifo-dst
//!
//! Deterministic Simulation Testing for the verified FIFO.
//!
//! Randomness and faults are driven by a single seed, so any failing run
//! can be replayed exactly. Faults are injected at operation boundaries
//! (allocation at construction, producer/consumer stalls, bursts that
//! drive the buffer into overflow); the FIFO under test is never
//! instrumented.
//!
//! ## Usage
//!
//! ```rust
//! use fifo_dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};
//!
//! let mut rng = DeterministicRng::new(12345);
//! let value = rng.gen_range(0..10_u64);
//! assert!(value < 10);
//!
//! let mut faults = FaultInjector::new(DeterministicRng::new(12346), FaultConfig::none());
//! assert!(!faults.should_inject(FaultType::ProducerStall));
//! ```
//!
//! ## Reproducibility
//!
//! ```bash
//! DST_SEED=12345 cargo test -p fifo
//! ```

pub mod fault;
pub mod random;
pub mod runner;

pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use random::DeterministicRng;
pub use runner::{DstConfig, DstError, DstOp, DstStats, DstTestableFifo, FifoDstRunner};

use tracing::{info, warn};

/// Get DST seed from environment or generate random one.
///
/// Logs the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    if let Ok(s) = std::env::var("DST_SEED") {
        match s.parse::<u64>() {
            Ok(seed) => {
                info!(seed, "DST_SEED from environment");
                return seed;
            }
            Err(e) => warn!(value = %s, error = %e, "ignoring unparsable DST_SEED"),
        }
    }
    let seed = rand::random::<u64>();
    info!(seed, "DST_SEED randomly generated");
    seed
}

/// Iteration count from `DST_ITERATIONS`, or `default`.
#[must_use]
pub fn iterations_from_env(default: u64) -> u64 {
    std::env::var("DST_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Install a test-friendly `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
