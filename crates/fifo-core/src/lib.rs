//! # fifo-core
//!
//! Core types and invariants for the verified FIFO.
//!
//! This crate provides:
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `Counterexample` for rendering failure paths
//! - `RingBufferProperties`, the invariant trait a FIFO implementation exposes
//!
//! Nothing here depends on a concrete buffer. Implementations report their
//! observable state through the properties trait and the checker decides.

pub mod counterexample;
pub mod invariants;
pub mod property;

pub use counterexample::{Actor, ActorAction, Counterexample, StateSnapshot};
pub use invariants::{RingBufferProperties, RingBufferPropertyChecker, RingIndices};
pub use property::{PropertyChecker, PropertyResult};
