//! Single-threaded continuation chaining for multi-step mutations.
//!
//! # Responsibility
//! - Sequence filesystem mutations as chains of unary steps.
//! - Run exactly one step per host-loop tick, in FIFO chain order.
//!
//! # Invariants
//! - Chains never interleave: a chain runs to completion (or its first
//!   failure) before the next submitted chain starts.
//! - A failing step settles the chain immediately; later steps are dropped.
//! - There is no cancellation once a chain has been submitted.

pub mod chain;

pub use chain::{run_until_idle, tick, Chain, HostLoop, Scheduler};
