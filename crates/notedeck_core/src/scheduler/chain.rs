//! Continuation chain and tick-driven scheduler.
//!
//! # Responsibility
//! - Sequence multi-step mutations as chains of synchronous steps.
//! - Run exactly one step per host tick, in submission order.
//!
//! # Invariants
//! - At most one chain is active; queued chains wait until it settles, so
//!   steps of different chains never interleave.
//! - The first failing step skips the rest and settles the chain with `Err`.
//! - Every submitted chain settles exactly once; there is no cancellation.

use log::debug;
use std::collections::VecDeque;
use std::fmt::Display;

/// One unit of work; runs synchronously against the host context.
pub type Step<C, E> = Box<dyn FnOnce(&mut C) -> Result<(), E>>;

/// Settlement continuation; receives `Err` from the first failing step.
pub type Settle<C, E> = Box<dyn FnOnce(&mut C, Result<(), E>)>;

/// Ordered list of steps with one settlement continuation.
pub struct Chain<C, E> {
    label: String,
    steps: VecDeque<Step<C, E>>,
    settle: Option<Settle<C, E>>,
    completed_steps: usize,
}

impl<C, E> Chain<C, E> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            steps: VecDeque::new(),
            settle: None,
            completed_steps: 0,
        }
    }

    /// Appends one step. Bound arguments travel inside the closure.
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: FnOnce(&mut C) -> Result<(), E> + 'static,
    {
        self.steps.push_back(Box::new(step));
        self
    }

    /// Sets the continuation invoked once the chain succeeds or fails.
    pub fn on_settled<F>(mut self, settle: F) -> Self
    where
        F: FnOnce(&mut C, Result<(), E>) + 'static,
    {
        self.settle = Some(Box::new(settle));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of steps that have not run yet.
    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }

    fn finish(mut self, ctx: &mut C, outcome: Result<(), E>)
    where
        E: Display,
    {
        match &outcome {
            Ok(()) => debug!(
                "event=chain_settled module=scheduler status=ok label={} steps={}",
                self.label, self.completed_steps
            ),
            Err(err) => debug!(
                "event=chain_settled module=scheduler status=error label={} failed_step={} error={}",
                self.label,
                self.completed_steps + 1,
                err
            ),
        }
        if let Some(settle) = self.settle.take() {
            settle(ctx, outcome);
        }
    }
}

/// FIFO queue of chains plus the chain currently being stepped.
pub struct Scheduler<C, E> {
    active: Option<Chain<C, E>>,
    queued: VecDeque<Chain<C, E>>,
    ticks: u64,
}

impl<C, E> Default for Scheduler<C, E> {
    fn default() -> Self {
        Self {
            active: None,
            queued: VecDeque::new(),
            ticks: 0,
        }
    }
}

impl<C, E> Scheduler<C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a chain; its first step runs on a later tick, never inline.
    pub fn submit(&mut self, chain: Chain<C, E>) {
        debug!(
            "event=chain_submitted module=scheduler status=ok label={} steps={} queued={}",
            chain.label(),
            chain.remaining_steps(),
            self.queued.len()
        );
        self.queued.push_back(chain);
    }

    /// Number of chains not yet settled, including the active one.
    pub fn pending(&self) -> usize {
        self.queued.len() + usize::from(self.active.is_some())
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Ticks that ran a step since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn take_chain(&mut self) -> Option<Chain<C, E>> {
        let chain = self.active.take().or_else(|| self.queued.pop_front())?;
        self.ticks += 1;
        Some(chain)
    }

    fn resume(&mut self, chain: Chain<C, E>) {
        self.active = Some(chain);
    }
}

/// Context that owns a scheduler and lends itself to every step.
pub trait HostLoop: Sized {
    type Error: Display;

    fn scheduler(&mut self) -> &mut Scheduler<Self, Self::Error>;
}

/// Runs one step of the active (or next queued) chain.
///
/// Returns `false` when nothing was pending.
pub fn tick<H: HostLoop>(host: &mut H) -> bool {
    let Some(mut chain) = host.scheduler().take_chain() else {
        return false;
    };

    let Some(step) = chain.steps.pop_front() else {
        chain.finish(host, Ok(()));
        return true;
    };

    match step(host) {
        Ok(()) => {
            chain.completed_steps += 1;
            if chain.steps.is_empty() {
                chain.finish(host, Ok(()));
            } else {
                host.scheduler().resume(chain);
            }
        }
        Err(err) => chain.finish(host, Err(err)),
    }
    true
}

/// Ticks until no chain is pending and returns the number of ticks run.
pub fn run_until_idle<H: HostLoop>(host: &mut H) -> usize {
    let mut count = 0;
    while tick(host) {
        count += 1;
    }
    count
}
