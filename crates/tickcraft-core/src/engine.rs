//! The tick pipeline and the engine that drives it.
//!
//! # Pipeline
//!
//! Each tick runs, in order:
//! 1. **Bookkeeping** -- increment the tick counter.
//! 2. **Queue** -- advance the head of the action queue.
//! 3. **Robots** -- advance every robot in id order, selecting a rule first
//!    for any robot that is idle.
//!
//! Later phases see the ledger as left by earlier ones, and each robot sees
//! the effects of the robots before it.
//!
//! # Atomicity
//!
//! [`tick`] never mutates its input. It works on a copy and hands the copy
//! back only if every phase succeeded; on an [`InvariantViolation`] the copy
//! is dropped, so a failed tick leaves no trace.

use crate::error::InvariantViolation;
use crate::event::TickReport;
use crate::recipe::{RecipeBook, RecipeError};
use crate::robot::tick_robots;
use crate::sim::{AdvanceResult, TickRate};
use crate::state::State;
use std::time::Duration;
use tracing::{trace, warn};

/// A tick was aborted. The state it started from is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tick {tick} aborted: {source}")]
pub struct TickError {
    /// The tick number that was being computed.
    pub tick: u64,
    pub source: InvariantViolation,
}

// ---------------------------------------------------------------------------
// Pure tick
// ---------------------------------------------------------------------------

/// Compute the state one tick after `state`.
pub fn tick(state: &State, recipes: &RecipeBook) -> Result<(State, TickReport), TickError> {
    let mut next = state.clone();
    let report = tick_in_place(&mut next, recipes).map_err(|source| {
        let tick = state.tick.saturating_add(1);
        warn!(tick, %source, "Tick aborted");
        TickError { tick, source }
    })?;
    Ok((next, report))
}

/// Run every phase on `state` directly. Leaves `state` half-updated on error,
/// which is why only [`tick`] calls it.
fn tick_in_place(state: &mut State, recipes: &RecipeBook) -> Result<TickReport, InvariantViolation> {
    state.tick = state.tick.saturating_add(1);
    let mut report = TickReport::new(state.tick);

    let State {
        inventory,
        queue,
        robots,
        ..
    } = state;
    queue.process(inventory, recipes, &mut report)?;
    tick_robots(robots, inventory, recipes, &mut report)?;

    trace!(tick = report.tick, events = report.events.len(), "Tick complete");
    Ok(report)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns a [`State`] together with the static configuration it runs under,
/// and paces ticks against wall-clock time.
#[derive(Debug, Clone)]
pub struct Engine {
    state: State,
    recipes: RecipeBook,
    rate: TickRate,
    fast: bool,
    paused: bool,
    /// Wall time not yet spent on a tick.
    accumulator: Duration,
}

impl Engine {
    /// Create an engine. The recipe book is validated once here and never
    /// changes afterwards.
    pub fn new(state: State, recipes: RecipeBook) -> Result<Self, RecipeError> {
        recipes.validate()?;
        Ok(Self {
            state,
            recipes,
            rate: TickRate::default(),
            fast: false,
            paused: false,
            accumulator: Duration::ZERO,
        })
    }

    pub fn with_tick_rate(mut self, rate: TickRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Access for the external commands on [`State`] (enqueue, robots, ...).
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    pub fn tick_rate(&self) -> TickRate {
        self.rate
    }

    /// Current interval between ticks, given the speed setting.
    pub fn interval(&self) -> Duration {
        self.rate.interval(self.fast)
    }

    pub fn set_fast(&mut self, fast: bool) {
        self.fast = fast;
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    /// Run exactly one tick, even while paused. Commits only on success.
    pub fn step(&mut self) -> Result<TickReport, TickError> {
        let (next, report) = tick(&self.state, &self.recipes)?;
        self.state = next;
        Ok(report)
    }

    /// Run `n` ticks, stopping at the first failure.
    pub fn run(&mut self, n: u64) -> Result<AdvanceResult, TickError> {
        let mut result = AdvanceResult::default();
        for _ in 0..n {
            result.reports.push(self.step()?);
            result.steps_run += 1;
        }
        Ok(result)
    }

    /// Feed `elapsed` wall time in and run as many ticks as fit, carrying the
    /// remainder to the next call. Does nothing while paused.
    ///
    /// Ticks that completed before a failure stay committed.
    pub fn advance(&mut self, elapsed: Duration) -> Result<AdvanceResult, TickError> {
        let mut result = AdvanceResult::default();
        if self.paused {
            return Ok(result);
        }
        let interval = self.interval();
        self.accumulator += elapsed;
        while self.accumulator >= interval {
            self.accumulator -= interval;
            result.reports.push(self.step()?);
            result.steps_run += 1;
        }
        Ok(result)
    }
}
