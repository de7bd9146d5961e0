//! Tickcraft Core -- a deterministic, tick-driven production simulation.
//!
//! A single [`state::State`] holds a ledger of item counts, a FIFO queue of
//! player actions and a set of robots that choose their own actions from
//! condition/action rule lists. Everything advances one discrete step per
//! tick; nothing happens between ticks.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::tick`] (or [`engine::Engine::step`]) runs:
//!
//! 1. **Bookkeeping** -- Increment the tick counter.
//! 2. **Queue** -- Advance the head of the action queue; remove it once done.
//! 3. **Robots** -- In id order, each idle robot adopts the first rule whose
//!    condition holds, then every robot advances its action.
//!
//! A tick either commits completely or not at all:
//!
//! ```rust,ignore
//! let (next, report) = engine::tick(&state, &recipes)?;
//! ```
//!
//! # Key Types
//!
//! - [`ledger::Ledger`] -- Non-negative item counts; every debit is checked.
//! - [`action::Action`] -- Mine, Craft and Smelt with their progress state
//!   machine.
//! - [`condition::Condition`] -- Comparison of two ledger-derived values.
//! - [`robot::Robot`] -- Rule list plus at most one running action.
//! - [`recipe::RecipeBook`] -- Immutable input requirements per item.
//! - [`event::TickReport`] -- What happened during one tick.
//! - [`serialize`] -- Versioned JSON snapshots with validation on load.

pub mod action;
pub mod condition;
pub mod engine;
pub mod error;
pub mod event;
pub mod item;
pub mod ledger;
pub mod queue;
pub mod recipe;
pub mod robot;
pub mod serialize;
pub mod sim;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
