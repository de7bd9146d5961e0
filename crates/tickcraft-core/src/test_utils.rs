//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, in the
//! integration tests under `tests/`.

use crate::action::Action;
use crate::condition::{Condition, Operator, Value};
use crate::engine::Engine;
use crate::event::TickReport;
use crate::item::ItemType;
use crate::ledger::Ledger;
use crate::recipe::RecipeBook;
use crate::robot::{RobotId, Rule};
use crate::state::State;

// ===========================================================================
// Ledgers and states
// ===========================================================================

pub fn ledger_with(items: &[(ItemType, u32)]) -> Ledger {
    items.iter().copied().collect()
}

pub fn state_with(items: &[(ItemType, u32)]) -> State {
    State::new().with_inventory(ledger_with(items))
}

/// Engine over the stock recipe book.
pub fn engine_with(state: State) -> Engine {
    Engine::new(state, RecipeBook::default()).expect("stock recipes are valid")
}

// ===========================================================================
// Conditions and rules
// ===========================================================================

/// A condition that always holds.
pub fn always() -> Condition {
    Condition::new(Value::constant(0), Operator::Eq, Value::constant(0))
}

/// A condition that never holds.
pub fn never() -> Condition {
    Condition::new(Value::constant(0), Operator::Gt, Value::constant(1))
}

/// `item <operator> constant`.
pub fn when(item: ItemType, operator: Operator, constant: i64) -> Condition {
    Condition::new(Value::item(item), operator, Value::constant(constant))
}

pub fn rule(condition: Condition, action: Action) -> Rule {
    Rule::new(condition, action)
}

/// Add a robot, first crediting the `Robot` item it costs.
pub fn add_robot(state: &mut State, name: &str, algorithm: Vec<Rule>) -> RobotId {
    state
        .inventory
        .add(ItemType::Robot, 1)
        .expect("robot stock overflow");
    state.add_robot(name, algorithm).expect("add robot")
}

// ===========================================================================
// Running
// ===========================================================================

/// Run `n` ticks with the stock recipes, panicking on any violation.
pub fn run_ticks(state: &State, n: u64) -> (State, Vec<TickReport>) {
    let mut engine = engine_with(state.clone());
    let result = engine.run(n).expect("tick aborted");
    (engine.into_state(), result.reports)
}

pub fn count(state: &State, item: ItemType) -> u32 {
    state.inventory().get(item)
}
