//! On-disk game configuration.
//!
//! A config file may set any subset of its sections; whatever is left out
//! falls back to the stock game. In RON:
//!
//! ```ron
//! (
//!     starting_inventory: { Stone: 20, IronPlate: 10 },
//!     tick_rate: (interval_ms: 50),
//! )
//! ```
//!
//! A `recipes` section replaces the stock recipe book as a whole and must
//! still cover every craftable and smeltable item.

use serde::Deserialize;
use tickcraft_core::engine::Engine;
use tickcraft_core::ledger::Ledger;
use tickcraft_core::recipe::{RecipeBook, RecipeError};
use tickcraft_core::sim::TickRate;
use tickcraft_core::state::State;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub recipes: RecipeBook,
    pub starting_inventory: Ledger,
    pub tick_rate: TickRate,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), RecipeError> {
        self.recipes.validate()
    }

    /// Tick zero with the configured starting inventory.
    pub fn initial_state(&self) -> State {
        State::new().with_inventory(self.starting_inventory.clone())
    }

    /// An engine running `state` under this configuration.
    pub fn engine(&self, state: State) -> Result<Engine, RecipeError> {
        Ok(Engine::new(state, self.recipes.clone())?.with_tick_rate(self.tick_rate))
    }
}
