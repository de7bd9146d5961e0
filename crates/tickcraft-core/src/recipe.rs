//! Recipes and the recipe book.
//!
//! A [`Recipe`] lists the inputs consumed to produce one unit of an item. The
//! [`RecipeBook`] is static configuration: it is built once (from defaults or
//! a data file), validated, and only read by the engine afterwards.

use crate::error::InvariantViolation;
use crate::item::{CraftItem, ItemType, SmeltItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// Required input quantities for one unit of output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    inputs: BTreeMap<ItemType, u32>,
}

impl FromIterator<(ItemType, u32)> for Recipe {
    fn from_iter<I: IntoIterator<Item = (ItemType, u32)>>(iter: I) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

impl Recipe {
    /// Inputs in item order.
    pub fn inputs(&self) -> impl Iterator<Item = (ItemType, u32)> + '_ {
        self.inputs.iter().map(|(item, qty)| (*item, *qty))
    }

    /// Required quantity of `item` (zero if not an input).
    pub fn quantity(&self, item: ItemType) -> u32 {
        self.inputs.get(&item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Multiply every input by `count`, for batched actions.
    pub fn scale(&self, count: u32) -> Result<Recipe, InvariantViolation> {
        if count == 0 {
            return Err(InvariantViolation::ZeroCount);
        }
        let mut inputs = BTreeMap::new();
        for (item, qty) in self.inputs() {
            let scaled = qty
                .checked_mul(count)
                .ok_or(InvariantViolation::Overflow { item })?;
            inputs.insert(item, scaled);
        }
        Ok(Recipe { inputs })
    }

    /// This recipe with `quantity` more of `item`, summed into any existing
    /// entry.
    pub fn with_extra(
        &self,
        item: ItemType,
        quantity: u32,
    ) -> Result<Recipe, InvariantViolation> {
        let mut inputs = self.inputs.clone();
        let entry = inputs.entry(item).or_insert(0);
        *entry = entry
            .checked_add(quantity)
            .ok_or(InvariantViolation::Overflow { item })?;
        Ok(Recipe { inputs })
    }
}

// ---------------------------------------------------------------------------
// Recipe book
// ---------------------------------------------------------------------------

/// Problems found when validating a recipe book.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("no recipe for {0}")]
    Missing(ItemType),
    #[error("recipe for {0} has no inputs")]
    Empty(ItemType),
    #[error("recipe for {output} requires zero {input}")]
    ZeroInput { output: ItemType, input: ItemType },
    #[error("{0} is mined and cannot have a recipe")]
    RawItem(ItemType),
    #[error("recipe for {0} consumes its own output")]
    SelfReferential(ItemType),
}

/// Output item -> recipe. Immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeBook {
    recipes: BTreeMap<ItemType, Recipe>,
}

impl Default for RecipeBook {
    fn default() -> Self {
        use ItemType::*;
        Self::from_iter([
            (StoneFurnace, Recipe::from_iter([(Stone, 10)])),
            (
                BurnerMiningDrill,
                Recipe::from_iter([(Stone, 10), (IronPlate, 10)]),
            ),
            (Robot, Recipe::from_iter([(IronPlate, 10)])),
            (IronPlate, Recipe::from_iter([(IronOre, 1), (Coal, 1)])),
            (CopperPlate, Recipe::from_iter([(CopperOre, 1), (Coal, 1)])),
            (
                ElectronicCircuit,
                Recipe::from_iter([(IronPlate, 2), (CopperPlate, 3)]),
            ),
        ])
    }
}

impl FromIterator<(ItemType, Recipe)> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = (ItemType, Recipe)>>(iter: I) -> Self {
        Self {
            recipes: iter.into_iter().collect(),
        }
    }
}

impl RecipeBook {
    /// A book with no recipes. Only useful as a base for [`RecipeBook::insert`].
    pub fn empty() -> Self {
        Self {
            recipes: BTreeMap::new(),
        }
    }

    pub fn get(&self, item: ItemType) -> Option<&Recipe> {
        self.recipes.get(&item)
    }

    /// Replace (or add) the recipe for `item`.
    pub fn insert(&mut self, item: ItemType, recipe: Recipe) {
        self.recipes.insert(item, recipe);
    }

    /// Recipe consumed by a Craft action for `item`.
    pub fn craft(&self, item: CraftItem) -> Result<&Recipe, InvariantViolation> {
        let item = ItemType::from(item);
        self.get(item)
            .ok_or(InvariantViolation::MissingRecipe { item })
    }

    /// Recipe consumed by a Smelt action of `count` units of `item`, scaled.
    pub fn smelt(&self, item: SmeltItem, count: u32) -> Result<Recipe, InvariantViolation> {
        let item = ItemType::from(item);
        self.get(item)
            .ok_or(InvariantViolation::MissingRecipe { item })?
            .scale(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemType, &Recipe)> {
        self.recipes.iter().map(|(item, recipe)| (*item, recipe))
    }

    /// Check that every craftable and smeltable item has a usable recipe and
    /// that no raw resource has one.
    pub fn validate(&self) -> Result<(), RecipeError> {
        for (output, recipe) in self.iter() {
            if output.is_mineable() {
                return Err(RecipeError::RawItem(output));
            }
            if recipe.is_empty() {
                return Err(RecipeError::Empty(output));
            }
            for (input, qty) in recipe.inputs() {
                if qty == 0 {
                    return Err(RecipeError::ZeroInput { output, input });
                }
                if input == output {
                    return Err(RecipeError::SelfReferential(output));
                }
            }
        }
        let required = CraftItem::ALL
            .iter()
            .map(|c| ItemType::from(*c))
            .chain(SmeltItem::ALL.iter().map(|s| ItemType::from(*s)));
        for item in required {
            if self.get(item).is_none() {
                return Err(RecipeError::Missing(item));
            }
        }
        Ok(())
    }
}
