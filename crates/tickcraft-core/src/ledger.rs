//! The shared resource inventory.
//!
//! The ledger maps each [`ItemType`] to a non-negative count. Absent keys read
//! as zero, and an entry that drops to zero is removed, so two ledgers holding
//! the same counts always compare equal regardless of how they got there.

use crate::error::InvariantViolation;
use crate::item::ItemType;
use crate::recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ItemType, u32>", into = "BTreeMap<ItemType, u32>")]
pub struct Ledger {
    counts: BTreeMap<ItemType, u32>,
}

impl From<BTreeMap<ItemType, u32>> for Ledger {
    fn from(mut counts: BTreeMap<ItemType, u32>) -> Self {
        counts.retain(|_, count| *count > 0);
        Self { counts }
    }
}

impl From<Ledger> for BTreeMap<ItemType, u32> {
    fn from(ledger: Ledger) -> Self {
        ledger.counts
    }
}

impl FromIterator<(ItemType, u32)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (ItemType, u32)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (item, count) in iter {
            *counts.entry(item).or_insert(0) += count;
        }
        Self::from(counts)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count of `item`. Absent items count as zero.
    pub fn get(&self, item: ItemType) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    /// Whether at least one `item` is held.
    pub fn has(&self, item: ItemType) -> bool {
        self.get(item) > 0
    }

    /// Credit `quantity` units of `item`.
    pub fn add(&mut self, item: ItemType, quantity: u32) -> Result<(), InvariantViolation> {
        if quantity == 0 {
            return Err(InvariantViolation::ZeroQuantity { item });
        }
        let current = self.get(item);
        let updated = current
            .checked_add(quantity)
            .ok_or(InvariantViolation::Overflow { item })?;
        self.counts.insert(item, updated);
        Ok(())
    }

    /// Debit `quantity` units of `item`. Fails without touching the ledger if
    /// fewer than `quantity` are held.
    pub fn sub(&mut self, item: ItemType, quantity: u32) -> Result<(), InvariantViolation> {
        if quantity == 0 {
            return Err(InvariantViolation::ZeroQuantity { item });
        }
        let available = self.get(item);
        if available < quantity {
            return Err(InvariantViolation::Underflow {
                item,
                requested: quantity,
                available,
            });
        }
        if available == quantity {
            self.counts.remove(&item);
        } else {
            self.counts.insert(item, available - quantity);
        }
        Ok(())
    }

    /// True iff every input of `recipe` is held in at least the required amount.
    pub fn has_recipe(&self, recipe: &Recipe) -> bool {
        recipe
            .inputs()
            .all(|(item, quantity)| self.get(item) >= quantity)
    }

    /// Debit every input of `recipe`.
    ///
    /// All inputs are checked before any is removed, so on error the ledger is
    /// unchanged.
    pub fn sub_recipe(&mut self, recipe: &Recipe) -> Result<(), InvariantViolation> {
        if let Some((item, quantity)) = recipe
            .inputs()
            .find(|(item, quantity)| self.get(*item) < *quantity)
        {
            return Err(InvariantViolation::Underflow {
                item,
                requested: quantity,
                available: self.get(item),
            });
        }
        for (item, quantity) in recipe.inputs() {
            self.sub(item, quantity)?;
        }
        Ok(())
    }

    /// Held items in item order. Never yields a zero count.
    pub fn iter(&self) -> impl Iterator<Item = (ItemType, u32)> + '_ {
        self.counts.iter().map(|(item, count)| (*item, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total units across all item types.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }
}
