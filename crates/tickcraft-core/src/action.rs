//! Actions: units of in-progress work and their per-tick state machine.
//!
//! Every action carries a `progress` counter that moves from 0 to its
//! target one step per active tick. Craft and Smelt reserve all the inputs
//! they need on their first step; once started they run to completion
//! without looking at the ledger's stock again.

use crate::error::InvariantViolation;
use crate::item::{CraftItem, ItemParseError, ItemType, MineItem, SmeltItem};
use crate::ledger::Ledger;
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress steps to mine one unit.
pub const MINE_STEPS_PER_UNIT: u32 = 10;
/// Progress steps to craft one unit.
pub const CRAFT_STEPS: u32 = 20;
/// Progress steps to smelt one unit.
pub const SMELT_STEPS_PER_UNIT: u32 = 20;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum Action {
    /// Produces one `item` every [`MINE_STEPS_PER_UNIT`] steps.
    Mine {
        item: MineItem,
        count: u32,
        progress: u32,
    },
    /// Consumes the item's recipe on the first step and produces one unit
    /// after [`CRAFT_STEPS`]. `count` is always 1.
    Craft {
        item: CraftItem,
        count: u32,
        progress: u32,
    },
    /// Consumes `count` recipes plus one stone furnace on the first step,
    /// produces one unit every [`SMELT_STEPS_PER_UNIT`] steps and returns the
    /// furnace at the end.
    Smelt {
        item: SmeltItem,
        count: u32,
        progress: u32,
    },
}

/// Discriminant of [`Action`], for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Mine,
    Craft,
    Smelt,
}

impl Action {
    pub fn mine(item: MineItem, count: u32) -> Self {
        Action::Mine {
            item,
            count,
            progress: 0,
        }
    }

    pub fn craft(item: CraftItem) -> Self {
        Action::Craft {
            item,
            count: 1,
            progress: 0,
        }
    }

    pub fn smelt(item: SmeltItem, count: u32) -> Self {
        Action::Smelt {
            item,
            count,
            progress: 0,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Mine { .. } => ActionKind::Mine,
            Action::Craft { .. } => ActionKind::Craft,
            Action::Smelt { .. } => ActionKind::Smelt,
        }
    }

    /// The item this action produces.
    pub fn item(&self) -> ItemType {
        match *self {
            Action::Mine { item, .. } => item.into(),
            Action::Craft { item, .. } => item.into(),
            Action::Smelt { item, .. } => item.into(),
        }
    }

    pub fn count(&self) -> u32 {
        match *self {
            Action::Mine { count, .. }
            | Action::Craft { count, .. }
            | Action::Smelt { count, .. } => count,
        }
    }

    pub fn progress(&self) -> u32 {
        match *self {
            Action::Mine { progress, .. }
            | Action::Craft { progress, .. }
            | Action::Smelt { progress, .. } => progress,
        }
    }

    fn progress_mut(&mut self) -> &mut u32 {
        match self {
            Action::Mine { progress, .. }
            | Action::Craft { progress, .. }
            | Action::Smelt { progress, .. } => progress,
        }
    }

    /// Steps between successive units of output.
    fn steps_per_unit(&self) -> u32 {
        match self {
            Action::Mine { .. } => MINE_STEPS_PER_UNIT,
            Action::Craft { .. } => CRAFT_STEPS,
            Action::Smelt { .. } => SMELT_STEPS_PER_UNIT,
        }
    }

    /// Progress value at which the action completes. Saturates for counts
    /// that [`Action::validate`] rejects.
    pub fn target(&self) -> u32 {
        match self {
            Action::Mine { count, .. } => count.saturating_mul(MINE_STEPS_PER_UNIT),
            Action::Craft { .. } => CRAFT_STEPS,
            Action::Smelt { count, .. } => count.saturating_mul(SMELT_STEPS_PER_UNIT),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress() == self.target()
    }

    /// A fresh copy with progress reset, used when a robot adopts a template.
    pub fn instantiate(&self) -> Action {
        let mut action = self.clone();
        *action.progress_mut() = 0;
        action
    }

    /// Check count and progress bounds.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let count = self.count();
        if count == 0 {
            return Err(InvariantViolation::ZeroCount);
        }
        if let Action::Craft { count, .. } = *self
            && count != 1
        {
            return Err(InvariantViolation::CraftCount { count });
        }
        let target = count
            .checked_mul(self.steps_per_unit())
            .ok_or(InvariantViolation::Overflow { item: self.item() })?;
        let progress = self.progress();
        if progress > target {
            return Err(InvariantViolation::ProgressOutOfRange { progress, target });
        }
        Ok(())
    }

    /// Advance by one step against the ledger.
    ///
    /// Returns [`ActionStatus::Blocked`] without touching the action or the
    /// ledger when a Craft/Smelt cannot afford its inputs on its first step.
    pub fn advance(
        &mut self,
        ledger: &mut Ledger,
        recipes: &RecipeBook,
    ) -> Result<ActionOutcome, InvariantViolation> {
        self.validate()?;
        let target = self.target();
        let progress = self.progress();
        if progress >= target {
            return Err(InvariantViolation::ProgressOutOfRange { progress, target });
        }

        let mut outcome = ActionOutcome::default();
        if progress == 0 {
            match self.reserve(ledger, recipes)? {
                Some(consumed) => {
                    outcome.started = true;
                    outcome.consumed = consumed;
                }
                None => {
                    outcome.status = ActionStatus::Blocked;
                    return Ok(outcome);
                }
            }
        }

        let progress = progress + 1;
        *self.progress_mut() = progress;

        if progress % self.steps_per_unit() == 0 {
            let item = self.item();
            ledger.add(item, 1)?;
            outcome.produced.push((item, 1));
        }

        if progress == target {
            if let Action::Smelt { .. } = self {
                ledger.add(ItemType::StoneFurnace, 1)?;
                outcome.produced.push((ItemType::StoneFurnace, 1));
            }
            outcome.status = ActionStatus::Completed;
        } else {
            outcome.status = ActionStatus::Advanced;
        }
        Ok(outcome)
    }

    /// Debit everything the action needs for its whole run. `Ok(None)` means
    /// the ledger cannot afford it yet.
    fn reserve(
        &self,
        ledger: &mut Ledger,
        recipes: &RecipeBook,
    ) -> Result<Option<Vec<(ItemType, u32)>>, InvariantViolation> {
        match *self {
            Action::Mine { .. } => Ok(Some(Vec::new())),
            Action::Craft { item, .. } => {
                let recipe = recipes.craft(item)?;
                if !ledger.has_recipe(recipe) {
                    return Ok(None);
                }
                ledger.sub_recipe(recipe)?;
                Ok(Some(recipe.inputs().collect()))
            }
            Action::Smelt { item, count, .. } => {
                // The furnace is held for the whole run on top of the inputs.
                let needed = recipes
                    .smelt(item, count)?
                    .with_extra(ItemType::StoneFurnace, 1)?;
                if !ledger.has_recipe(&needed) {
                    return Ok(None);
                }
                ledger.sub_recipe(&needed)?;
                Ok(Some(needed.inputs().collect()))
            }
        }
    }
}

impl fmt::Display for Action {
    /// `Mine Coal`, `Mine Coal (3)`, `Craft Robot`, `Smelt IronPlate (2)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Mine { item, count, .. } => write_label(f, "Mine", *item, *count),
            Action::Craft { item, .. } => write!(f, "Craft {item}"),
            Action::Smelt { item, count, .. } => write_label(f, "Smelt", *item, *count),
        }
    }
}

fn write_label(
    f: &mut fmt::Formatter<'_>,
    verb: &str,
    item: impl fmt::Display,
    count: u32,
) -> fmt::Result {
    if count == 1 {
        write!(f, "{verb} {item}")
    } else {
        write!(f, "{verb} {item} ({count})")
    }
}

/// Why a label could not be parsed back into an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("action is empty")]
    Empty,
    #[error("unknown action verb '{0}' (expected Mine, Craft or Smelt)")]
    UnknownVerb(String),
    #[error("invalid count '{0}'")]
    BadCount(String),
    #[error(transparent)]
    Item(#[from] ItemParseError),
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// Parses the labels produced by `Display`. The count suffix is optional
    /// and defaults to 1; it is not range-checked here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        if verb.is_empty() {
            return Err(ActionParseError::Empty);
        }
        let rest = rest.trim();
        let (item, count) = match rest.strip_suffix(')').and_then(|r| r.rsplit_once('(')) {
            Some((item, count)) => {
                let count = count
                    .trim()
                    .parse()
                    .map_err(|_| ActionParseError::BadCount(count.trim().to_string()))?;
                (item.trim(), count)
            }
            None => (rest, 1),
        };

        let action = if verb.eq_ignore_ascii_case("mine") {
            Action::mine(item.parse()?, count)
        } else if verb.eq_ignore_ascii_case("craft") {
            Action::Craft {
                item: item.parse()?,
                count,
                progress: 0,
            }
        } else if verb.eq_ignore_ascii_case("smelt") {
            Action::smelt(item.parse()?, count)
        } else {
            return Err(ActionParseError::UnknownVerb(verb.to_string()));
        };
        Ok(action)
    }
}

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionStatus {
    /// Waiting for inputs; progress did not move.
    Blocked,
    #[default]
    Advanced,
    /// Progress reached the target on this step.
    Completed,
}

/// What a single [`Action::advance`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub status: ActionStatus,
    /// True on the step that moved progress off zero.
    pub started: bool,
    pub consumed: Vec<(ItemType, u32)>,
    pub produced: Vec<(ItemType, u32)>,
}

impl ActionOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == ActionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Recipe;

    fn run(action: &mut Action, ledger: &mut Ledger, steps: u32) -> Vec<ActionOutcome> {
        let recipes = RecipeBook::default();
        (0..steps)
            .map(|_| action.advance(ledger, &recipes).unwrap())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mine
    // -----------------------------------------------------------------------

    #[test]
    fn mine_produces_every_ten_steps() {
        let mut ledger = Ledger::new();
        let mut action = Action::mine(MineItem::Stone, 2);

        let outcomes = run(&mut action, &mut ledger, 9);
        assert!(outcomes.iter().all(|o| o.produced.is_empty()));
        assert!(outcomes[0].started);

        let tenth = run(&mut action, &mut ledger, 1).remove(0);
        assert_eq!(tenth.produced, vec![(ItemType::Stone, 1)]);
        assert_eq!(tenth.status, ActionStatus::Advanced);

        let outcomes = run(&mut action, &mut ledger, 10);
        assert!(outcomes.last().unwrap().is_complete());
        assert_eq!(ledger.get(ItemType::Stone), 2);
        assert!(action.is_complete());
    }

    #[test]
    fn advancing_a_finished_action_is_a_violation() {
        let mut ledger = Ledger::new();
        let mut action = Action::mine(MineItem::Coal, 1);
        run(&mut action, &mut ledger, 10);
        let err = action
            .advance(&mut ledger, &RecipeBook::default())
            .unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::ProgressOutOfRange {
                progress: 10,
                target: 10
            }
        );
    }

    // -----------------------------------------------------------------------
    // Craft
    // -----------------------------------------------------------------------

    #[test]
    fn craft_waits_until_affordable() {
        let mut ledger = Ledger::from_iter([(ItemType::Stone, 9)]);
        let mut action = Action::craft(CraftItem::StoneFurnace);

        let outcome = run(&mut action, &mut ledger, 1).remove(0);
        assert_eq!(outcome.status, ActionStatus::Blocked);
        assert_eq!(action.progress(), 0);
        assert_eq!(ledger.get(ItemType::Stone), 9);

        ledger.add(ItemType::Stone, 1).unwrap();
        let outcome = run(&mut action, &mut ledger, 1).remove(0);
        assert!(outcome.started);
        assert_eq!(outcome.consumed, vec![(ItemType::Stone, 10)]);
        assert_eq!(ledger.get(ItemType::Stone), 0);
        assert_eq!(action.progress(), 1);
    }

    #[test]
    fn craft_produces_after_twenty_steps() {
        let mut ledger = Ledger::from_iter([(ItemType::IronPlate, 10)]);
        let mut action = Action::craft(CraftItem::Robot);

        let outcomes = run(&mut action, &mut ledger, CRAFT_STEPS);
        assert!(outcomes[..19].iter().all(|o| o.produced.is_empty()));
        assert!(outcomes[19].is_complete());
        assert_eq!(ledger.get(ItemType::Robot), 1);
        assert_eq!(ledger.get(ItemType::IronPlate), 0);
    }

    #[test]
    fn craft_does_not_recheck_stock_once_started() {
        let mut ledger = Ledger::from_iter([(ItemType::Stone, 10)]);
        let mut action = Action::craft(CraftItem::StoneFurnace);
        run(&mut action, &mut ledger, 1);
        // Stock is gone, but the inputs were reserved on the first step.
        assert!(ledger.is_empty());
        let outcomes = run(&mut action, &mut ledger, CRAFT_STEPS - 1);
        assert!(outcomes.iter().all(|o| o.status != ActionStatus::Blocked));
        assert_eq!(ledger.get(ItemType::StoneFurnace), 1);
    }

    #[test]
    fn craft_count_other_than_one_is_a_violation() {
        let mut action = Action::Craft {
            item: CraftItem::Robot,
            count: 2,
            progress: 0,
        };
        let mut ledger = Ledger::from_iter([(ItemType::IronPlate, 100)]);
        assert_eq!(
            action.advance(&mut ledger, &RecipeBook::default()),
            Err(InvariantViolation::CraftCount { count: 2 })
        );
        assert_eq!(ledger.get(ItemType::IronPlate), 100);
    }

    // -----------------------------------------------------------------------
    // Smelt
    // -----------------------------------------------------------------------

    #[test]
    fn smelt_batch_reserves_once_and_returns_furnace() {
        let mut ledger = Ledger::from_iter([
            (ItemType::IronOre, 2),
            (ItemType::Coal, 2),
            (ItemType::StoneFurnace, 1),
        ]);
        let mut action = Action::smelt(SmeltItem::IronPlate, 2);

        let first = run(&mut action, &mut ledger, 1).remove(0);
        assert_eq!(
            first.consumed,
            vec![
                (ItemType::Coal, 2),
                (ItemType::StoneFurnace, 1),
                (ItemType::IronOre, 2)
            ]
        );
        assert!(!ledger.has(ItemType::StoneFurnace));

        let outcomes = run(&mut action, &mut ledger, 39);
        assert_eq!(outcomes[18].produced, vec![(ItemType::IronPlate, 1)]);
        let last = outcomes.last().unwrap();
        assert!(last.is_complete());
        assert_eq!(
            last.produced,
            vec![(ItemType::IronPlate, 1), (ItemType::StoneFurnace, 1)]
        );
        assert_eq!(ledger.get(ItemType::IronPlate), 2);
        assert_eq!(ledger.get(ItemType::StoneFurnace), 1);
        assert_eq!(ledger.get(ItemType::IronOre), 0);
    }

    #[test]
    fn smelt_requires_a_furnace() {
        let mut ledger = Ledger::from_iter([(ItemType::CopperOre, 1), (ItemType::Coal, 1)]);
        let mut action = Action::smelt(SmeltItem::CopperPlate, 1);
        let outcome = run(&mut action, &mut ledger, 1).remove(0);
        assert_eq!(outcome.status, ActionStatus::Blocked);
        assert_eq!(ledger.get(ItemType::CopperOre), 1);
    }

    #[test]
    fn furnace_used_as_an_input_needs_a_second_furnace() {
        let mut recipes = RecipeBook::default();
        recipes.insert(
            ItemType::IronPlate,
            Recipe::from_iter([(ItemType::IronOre, 1), (ItemType::StoneFurnace, 1)]),
        );
        recipes.validate().unwrap();

        let mut ledger = Ledger::from_iter([(ItemType::IronOre, 1), (ItemType::StoneFurnace, 1)]);
        let mut action = Action::smelt(SmeltItem::IronPlate, 1);
        let outcome = action.advance(&mut ledger, &recipes).unwrap();
        assert_eq!(outcome.status, ActionStatus::Blocked);
        assert_eq!(action.progress(), 0);
        assert_eq!(ledger.get(ItemType::StoneFurnace), 1);

        ledger.add(ItemType::StoneFurnace, 1).unwrap();
        let outcome = action.advance(&mut ledger, &recipes).unwrap();
        assert!(outcome.started);
        assert_eq!(
            outcome.consumed,
            vec![(ItemType::StoneFurnace, 2), (ItemType::IronOre, 1)]
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn smelt_requires_the_whole_batch() {
        let mut ledger = Ledger::from_iter([
            (ItemType::IronOre, 2),
            (ItemType::Coal, 2),
            (ItemType::StoneFurnace, 1),
        ]);
        let mut action = Action::smelt(SmeltItem::IronPlate, 3);
        let outcome = run(&mut action, &mut ledger, 1).remove(0);
        assert_eq!(outcome.status, ActionStatus::Blocked);
        assert_eq!(ledger.get(ItemType::IronOre), 2);
    }

    // -----------------------------------------------------------------------
    // Labels, templates, validation
    // -----------------------------------------------------------------------

    #[test]
    fn labels() {
        assert_eq!(Action::mine(MineItem::Coal, 1).to_string(), "Mine Coal");
        assert_eq!(Action::mine(MineItem::Coal, 3).to_string(), "Mine Coal (3)");
        assert_eq!(Action::craft(CraftItem::Robot).to_string(), "Craft Robot");
        assert_eq!(
            Action::smelt(SmeltItem::IronPlate, 2).to_string(),
            "Smelt IronPlate (2)"
        );
    }

    #[test]
    fn targets() {
        assert_eq!(Action::mine(MineItem::Coal, 3).target(), 30);
        assert_eq!(Action::craft(CraftItem::Robot).target(), 20);
        assert_eq!(Action::smelt(SmeltItem::CopperPlate, 4).target(), 80);
    }

    #[test]
    fn instantiate_resets_progress_without_aliasing() {
        let template = Action::Mine {
            item: MineItem::Coal,
            count: 2,
            progress: 7,
        };
        let mut live = template.instantiate();
        assert_eq!(live.progress(), 0);
        run(&mut live, &mut Ledger::new(), 3);
        assert_eq!(live.progress(), 3);
        assert_eq!(template.progress(), 7);
    }

    #[test]
    fn validate_rejects_bad_actions() {
        assert_eq!(
            Action::mine(MineItem::Coal, 0).validate(),
            Err(InvariantViolation::ZeroCount)
        );
        assert_eq!(
            Action::Mine {
                item: MineItem::Coal,
                count: 1,
                progress: 11
            }
            .validate(),
            Err(InvariantViolation::ProgressOutOfRange {
                progress: 11,
                target: 10
            })
        );
        assert_eq!(
            Action::smelt(SmeltItem::IronPlate, u32::MAX).validate(),
            Err(InvariantViolation::Overflow {
                item: ItemType::IronPlate
            })
        );
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(Action::smelt(SmeltItem::IronPlate, 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Smelt", "item": "IronPlate", "count": 2, "progress": 0})
        );
        let bad = serde_json::from_value::<Action>(
            serde_json::json!({"type": "Mine", "item": "IronPlate", "count": 1, "progress": 0}),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn labels_parse_back() {
        for action in [
            Action::mine(MineItem::Coal, 1),
            Action::mine(MineItem::Stone, 3),
            Action::craft(CraftItem::Robot),
            Action::smelt(SmeltItem::CopperPlate, 2),
        ] {
            assert_eq!(action.to_string().parse::<Action>(), Ok(action));
        }
        assert_eq!(
            "smelt ironplate ( 4 )".parse::<Action>(),
            Ok(Action::smelt(SmeltItem::IronPlate, 4))
        );
    }

    #[test]
    fn bad_labels_are_rejected() {
        assert_eq!("".parse::<Action>(), Err(ActionParseError::Empty));
        assert!(matches!(
            "Dig Coal".parse::<Action>(),
            Err(ActionParseError::UnknownVerb(_))
        ));
        assert!(matches!(
            "Mine Coal (x)".parse::<Action>(),
            Err(ActionParseError::BadCount(_))
        ));
        assert!(matches!(
            "Mine IronPlate".parse::<Action>(),
            Err(ActionParseError::Item(ItemParseError::WrongCategory { .. }))
        ));
    }
}
