//! The player's action queue.
//!
//! Strictly FIFO with a single active item: only the head advances, and a
//! head that cannot afford its inputs blocks everything behind it until the
//! ledger catches up.

use crate::action::Action;
use crate::error::InvariantViolation;
use crate::event::{Actor, TickReport};
use crate::ledger::Ledger;
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where an enqueued action ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Appended as a new entry at this index.
    Appended(usize),
    /// Folded into the existing Mine entry at this index.
    Merged(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionQueue {
    actions: Vec<Action>,
}

impl FromIterator<Action> for ActionQueue {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action`. A Mine of the same item as a Mine already at the tail
    /// extends that entry's count instead of adding a new one.
    pub fn enqueue(&mut self, action: Action) -> Enqueued {
        if let Action::Mine { item, count, .. } = action
            && let Some(Action::Mine {
                item: tail_item,
                count: tail_count,
                ..
            }) = self.actions.last_mut()
            && *tail_item == item
            && let Some(merged) = tail_count.checked_add(count)
        {
            *tail_count = merged;
            return Enqueued::Merged(self.actions.len() - 1);
        }
        self.actions.push(action);
        Enqueued::Appended(self.actions.len() - 1)
    }

    /// Remove the entry at `index`, if any. Removing an in-progress head
    /// discards whatever it had already reserved.
    pub fn remove(&mut self, index: usize) -> Option<Action> {
        (index < self.actions.len()).then(|| self.actions.remove(index))
    }

    pub fn head(&self) -> Option<&Action> {
        self.actions.first()
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Advance the head by one step, dropping it once it completes.
    pub fn process(
        &mut self,
        ledger: &mut Ledger,
        recipes: &RecipeBook,
        report: &mut TickReport,
    ) -> Result<(), InvariantViolation> {
        let Some(head) = self.actions.first_mut() else {
            return Ok(());
        };

        let outcome = head.advance(ledger, recipes)?;
        report.record_outcome(Actor::Queue, head.kind(), head.item(), &outcome);

        if outcome.is_complete() {
            let done = self.actions.remove(0);
            debug!(tick = report.tick, action = %done, "Queue action completed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionStatus;
    use crate::item::{CraftItem, ItemType, MineItem};

    fn process(queue: &mut ActionQueue, ledger: &mut Ledger, ticks: u32) {
        let recipes = RecipeBook::default();
        for tick in 0..ticks {
            let mut report = TickReport::new(u64::from(tick) + 1);
            queue.process(ledger, &recipes, &mut report).unwrap();
        }
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let mut queue = ActionQueue::new();
        let mut ledger = Ledger::new();
        process(&mut queue, &mut ledger, 5);
        assert!(ledger.is_empty());
    }

    #[test]
    fn head_is_removed_on_completion() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::mine(MineItem::Coal, 1));
        queue.enqueue(Action::mine(MineItem::Stone, 1));
        let mut ledger = Ledger::new();

        process(&mut queue, &mut ledger, 10);
        assert_eq!(ledger.get(ItemType::Coal), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head(), Some(&Action::mine(MineItem::Stone, 1)));
    }

    #[test]
    fn only_the_head_advances() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::mine(MineItem::Coal, 2));
        queue.enqueue(Action::mine(MineItem::Stone, 1));
        let mut ledger = Ledger::new();
        process(&mut queue, &mut ledger, 5);
        assert_eq!(queue.get(0).unwrap().progress(), 5);
        assert_eq!(queue.get(1).unwrap().progress(), 0);
    }

    #[test]
    fn blocked_head_blocks_the_queue() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::craft(CraftItem::StoneFurnace));
        queue.enqueue(Action::mine(MineItem::Stone, 1));
        let mut ledger = Ledger::from_iter([(ItemType::Stone, 3)]);

        let recipes = RecipeBook::default();
        let mut report = TickReport::new(1);
        queue.process(&mut ledger, &recipes, &mut report).unwrap();
        assert!(matches!(
            report.events.as_slice(),
            [crate::event::TickEvent::ActionBlocked { .. }]
        ));

        process(&mut queue, &mut ledger, 50);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.head().unwrap().progress(), 0);
        assert_eq!(ledger.get(ItemType::Stone), 3);
    }

    #[test]
    fn consecutive_mines_of_the_same_item_merge() {
        let mut queue = ActionQueue::new();
        assert_eq!(queue.enqueue(Action::mine(MineItem::Coal, 1)), Enqueued::Appended(0));
        assert_eq!(queue.enqueue(Action::mine(MineItem::Coal, 2)), Enqueued::Merged(0));
        assert_eq!(queue.enqueue(Action::mine(MineItem::Stone, 1)), Enqueued::Appended(1));
        assert_eq!(queue.enqueue(Action::mine(MineItem::Coal, 1)), Enqueued::Appended(2));
        assert_eq!(queue.head().unwrap().count(), 3);
        assert_eq!(queue.head().unwrap().to_string(), "Mine Coal (3)");
    }

    #[test]
    fn merging_into_an_in_progress_mine_extends_it() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::mine(MineItem::Coal, 1));
        let mut ledger = Ledger::new();
        process(&mut queue, &mut ledger, 5);
        queue.enqueue(Action::mine(MineItem::Coal, 1));
        process(&mut queue, &mut ledger, 15);
        assert!(queue.is_empty());
        assert_eq!(ledger.get(ItemType::Coal), 2);
    }

    #[test]
    fn crafts_never_merge() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::craft(CraftItem::Robot));
        assert_eq!(queue.enqueue(Action::craft(CraftItem::Robot)), Enqueued::Appended(1));
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut queue = ActionQueue::new();
        queue.enqueue(Action::mine(MineItem::Coal, 1));
        assert!(queue.remove(3).is_none());
        assert!(queue.remove(0).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn outcome_status_reaches_completion() {
        let mut action = Action::mine(MineItem::Coal, 1);
        let mut ledger = Ledger::new();
        let recipes = RecipeBook::default();
        let last = (0..10)
            .map(|_| action.advance(&mut ledger, &recipes).unwrap())
            .last()
            .unwrap();
        assert_eq!(last.status, ActionStatus::Completed);
    }
}
