//! Events recorded while a tick runs.
//!
//! Events are collected into the [`TickReport`] returned by the tick. They
//! describe what happened; they are never fed back into the simulation.

use crate::action::{ActionKind, ActionOutcome, ActionStatus};
use crate::item::ItemType;
use crate::robot::RobotId;
use std::fmt;

/// Who drove the action an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Actor {
    Queue,
    Robot(RobotId),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Queue => f.write_str("queue"),
            Actor::Robot(id) => write!(f, "robot {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// An action took its first step (and reserved its inputs).
    ActionStarted { actor: Actor, kind: ActionKind, item: ItemType },
    /// A Craft/Smelt could not afford its inputs and did not move.
    ActionBlocked { actor: Actor, kind: ActionKind, item: ItemType },
    ItemConsumed { actor: Actor, item: ItemType, quantity: u32 },
    ItemProduced { actor: Actor, item: ItemType, quantity: u32 },
    ActionCompleted { actor: Actor, kind: ActionKind, item: ItemType },
    /// An idle robot picked the rule at `rule` (zero-based).
    RuleAdopted { robot: RobotId, rule: usize },
    /// An idle robot found no satisfied rule.
    RobotIdle { robot: RobotId },
}

/// Everything one tick did, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick number after the step.
    pub tick: u64,
    pub events: Vec<TickEvent>,
}

impl TickReport {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            events: Vec::new(),
        }
    }

    /// Record the events implied by one [`ActionOutcome`].
    pub fn record_outcome(
        &mut self,
        actor: Actor,
        kind: ActionKind,
        item: ItemType,
        outcome: &ActionOutcome,
    ) {
        if outcome.status == ActionStatus::Blocked {
            self.events.push(TickEvent::ActionBlocked { actor, kind, item });
            return;
        }
        if outcome.started {
            self.events.push(TickEvent::ActionStarted { actor, kind, item });
        }
        for &(item, quantity) in &outcome.consumed {
            self.events.push(TickEvent::ItemConsumed {
                actor,
                item,
                quantity,
            });
        }
        for &(item, quantity) in &outcome.produced {
            self.events.push(TickEvent::ItemProduced {
                actor,
                item,
                quantity,
            });
        }
        if outcome.is_complete() {
            self.events
                .push(TickEvent::ActionCompleted { actor, kind, item });
        }
    }

    /// Net units of `item` produced minus consumed this tick.
    pub fn net(&self, item: ItemType) -> i64 {
        self.events
            .iter()
            .map(|e| match *e {
                TickEvent::ItemProduced {
                    item: i, quantity, ..
                } if i == item => i64::from(quantity),
                TickEvent::ItemConsumed {
                    item: i, quantity, ..
                } if i == item => -i64::from(quantity),
                _ => 0,
            })
            .sum()
    }

    pub fn completed(&self) -> impl Iterator<Item = &TickEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, TickEvent::ActionCompleted { .. }))
    }
}
