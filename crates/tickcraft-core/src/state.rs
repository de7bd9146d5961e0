//! The root simulation state and the external entry points that mutate it.
//!
//! Outside the tick itself, [`State`] only changes through the command
//! methods here (enqueue, dequeue, add/update/remove robot). Each command
//! checks everything it needs before touching anything, so a rejected
//! command leaves the state exactly as it was.

use crate::action::Action;
use crate::error::InvariantViolation;
use crate::item::ItemType;
use crate::ledger::Ledger;
use crate::queue::{ActionQueue, Enqueued};
use crate::robot::{Robot, RobotId, Rule};
use crate::sim::StateHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected external command. Recoverable: the state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvariantViolation),
    #[error("no queue entry at index {index} (queue has {len})")]
    NoSuchQueueEntry { index: usize, len: usize },
    #[error("building a new robot needs a Robot in the inventory")]
    NoRobotInInventory,
    #[error("robot {0} does not exist")]
    UnknownRobot(RobotId),
    #[error("robot id {id} is ahead of the next free id {next}")]
    RobotIdAhead { id: RobotId, next: RobotId },
    #[error("robot ids exhausted")]
    RobotIdsExhausted,
}

/// Structural problems in a state that did not come from the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("queue entry {index}: {source}")]
    QueueEntry {
        index: usize,
        source: InvariantViolation,
    },
    #[error("robot {id}: {source}")]
    Robot {
        id: RobotId,
        source: InvariantViolation,
    },
    #[error("robot stored under key {key} has id {id}")]
    RobotKeyMismatch { key: RobotId, id: RobotId },
    #[error("robot id {id} is not below nextRobotId {next}")]
    RobotIdNotAllocated { id: RobotId, next: u32 },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct State {
    pub(crate) tick: u64,
    pub(crate) inventory: Ledger,
    pub(crate) queue: ActionQueue,
    pub(crate) robots: BTreeMap<RobotId, Robot>,
    pub(crate) next_robot_id: u32,
}

impl State {
    /// Tick zero, empty inventory, empty queue, no robots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a given inventory (for example a configured starting kit).
    pub fn with_inventory(mut self, inventory: Ledger) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn inventory(&self) -> &Ledger {
        &self.inventory
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn robots(&self) -> impl Iterator<Item = &Robot> {
        self.robots.values()
    }

    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.get(&id)
    }

    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    pub fn next_robot_id(&self) -> RobotId {
        RobotId(self.next_robot_id)
    }

    // -----------------------------------------------------------------------
    // Queue commands
    // -----------------------------------------------------------------------

    pub fn enqueue(&mut self, action: Action) -> Result<Enqueued, CommandError> {
        action.validate()?;
        let label = action.to_string();
        let placed = self.queue.enqueue(action);
        info!(tick = self.tick, action = %label, ?placed, "Enqueued action");
        Ok(placed)
    }

    /// Remove the queue entry at `index`. Inputs already reserved by a started
    /// head are not refunded.
    pub fn dequeue_at(&mut self, index: usize) -> Result<Action, CommandError> {
        let len = self.queue.len();
        let removed = self
            .queue
            .remove(index)
            .ok_or(CommandError::NoSuchQueueEntry { index, len })?;
        info!(tick = self.tick, index, action = %removed, "Dequeued action");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Robot commands
    // -----------------------------------------------------------------------

    /// Build a new robot from one `Robot` item in the inventory.
    pub fn add_robot(
        &mut self,
        name: impl Into<String>,
        algorithm: Vec<Rule>,
    ) -> Result<RobotId, CommandError> {
        let robot = Robot::new(self.next_robot_id(), name, algorithm);
        self.add_or_update_robot(robot)
    }

    /// Insert a robot whose id equals `next_robot_id` (debiting one `Robot`
    /// from the inventory), or replace the name and algorithm of an existing
    /// one. An update keeps the robot's running action.
    pub fn add_or_update_robot(&mut self, robot: Robot) -> Result<RobotId, CommandError> {
        robot.validate()?;
        let id = robot.id;

        if let Some(existing) = self.robots.get_mut(&id) {
            existing.name = robot.name;
            existing.algorithm = robot.algorithm;
            info!(tick = self.tick, robot = %id, "Updated robot");
            return Ok(id);
        }

        let next = self.next_robot_id();
        if id > next {
            return Err(CommandError::RobotIdAhead { id, next });
        }
        if id < next {
            return Err(CommandError::UnknownRobot(id));
        }
        if !self.inventory.has(ItemType::Robot) {
            return Err(CommandError::NoRobotInInventory);
        }
        let following = self
            .next_robot_id
            .checked_add(1)
            .ok_or(CommandError::RobotIdsExhausted)?;

        self.inventory.sub(ItemType::Robot, 1)?;
        self.next_robot_id = following;
        info!(tick = self.tick, robot = %id, name = %robot.name, "Added robot");
        self.robots.insert(
            id,
            Robot {
                action: None,
                ..robot
            },
        );
        Ok(id)
    }

    /// Remove a robot and return its `Robot` item to the inventory. Whatever
    /// its running action had reserved is lost.
    pub fn remove_robot(&mut self, id: RobotId) -> Result<Robot, CommandError> {
        if !self.robots.contains_key(&id) {
            return Err(CommandError::UnknownRobot(id));
        }
        self.inventory.add(ItemType::Robot, 1)?;
        let robot = self
            .robots
            .remove(&id)
            .ok_or(CommandError::UnknownRobot(id))?;
        info!(tick = self.tick, robot = %id, name = %robot.name, "Removed robot");
        Ok(robot)
    }

    // -----------------------------------------------------------------------
    // Validation and hashing
    // -----------------------------------------------------------------------

    /// Check the structural invariants a state produced by the engine always
    /// satisfies. Used on states loaded from outside.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, action) in self.queue.iter().enumerate() {
            action
                .validate()
                .map_err(|source| ValidationError::QueueEntry { index, source })?;
        }
        for (&key, robot) in &self.robots {
            if key != robot.id {
                return Err(ValidationError::RobotKeyMismatch { key, id: robot.id });
            }
            if robot.id.0 >= self.next_robot_id {
                return Err(ValidationError::RobotIdNotAllocated {
                    id: robot.id,
                    next: self.next_robot_id,
                });
            }
            robot
                .validate()
                .map_err(|source| ValidationError::Robot { id: key, source })?;
        }
        Ok(())
    }

    /// Deterministic FNV-1a hash of the whole state, for desync checks.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.tick);
        for (item, count) in self.inventory.iter() {
            h.write_u32(item as u32);
            h.write_u32(count);
        }
        h.write_u64(self.queue.len() as u64);
        for action in self.queue.iter() {
            h.write_action(action);
        }
        for robot in self.robots.values() {
            h.write_u32(robot.id.0);
            h.write(robot.name.as_bytes());
            match &robot.action {
                Some(action) => h.write_action(action),
                None => h.write_u32(u32::MAX),
            }
            h.write_u64(robot.algorithm.len() as u64);
            for rule in &robot.algorithm {
                h.write_condition(&rule.condition);
                h.write_action(&rule.action);
            }
        }
        h.write_u32(self.next_robot_id);
        h.finish()
    }
}
