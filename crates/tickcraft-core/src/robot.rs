//! Robots: autonomous agents that pick their own actions from a rule list.
//!
//! An idle robot scans its algorithm top to bottom and adopts a fresh copy of
//! the first rule whose condition holds against the ledger as it stands at
//! that moment. A robot whose action completes goes idle and chooses again on
//! the next tick, not the same one.

use crate::action::{Action, ActionParseError};
use crate::condition::{Condition, ConditionError};
use crate::error::InvariantViolation;
use crate::event::{Actor, TickEvent, TickReport};
use crate::ledger::Ledger;
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Identifies a robot. Allocated in increasing order, so id order is also
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(pub u32);

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One step of a robot's algorithm: when `condition` holds, run `action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub condition: Condition,
    /// Template; never advanced directly.
    pub action: Action,
}

impl Rule {
    pub fn new(condition: Condition, action: Action) -> Self {
        Self { condition, action }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.condition, self.action)
    }
}

/// Why `COND => ACTION` text could not be parsed into a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("rule must have the form 'CONDITION => ACTION'")]
    MissingArrow,
    #[error("condition: {0}")]
    Condition(#[from] ConditionError),
    #[error("action: {0}")]
    Action(#[from] ActionParseError),
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (condition, action) = s.split_once("=>").ok_or(RuleParseError::MissingArrow)?;
        Ok(Rule::new(condition.parse()?, action.parse()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Robot {
    pub id: RobotId,
    pub name: String,
    /// Currently running action, `None` when idle.
    pub action: Option<Action>,
    pub algorithm: Vec<Rule>,
}

impl Robot {
    pub fn new(id: RobotId, name: impl Into<String>, algorithm: Vec<Rule>) -> Self {
        Self {
            id,
            name: name.into(),
            action: None,
            algorithm,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.action.is_none()
    }

    /// Index and fresh instance of the first rule satisfied by `ledger`.
    pub fn select(&self, ledger: &Ledger) -> Option<(usize, Action)> {
        self.algorithm
            .iter()
            .position(|rule| rule.condition.evaluate(ledger))
            .map(|index| (index, self.algorithm[index].action.instantiate()))
    }

    /// Check the running action and every template.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if let Some(action) = &self.action {
            action.validate()?;
        }
        for rule in &self.algorithm {
            rule.action.instantiate().validate()?;
        }
        Ok(())
    }

    /// Run one tick for this robot: pick an action if idle, then advance it.
    pub fn tick(
        &mut self,
        ledger: &mut Ledger,
        recipes: &RecipeBook,
        report: &mut TickReport,
    ) -> Result<(), InvariantViolation> {
        let robot = self.id;
        if self.action.is_none() {
            let Some((rule, action)) = self.select(ledger) else {
                report.events.push(TickEvent::RobotIdle { robot });
                return Ok(());
            };
            debug!(tick = report.tick, %robot, rule, %action, "Robot adopted rule");
            report.events.push(TickEvent::RuleAdopted { robot, rule });
            self.action = Some(action);
        }

        let Some(action) = self.action.as_mut() else {
            return Ok(());
        };
        let outcome = action.advance(ledger, recipes)?;
        report.record_outcome(Actor::Robot(robot), action.kind(), action.item(), &outcome);

        if outcome.is_complete() {
            debug!(tick = report.tick, %robot, action = %action, "Robot action completed");
            self.action = None;
        }
        Ok(())
    }
}

/// Advance every robot once, in id order. Each robot sees the ledger as left
/// by the queue and by every robot before it.
pub fn tick_robots(
    robots: &mut BTreeMap<RobotId, Robot>,
    ledger: &mut Ledger,
    recipes: &RecipeBook,
    report: &mut TickReport,
) -> Result<(), InvariantViolation> {
    for robot in robots.values_mut() {
        robot.tick(ledger, recipes, report)?;
    }
    Ok(())
}
