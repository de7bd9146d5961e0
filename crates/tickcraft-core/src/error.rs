//! Fatal engine errors.
//!
//! An [`InvariantViolation`] is never expected in correct operation. It means
//! the engine or its caller produced a state the simulation cannot represent,
//! so the tick that hit it is aborted and none of its mutations are kept.
//! Expected conditions (a recipe that cannot be afforded yet, a robot with no
//! satisfied rule) are not errors and never surface here.

use crate::item::ItemType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("cannot remove {requested} {item}: only {available} in the ledger")]
    Underflow {
        item: ItemType,
        requested: u32,
        available: u32,
    },
    #[error("ledger adjustment of {item} must be a positive quantity")]
    ZeroQuantity { item: ItemType },
    #[error("{item} count overflowed")]
    Overflow { item: ItemType },
    #[error("action progress {progress} is outside 0..{target}")]
    ProgressOutOfRange { progress: u32, target: u32 },
    #[error("action count must be positive")]
    ZeroCount,
    #[error("craft count must be exactly 1, got {count}")]
    CraftCount { count: u32 },
    #[error("no recipe for {item}")]
    MissingRecipe { item: ItemType },
}
