//! Tick pacing and state hashing.
//!
//! The engine itself is driven one tick at a time. [`TickRate`] describes how
//! often the surrounding application fires that tick, and [`AdvanceResult`]
//! reports what a wall-clock driven advance did.

use crate::action::Action;
use crate::condition::{Condition, Value};
use crate::event::TickReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Tick rate
// ---------------------------------------------------------------------------

/// Interval between ticks at normal speed, and how much faster "fast" mode
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickRate {
    pub interval_ms: u64,
    /// Fast mode divides the interval by this. Values below 1 act as 1.
    pub fast_divisor: u32,
}

impl Default for TickRate {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            fast_divisor: 100,
        }
    }
}

impl TickRate {
    /// Time between ticks. Never zero.
    pub fn interval(&self, fast: bool) -> Duration {
        let base = Duration::from_millis(self.interval_ms.max(1));
        if fast {
            (base / self.fast_divisor.max(1)).max(Duration::from_micros(1))
        } else {
            base
        }
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of an `Engine::advance()` call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Number of ticks actually executed.
    pub steps_run: u64,
    /// One report per executed tick, in order.
    pub reports: Vec<TickReport>,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an action's variant, item, count and progress.
    pub fn write_action(&mut self, action: &Action) {
        self.write_u32(action.kind() as u32);
        self.write_u32(action.item() as u32);
        self.write_u32(action.count());
        self.write_u32(action.progress());
    }

    pub fn write_value(&mut self, value: &Value) {
        match *value {
            Value::Item { item } => {
                self.write_u32(0);
                self.write_u32(item as u32);
            }
            Value::Constant { constant } => {
                self.write_u32(1);
                self.write(&constant.to_le_bytes());
            }
        }
    }

    pub fn write_condition(&mut self, condition: &Condition) {
        self.write_value(&condition.left);
        self.write_u32(condition.operator as u32);
        self.write_value(&condition.right);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::MineItem;

    #[test]
    fn default_rate_matches_game_speed() {
        let rate = TickRate::default();
        assert_eq!(rate.interval(false), Duration::from_secs(1));
        assert_eq!(rate.interval(true), Duration::from_millis(10));
    }

    #[test]
    fn degenerate_rates_never_yield_zero() {
        let rate = TickRate {
            interval_ms: 0,
            fast_divisor: 0,
        };
        assert_eq!(rate.interval(false), Duration::from_millis(1));
        assert!(rate.interval(true) > Duration::ZERO);

        let rate = TickRate {
            interval_ms: 1,
            fast_divisor: u32::MAX,
        };
        assert!(rate.interval(true) > Duration::ZERO);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_u32(7);

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_u32(7);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_u32(2);

        let mut h2 = StateHash::new();
        h2.write_u32(2);
        h2.write_u32(1);

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn action_progress_changes_hash() {
        let a = Action::mine(MineItem::Coal, 2);
        let b = Action::Mine {
            item: MineItem::Coal,
            count: 2,
            progress: 1,
        };
        let mut h1 = StateHash::new();
        h1.write_action(&a);
        let mut h2 = StateHash::new();
        h2.write_action(&b);
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn condition_sides_and_operator_change_hash() {
        let hash = |text: &str| {
            let condition: Condition = text.parse().unwrap();
            let mut h = StateHash::new();
            h.write_condition(&condition);
            h.finish()
        };
        assert_eq!(hash("Coal < 10"), hash("Coal < 10"));
        assert_ne!(hash("Coal < 10"), hash("Coal <= 10"));
        assert_ne!(hash("Coal < 10"), hash("Stone < 10"));
        assert_ne!(hash("Coal < 10"), hash("Coal < 11"));
        assert_ne!(hash("10 < Coal"), hash("Coal < 10"));
    }
}
