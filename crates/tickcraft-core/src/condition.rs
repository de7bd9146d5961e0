//! Conditions: two-sided comparisons evaluated against the ledger.
//!
//! A [`Condition`] is always fully resolved. Authoring tools build a
//! [`PartialCondition`] field by field and call [`PartialCondition::resolve`]
//! once the user is done; the engine never sees anything partial.

use crate::item::{ItemParseError, ItemType};
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Comparison operator for conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Lt,
        Operator::Lte,
        Operator::Eq,
        Operator::Gte,
        Operator::Gt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::Gte => ">=",
            Operator::Gt => ">",
        }
    }

    pub fn apply(self, left: i64, right: i64) -> bool {
        match self {
            Operator::Lt => left < right,
            Operator::Lte => left <= right,
            Operator::Eq => left == right,
            Operator::Gte => left >= right,
            Operator::Gt => left > right,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One side of a comparison: a ledger reference or a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum Value {
    /// Reads the current ledger count of the item.
    #[serde(rename = "Variable")]
    Item {
        #[serde(rename = "variable")]
        item: ItemType,
    },
    Constant { constant: i64 },
}

impl Value {
    pub fn item(item: ItemType) -> Self {
        Value::Item { item }
    }

    pub fn constant(constant: i64) -> Self {
        Value::Constant { constant }
    }

    pub fn resolve(&self, ledger: &Ledger) -> i64 {
        match *self {
            Value::Item { item } => i64::from(ledger.get(item)),
            Value::Constant { constant } => constant,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Item { item } => item.fmt(f),
            Value::Constant { constant } => constant.fmt(f),
        }
    }
}

impl FromStr for Value {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConditionError::EmptyValue);
        }
        if let Ok(constant) = s.parse::<i64>() {
            return Ok(Value::constant(constant));
        }
        Ok(Value::item(s.parse()?))
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// `left <operator> right`, evaluated against a ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub left: Value,
    pub operator: Operator,
    pub right: Value,
}

impl Condition {
    pub fn new(left: Value, operator: Operator, right: Value) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }

    /// Pure: reads the ledger, never changes it.
    pub fn evaluate(&self, ledger: &Ledger) -> bool {
        self.operator
            .apply(self.left.resolve(ledger), self.right.resolve(ledger))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    /// Parses `Coal < 10`, `IronPlate >= CopperPlate`, `5 == 5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Two-character symbols first so `<=` is not read as `<`.
        let mut symbols: Vec<Operator> = Operator::ALL.to_vec();
        symbols.sort_by_key(|op| std::cmp::Reverse(op.symbol().len()));

        for op in symbols {
            if let Some((left, right)) = s.split_once(op.symbol()) {
                return Ok(Condition::new(left.parse()?, op, right.parse()?));
            }
        }
        Err(ConditionError::MissingOperator)
    }
}

// ---------------------------------------------------------------------------
// Partial conditions (authoring boundary)
// ---------------------------------------------------------------------------

/// Why a partially-authored condition cannot be used yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("condition has no left-hand value")]
    MissingLeft,
    #[error("condition has no right-hand value")]
    MissingRight,
    #[error("condition has no operator")]
    MissingOperator,
    #[error("value is empty")]
    EmptyValue,
    #[error(transparent)]
    Item(#[from] ItemParseError),
}

/// A value under construction. Either field may still be unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum PartialValue {
    Variable { variable: Option<String> },
    Constant { constant: Option<i64> },
}

impl PartialValue {
    pub fn resolve(&self) -> Result<Value, ConditionError> {
        match self {
            PartialValue::Variable { variable } => {
                let name = variable.as_deref().ok_or(ConditionError::EmptyValue)?;
                Ok(Value::item(name.parse()?))
            }
            PartialValue::Constant { constant } => constant
                .map(Value::constant)
                .ok_or(ConditionError::EmptyValue),
        }
    }
}

/// A condition under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialCondition {
    pub left: Option<PartialValue>,
    pub operator: Option<Operator>,
    pub right: Option<PartialValue>,
}

impl PartialCondition {
    pub fn resolve(&self) -> Result<Condition, ConditionError> {
        let left = self.left.as_ref().ok_or(ConditionError::MissingLeft)?;
        let operator = self.operator.ok_or(ConditionError::MissingOperator)?;
        let right = self.right.as_ref().ok_or(ConditionError::MissingRight)?;
        Ok(Condition::new(left.resolve()?, operator, right.resolve()?))
    }

    pub fn is_complete(&self) -> bool {
        self.resolve().is_ok()
    }
}

impl From<Condition> for PartialCondition {
    fn from(condition: Condition) -> Self {
        let side = |value: Value| match value {
            Value::Item { item } => PartialValue::Variable {
                variable: Some(item.name().to_string()),
            },
            Value::Constant { constant } => PartialValue::Constant {
                constant: Some(constant),
            },
        };
        Self {
            left: Some(side(condition.left)),
            operator: Some(condition.operator),
            right: Some(side(condition.right)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::from_iter([(ItemType::Coal, 5), (ItemType::Stone, 12)])
    }

    #[test]
    fn operators_compare_resolved_sides() {
        let l = ledger();
        let coal = Value::item(ItemType::Coal);
        let five = Value::constant(5);
        assert!(Condition::new(coal, Operator::Eq, five).evaluate(&l));
        assert!(Condition::new(coal, Operator::Lte, five).evaluate(&l));
        assert!(Condition::new(coal, Operator::Gte, five).evaluate(&l));
        assert!(!Condition::new(coal, Operator::Lt, five).evaluate(&l));
        assert!(!Condition::new(coal, Operator::Gt, five).evaluate(&l));
    }

    #[test]
    fn absent_items_resolve_to_zero() {
        let cond = Condition::new(
            Value::item(ItemType::IronOre),
            Operator::Eq,
            Value::constant(0),
        );
        assert!(cond.evaluate(&ledger()));
    }

    #[test]
    fn item_to_item_comparison() {
        let cond: Condition = "Coal < Stone".parse().unwrap();
        assert!(cond.evaluate(&ledger()));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let l = ledger();
        let cond: Condition = "Stone >= 10".parse().unwrap();
        let first = cond.evaluate(&l);
        assert_eq!(first, cond.evaluate(&l));
        assert_eq!(l, ledger());
    }

    #[test]
    fn parse_prefers_two_character_operators() {
        let cond: Condition = "Coal<=3".parse().unwrap();
        assert_eq!(cond.operator, Operator::Lte);
        assert_eq!(cond.right, Value::constant(3));

        let cond: Condition = "IronPlate >= -1".parse().unwrap();
        assert_eq!(cond.operator, Operator::Gte);
        assert_eq!(cond.right, Value::constant(-1));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "Coal 3".parse::<Condition>(),
            Err(ConditionError::MissingOperator)
        );
        assert_eq!("< 3".parse::<Condition>(), Err(ConditionError::EmptyValue));
        assert!(matches!(
            "Gold > 3".parse::<Condition>(),
            Err(ConditionError::Item(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        let cond: Condition = "CopperOre > 7".parse().unwrap();
        assert_eq!(cond.to_string(), "CopperOre > 7");
        assert_eq!(cond.to_string().parse::<Condition>().unwrap(), cond);
    }

    #[test]
    fn json_shape_uses_type_tags() {
        let cond = Condition::new(
            Value::item(ItemType::Coal),
            Operator::Lt,
            Value::constant(10),
        );
        let json = serde_json::to_value(cond).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "left": { "type": "Variable", "variable": "Coal" },
                "operator": "lt",
                "right": { "type": "Constant", "constant": 10 },
            })
        );
    }

    #[test]
    fn partial_condition_reports_first_gap() {
        let mut partial = PartialCondition::default();
        assert_eq!(partial.resolve(), Err(ConditionError::MissingLeft));

        partial.left = Some(PartialValue::Variable {
            variable: Some("Coal".into()),
        });
        assert_eq!(partial.resolve(), Err(ConditionError::MissingOperator));

        partial.operator = Some(Operator::Gt);
        partial.right = Some(PartialValue::Constant { constant: None });
        assert_eq!(partial.resolve(), Err(ConditionError::EmptyValue));

        partial.right = Some(PartialValue::Constant { constant: Some(2) });
        assert!(partial.is_complete());
        assert_eq!(partial.resolve().unwrap().to_string(), "Coal > 2");
    }

    #[test]
    fn partial_condition_round_trips_a_condition() {
        let cond: Condition = "Robot == 0".parse().unwrap();
        assert_eq!(PartialCondition::from(cond).resolve().unwrap(), cond);
    }
}
