//! Item types and the closed sub-categories that actions are restricted to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Item type
// ---------------------------------------------------------------------------

/// Every kind of resource the ledger can hold. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Coal,
    Stone,
    StoneFurnace,
    BurnerMiningDrill,
    IronOre,
    IronPlate,
    CopperOre,
    CopperPlate,
    Robot,
    ElectronicCircuit,
}

impl ItemType {
    /// All item types in declaration order.
    pub const ALL: [ItemType; 10] = [
        ItemType::Coal,
        ItemType::Stone,
        ItemType::StoneFurnace,
        ItemType::BurnerMiningDrill,
        ItemType::IronOre,
        ItemType::IronPlate,
        ItemType::CopperOre,
        ItemType::CopperPlate,
        ItemType::Robot,
        ItemType::ElectronicCircuit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemType::Coal => "Coal",
            ItemType::Stone => "Stone",
            ItemType::StoneFurnace => "StoneFurnace",
            ItemType::BurnerMiningDrill => "BurnerMiningDrill",
            ItemType::IronOre => "IronOre",
            ItemType::IronPlate => "IronPlate",
            ItemType::CopperOre => "CopperOre",
            ItemType::CopperPlate => "CopperPlate",
            ItemType::Robot => "Robot",
            ItemType::ElectronicCircuit => "ElectronicCircuit",
        }
    }

    /// Whether this item is produced by a Mine action.
    pub fn is_mineable(self) -> bool {
        MineItem::try_from(self).is_ok()
    }

    /// Whether this item is produced by a Craft action.
    pub fn is_craftable(self) -> bool {
        CraftItem::try_from(self).is_ok()
    }

    /// Whether this item is produced by a Smelt action.
    pub fn is_smeltable(self) -> bool {
        SmeltItem::try_from(self).is_ok()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name does not match any [`ItemType`], or an item does not
/// belong to the requested category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemParseError {
    #[error("unknown item '{0}'")]
    Unknown(String),
    #[error("{item} cannot be {verb}")]
    WrongCategory { item: ItemType, verb: &'static str },
}

impl FromStr for ItemType {
    type Err = ItemParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ItemType::ALL
            .into_iter()
            .find(|item| item.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ItemParseError::Unknown(trimmed.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Generates a closed sub-enum of [`ItemType`] with lossless conversions in
/// both directions.
macro_rules! item_category {
    ($(#[$meta:meta])* $name:ident, $verb:literal, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl From<$name> for ItemType {
            fn from(item: $name) -> ItemType {
                match item {
                    $($name::$variant => ItemType::$variant),+
                }
            }
        }

        impl TryFrom<ItemType> for $name {
            type Error = ItemParseError;

            fn try_from(item: ItemType) -> Result<Self, Self::Error> {
                match item {
                    $(ItemType::$variant => Ok($name::$variant),)+
                    other => Err(ItemParseError::WrongCategory { item: other, verb: $verb }),
                }
            }
        }

        impl FromStr for $name {
            type Err = ItemParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::try_from(s.parse::<ItemType>()?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                ItemType::from(*self).fmt(f)
            }
        }
    };
}

item_category!(
    /// Primary raw resources, produced by mining.
    MineItem,
    "mined",
    [Coal, Stone, IronOre, CopperOre]
);

item_category!(
    /// Goods assembled one at a time from a recipe.
    CraftItem,
    "crafted",
    [StoneFurnace, BurnerMiningDrill, Robot, ElectronicCircuit]
);

item_category!(
    /// Goods produced in a stone furnace, in batches.
    SmeltItem,
    "smelted",
    [IronPlate, CopperPlate]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for item in ItemType::ALL {
            assert_eq!(item.name().parse::<ItemType>().unwrap(), item);
        }
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(" ironore ".parse::<ItemType>().unwrap(), ItemType::IronOre);
        assert_eq!(
            "Plutonium".parse::<ItemType>(),
            Err(ItemParseError::Unknown("Plutonium".to_string()))
        );
    }

    #[test]
    fn categories_are_disjoint() {
        for item in ItemType::ALL {
            let memberships = [item.is_mineable(), item.is_craftable(), item.is_smeltable()]
                .iter()
                .filter(|b| **b)
                .count();
            assert!(memberships <= 1, "{item} belongs to more than one category");
        }
    }

    #[test]
    fn category_conversion_rejects_other_items() {
        assert_eq!(MineItem::try_from(ItemType::Coal), Ok(MineItem::Coal));
        assert_eq!(
            SmeltItem::try_from(ItemType::Coal),
            Err(ItemParseError::WrongCategory {
                item: ItemType::Coal,
                verb: "smelted"
            })
        );
        assert!("Robot".parse::<CraftItem>().is_ok());
        assert!("Robot".parse::<MineItem>().is_err());
    }

    #[test]
    fn category_display_matches_item_name() {
        assert_eq!(SmeltItem::CopperPlate.to_string(), "CopperPlate");
        assert_eq!(ItemType::from(CraftItem::Robot), ItemType::Robot);
    }
}
