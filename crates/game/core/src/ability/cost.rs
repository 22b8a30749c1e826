//! Per-class resource costs and gains carried by an ability.
//!
//! Only the fields that belong to the caster's class are meaningful; a Mage
//! casting an ability with a `sneak_cost` simply ignores it.

use crate::state::FighterStance;

/// Whether a Ranger's balance must sit above or below a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BalanceRequirementKind {
    Above,
    Below,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalanceRequirement {
    pub kind: BalanceRequirementKind,
    pub threshold: i32,
}

impl BalanceRequirement {
    /// Strict comparison: `Above(3)` is not met at balance 3.
    pub fn is_met(&self, balance: i32) -> bool {
        match self.kind {
            BalanceRequirementKind::Above => balance > self.threshold,
            BalanceRequirementKind::Below => balance < self.threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResourceCost {
    // Rogue
    pub sneak_cost: i32,
    pub sneak_gain: i32,
    // Fighter
    pub required_stance: Option<FighterStance>,
    // Mage
    pub mana_cost: i32,
    // Cleric
    pub wrath_cost: i32,
    pub wrath_gain: i32,
    // Ranger
    pub balance_cost: i32,
    pub balance_gain: i32,
    pub balance_requirement: Option<BalanceRequirement>,
}
