//! Attributes, classes, and the combat stat snapshot.

use crate::ability::ScalingStat;

/// The six primary attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Attributes {
    pub strength: i32,
    pub constitution: i32,
    pub dexterity: i32,
    pub willpower: i32,
    pub charisma: i32,
    pub intelligence: i32,
}

impl Attributes {
    /// Every attribute set to `value`.
    pub const fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            constitution: value,
            dexterity: value,
            willpower: value,
            charisma: value,
            intelligence: value,
        }
    }

    pub fn plus(&self, other: &Attributes) -> Attributes {
        Attributes {
            strength: self.strength + other.strength,
            constitution: self.constitution + other.constitution,
            dexterity: self.dexterity + other.dexterity,
            willpower: self.willpower + other.willpower,
            charisma: self.charisma + other.charisma,
            intelligence: self.intelligence + other.intelligence,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CharacterClass {
    Rogue,
    Fighter,
    Mage,
    Cleric,
    Ranger,
}

impl CharacterClass {
    /// Command of the low-cost ability assigned when a turn times out.
    pub const fn default_ability(self) -> &'static str {
        match self {
            Self::Rogue => "quickcut",
            Self::Fighter => "strike",
            Self::Mage => "bolt",
            Self::Cleric => "crush",
            Self::Ranger => "shot",
        }
    }

    /// Stat used when an ability names a stat the engine does not recognize.
    pub const fn primary_stat(self) -> ScalingStat {
        match self {
            Self::Rogue | Self::Ranger => ScalingStat::Dexterity,
            Self::Fighter => ScalingStat::Strength,
            Self::Mage => ScalingStat::Intelligence,
            Self::Cleric => ScalingStat::Willpower,
        }
    }

    pub const fn can_dual_wield(self) -> bool {
        matches!(self, Self::Rogue | Self::Fighter | Self::Ranger)
    }
}

/// Stats captured once at combat entry.
///
/// Equipment and level changes made outside combat are not observed until
/// the next encounter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub max_health: i32,
    pub health: i32,
    pub attributes: Attributes,
    pub defense: i32,
    pub damage_bonus: i32,
}

impl CombatStats {
    /// `50 + constitution * 10 + level * 5`.
    pub const fn max_health_for(constitution: i32, level: u32) -> i32 {
        50 + constitution * 10 + level as i32 * 5
    }

    /// Full-health snapshot. `max_health` is floored at 1.
    pub fn new(max_health: i32, attributes: Attributes, defense: i32, damage_bonus: i32) -> Self {
        let max_health = max_health.max(1);
        Self {
            max_health,
            health: max_health,
            attributes,
            defense,
            damage_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn max_health_formula() {
        assert_eq!(CombatStats::max_health_for(5, 1), 105);
        assert_eq!(CombatStats::max_health_for(0, 0), 50);
    }

    #[test]
    fn class_parses_case_insensitively() {
        assert_eq!(CharacterClass::from_str("MAGE"), Ok(CharacterClass::Mage));
        assert_eq!(CharacterClass::Ranger.to_string(), "ranger");
    }
}
