//! Boundary records exchanged with the participant-profile store.

use super::{Attributes, CharacterClass, CombatStats, Equipment, FighterStance, ParticipantId};

/// Persisted class-resource values, one field per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoredResources {
    pub sneak: i32,
    pub stance: FighterStance,
    pub mana: i32,
    pub wrath: i32,
    pub balance: i32,
}

impl Default for StoredResources {
    fn default() -> Self {
        Self {
            sneak: 0,
            stance: FighterStance::None,
            mana: crate::config::CombatConfig::MANA_MAX,
            wrath: 0,
            balance: 0,
        }
    }
}

/// What the engine reads about a participant when they enter combat.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantProfile {
    pub id: ParticipantId,
    pub display_name: String,
    pub class: Option<CharacterClass>,
    #[cfg_attr(feature = "serde", serde(default = "default_level"))]
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    pub equipment: Equipment,
    /// Current health out of combat; `None` means full.
    #[cfg_attr(feature = "serde", serde(default))]
    pub health: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resources: StoredResources,
}

#[cfg(feature = "serde")]
fn default_level() -> u32 {
    1
}

impl ParticipantProfile {
    /// A fresh level-1 character with every attribute at 5.
    pub fn new(
        id: impl Into<ParticipantId>,
        display_name: impl Into<String>,
        class: CharacterClass,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            class: Some(class),
            level: 1,
            attributes: Attributes::uniform(5),
            equipment: Equipment::default(),
            health: None,
            resources: StoredResources::default(),
        }
    }

    /// Combat snapshot: base attributes plus equipment, with health clamped
    /// into `1..=max_health` so nobody enters combat already dead.
    pub fn combat_stats(&self) -> CombatStats {
        let attributes = self.attributes.plus(&self.equipment.attribute_bonus());
        let max_health = CombatStats::max_health_for(attributes.constitution, self.level);
        let mut stats = CombatStats::new(
            max_health,
            attributes,
            self.equipment.defense_bonus(),
            self.equipment.damage_bonus(),
        );
        if let Some(health) = self.health {
            stats.health = health.clamp(1, stats.max_health);
        }
        stats
    }
}

/// Currency and experience granted at encounter completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reward {
    pub coins: u32,
    pub experience: u32,
}

/// Final combat values to persist for one participant.
///
/// Produced once on death and once at completion; applying the same
/// writeback twice leaves the profile unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileWriteback {
    pub participant: ParticipantId,
    pub health: i32,
    pub resources: StoredResources,
    pub died: bool,
    pub reward: Option<Reward>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Hand, Item, ItemKind};

    #[test]
    fn combat_stats_fold_in_equipment() {
        let mut profile = ParticipantProfile::new("u1", "Ash", CharacterClass::Fighter);
        let mut plate = Item::new("Plate", ItemKind::ChestArmor);
        plate.defense_bonus = 4;
        plate.bonuses.constitution = 2;
        profile
            .equipment
            .equip(plate, CharacterClass::Fighter, Hand::Main)
            .unwrap();

        let stats = profile.combat_stats();
        assert_eq!(stats.attributes.constitution, 7);
        assert_eq!(stats.defense, 4);
        assert_eq!(stats.max_health, 50 + 70 + 5);
        assert_eq!(stats.health, stats.max_health);
    }

    #[test]
    fn stored_health_is_clamped() {
        let mut profile = ParticipantProfile::new("u1", "Ash", CharacterClass::Mage);
        profile.health = Some(10_000);
        let stats = profile.combat_stats();
        assert_eq!(stats.health, stats.max_health);

        profile.health = Some(-3);
        assert_eq!(profile.combat_stats().health, 1);
    }
}
