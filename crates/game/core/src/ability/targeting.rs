//! Targeting rules attached to ability definitions.

use crate::config::CombatConfig;

bitflags::bitflags! {
    /// Sides an ability may be aimed at, relative to the caster.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct TargetFlags: u8 {
        const ALLY  = 1 << 0;
        const ENEMY = 1 << 1;
    }
}

impl Default for TargetFlags {
    fn default() -> Self {
        Self::ENEMY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TargetKind {
    /// Always lands on the caster.
    SelfOnly,
    #[default]
    Single,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetRule {
    pub kind: TargetKind,
    pub allowed: TargetFlags,
    /// Lowest enemy board position this ability can reach.
    pub min_position: u8,
    /// Highest enemy board position this ability can reach.
    pub max_position: u8,
    /// Total combatants hit, including the primary target.
    pub aoe_targets: u8,
}

impl Default for TargetRule {
    fn default() -> Self {
        Self {
            kind: TargetKind::Single,
            allowed: TargetFlags::ENEMY,
            min_position: 1,
            max_position: CombatConfig::MAX_ENEMY_POSITIONS as u8,
            aoe_targets: 1,
        }
    }
}

impl TargetRule {
    pub fn self_only() -> Self {
        Self {
            kind: TargetKind::SelfOnly,
            allowed: TargetFlags::ALLY,
            ..Self::default()
        }
    }

    pub fn ally() -> Self {
        Self {
            allowed: TargetFlags::ALLY,
            ..Self::default()
        }
    }

    pub fn can_target_allies(&self) -> bool {
        self.allowed.contains(TargetFlags::ALLY)
    }

    pub fn can_target_enemies(&self) -> bool {
        self.allowed.contains(TargetFlags::ENEMY)
    }

    /// Whether an opposing combatant at `position` is within reach.
    pub fn reaches(&self, position: u8) -> bool {
        (self.min_position..=self.max_position).contains(&position)
    }

    pub fn is_aoe(&self) -> bool {
        self.aoe_targets > 1
    }
}
