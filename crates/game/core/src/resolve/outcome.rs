use crate::ability::AbilityCategory;
use crate::state::{CombatantId, HitOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetEffect {
    Damage(HitOutcome),
    Heal { amount: i32 },
    Buff,
}

/// What one ability did to one target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetOutcome {
    pub target: CombatantId,
    pub effect: TargetEffect,
    /// Names of status effects applied by this hit.
    pub applied: Vec<String>,
}

impl TargetOutcome {
    pub(crate) fn new(target: CombatantId, effect: TargetEffect) -> Self {
        Self {
            target,
            effect,
            applied: Vec::new(),
        }
    }

    pub fn evaded(&self) -> bool {
        matches!(self.effect, TargetEffect::Damage(hit) if hit.evaded)
    }

    pub fn killed(&self) -> bool {
        matches!(self.effect, TargetEffect::Damage(hit) if hit.killed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    pub caster: CombatantId,
    /// Display name of the ability.
    pub ability: String,
    pub category: AbilityCategory,
    pub targets: Vec<TargetOutcome>,
    /// Combo count after this action, for combo classes.
    pub combo: Option<u32>,
    /// Wrath gained by Clerics because a player was hurt.
    pub wrath: Vec<(CombatantId, i32)>,
}

impl ActionOutcome {
    pub fn deaths(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.targets.iter().filter(|t| t.killed()).map(|t| t.target)
    }

    pub fn damage_dealt(&self) -> i32 {
        self.targets
            .iter()
            .map(|t| match t.effect {
                TargetEffect::Damage(hit) => hit.final_damage,
                _ => 0,
            })
            .sum()
    }

    pub fn healing_done(&self) -> i32 {
        self.targets
            .iter()
            .map(|t| match t.effect {
                TargetEffect::Heal { amount } => amount,
                _ => 0,
            })
            .sum()
    }
}
