//! Per-class resource pools.
//!
//! Each class tracks exactly one economy. Every mutation goes through a
//! method here and is clamped to the class range before returning, so the
//! range invariant holds between any two calls.

use arrayvec::ArrayVec;

use crate::ability::{AbilityDefinition, ResourceCost};
use crate::config::CombatConfig;

use super::{CharacterClass, StoredResources};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FighterStance {
    #[default]
    None,
    Aggressive,
    Defensive,
    Balanced,
}

/// Sub-type of an attack for the Ranger combo tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackKind {
    Melee,
    Ranged,
}

/// Cooldown counter for one enemy ability.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownSlot {
    pub ability: String,
    pub remaining: u32,
}

/// Ordered enemy ability list with per-ability cooldowns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyCooldowns {
    slots: ArrayVec<CooldownSlot, { CombatConfig::MAX_ENEMY_ABILITIES }>,
}

impl EnemyCooldowns {
    /// Builds the tracker from a template's ability list. Abilities past
    /// [`CombatConfig::MAX_ENEMY_ABILITIES`] are dropped.
    pub fn from_abilities<I, S>(abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots = ArrayVec::new();
        for ability in abilities {
            let slot = CooldownSlot {
                ability: ability.into(),
                remaining: 0,
            };
            if let Err(overflow) = slots.try_push(slot) {
                let ignored = overflow.element().ability;
                tracing::warn!(
                    target: "expedition::enemy",
                    ability = %ignored,
                    "enemy ability list exceeds limit; ability ignored"
                );
            }
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[CooldownSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the first ability that is off cooldown.
    pub fn first_ready(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.remaining == 0)
    }

    pub fn start(&mut self, index: usize, cooldown: u32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.remaining = cooldown;
        }
    }

    /// Ticks every tracked ability down by one, saturating at zero.
    pub fn decrement_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.remaining = slot.remaining.saturating_sub(1);
        }
    }
}

/// Class-specific resource block; the active variant follows the class.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassResources {
    Rogue {
        sneak: i32,
    },
    Fighter {
        stance: FighterStance,
        stance_cooldown: u32,
    },
    Mage {
        mana: i32,
    },
    Cleric {
        wrath: i32,
    },
    Ranger {
        balance: i32,
        combo: u32,
        last_attack: Option<AttackKind>,
    },
    Enemy(EnemyCooldowns),
}

/// Why a participant cannot pay for an ability right now.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AffordError {
    #[error("needs {need} sneak, has {have}")]
    Sneak { need: i32, have: i32 },

    #[error("requires {required} stance, currently {current}")]
    Stance {
        required: FighterStance,
        current: FighterStance,
    },

    #[error("stance change on cooldown for {turns} more turn(s)")]
    StanceCooldown { turns: u32 },

    #[error("needs {need} mana, has {have}")]
    Mana { need: i32, have: i32 },

    #[error("needs {need} wrath, has {have}")]
    Wrath { need: i32, have: i32 },

    #[error("needs {need} balance, has {have}")]
    Balance { need: i32, have: i32 },

    #[error("balance must be {requirement} {threshold}, currently {current}")]
    BalanceThreshold {
        requirement: crate::ability::BalanceRequirementKind,
        threshold: i32,
        current: i32,
    },
}

impl ClassResources {
    /// Restores a class pool from persisted values, clamped to range.
    pub fn for_class(class: CharacterClass, stored: &StoredResources) -> Self {
        let mut resources = match class {
            CharacterClass::Rogue => Self::Rogue {
                sneak: stored.sneak,
            },
            CharacterClass::Fighter => Self::Fighter {
                stance: stored.stance,
                stance_cooldown: 0,
            },
            CharacterClass::Mage => Self::Mage { mana: stored.mana },
            CharacterClass::Cleric => Self::Cleric {
                wrath: stored.wrath,
            },
            CharacterClass::Ranger => Self::Ranger {
                balance: stored.balance,
                combo: 0,
                last_attack: None,
            },
        };
        resources.clamp();
        resources
    }

    /// Writes this pool's persistent field back into `stored`.
    pub fn store_into(&self, stored: &mut StoredResources) {
        match self {
            Self::Rogue { sneak } => stored.sneak = *sneak,
            Self::Fighter { stance, .. } => stored.stance = *stance,
            Self::Mage { mana } => stored.mana = *mana,
            Self::Cleric { wrath } => stored.wrath = *wrath,
            Self::Ranger { balance, .. } => stored.balance = *balance,
            Self::Enemy(_) => {}
        }
    }

    pub fn check_affordable(&self, ability: &AbilityDefinition) -> Result<(), AffordError> {
        let cost = &ability.cost;
        match self {
            Self::Rogue { sneak } if *sneak < cost.sneak_cost => Err(AffordError::Sneak {
                need: cost.sneak_cost,
                have: *sneak,
            }),
            Self::Fighter {
                stance,
                stance_cooldown,
            } => {
                if let Some(required) = cost.required_stance
                    && required != *stance
                {
                    return Err(AffordError::Stance {
                        required,
                        current: *stance,
                    });
                }
                match ability.grants_stance {
                    Some(next) if next != *stance && *stance_cooldown > 0 => {
                        Err(AffordError::StanceCooldown {
                            turns: *stance_cooldown,
                        })
                    }
                    _ => Ok(()),
                }
            }
            Self::Mage { mana } if *mana < cost.mana_cost => Err(AffordError::Mana {
                need: cost.mana_cost,
                have: *mana,
            }),
            Self::Cleric { wrath } if *wrath < cost.wrath_cost => Err(AffordError::Wrath {
                need: cost.wrath_cost,
                have: *wrath,
            }),
            Self::Ranger { balance, .. } => {
                if *balance < cost.balance_cost {
                    return Err(AffordError::Balance {
                        need: cost.balance_cost,
                        have: *balance,
                    });
                }
                match cost.balance_requirement {
                    Some(requirement) if !requirement.is_met(*balance) => {
                        Err(AffordError::BalanceThreshold {
                            requirement: requirement.kind,
                            threshold: requirement.threshold,
                            current: *balance,
                        })
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Pays the class-relevant part of `cost`.
    pub fn consume(&mut self, cost: &ResourceCost) {
        match self {
            Self::Rogue { sneak } => *sneak -= cost.sneak_cost,
            Self::Mage { mana } => *mana -= cost.mana_cost,
            Self::Cleric { wrath } => *wrath -= cost.wrath_cost,
            Self::Ranger { balance, .. } => *balance -= cost.balance_cost,
            Self::Fighter { .. } | Self::Enemy(_) => {}
        }
        self.clamp();
    }

    /// Grants the class-relevant gains of `ability`, including a stance change.
    pub fn grant(&mut self, ability: &AbilityDefinition, stance_cooldown_turns: u32) {
        let cost = &ability.cost;
        match self {
            Self::Rogue { sneak } => *sneak += cost.sneak_gain,
            Self::Cleric { wrath } => *wrath += cost.wrath_gain,
            Self::Ranger { balance, .. } => *balance += cost.balance_gain,
            Self::Fighter {
                stance,
                stance_cooldown,
            } => {
                if let Some(next) = ability.grants_stance
                    && next != *stance
                {
                    *stance = next;
                    *stance_cooldown = stance_cooldown_turns;
                }
            }
            Self::Mage { .. } | Self::Enemy(_) => {}
        }
        self.clamp();
    }

    /// Current combo count; zero for classes without a combo mechanic.
    pub fn combo(&self) -> u32 {
        match self {
            Self::Ranger { combo, .. } => *combo,
            _ => 0,
        }
    }

    pub fn uses_combo(&self) -> bool {
        matches!(self, Self::Ranger { .. })
    }

    /// Updates the melee/ranged alternation tracker. Returns the new combo
    /// count for combo classes.
    ///
    /// The first classified attack only records its kind. Each later attack
    /// that differs from the previous one extends the combo; a repeat resets
    /// it to zero.
    pub fn record_attack(&mut self, kind: AttackKind) -> Option<u32> {
        let Self::Ranger {
            combo, last_attack, ..
        } = self
        else {
            return None;
        };
        match *last_attack {
            Some(previous) if previous != kind => *combo += 1,
            Some(_) => *combo = 0,
            None => {}
        }
        *last_attack = Some(kind);
        Some(*combo)
    }

    /// Returns the mana actually restored.
    pub fn regenerate_mana(&mut self, amount: i32) -> i32 {
        let Self::Mage { mana } = self else {
            return 0;
        };
        let before = *mana;
        *mana = (*mana + amount.max(0)).clamp(0, CombatConfig::MANA_MAX);
        *mana - before
    }

    /// Returns the wrath actually gained.
    pub fn gain_wrath(&mut self, amount: i32) -> i32 {
        let Self::Cleric { wrath } = self else {
            return 0;
        };
        let before = *wrath;
        *wrath = (*wrath + amount.max(0)).clamp(0, CombatConfig::WRATH_MAX);
        *wrath - before
    }

    /// Start-of-turn upkeep: stance cooldown ticks down.
    pub fn on_turn_start(&mut self) {
        if let Self::Fighter {
            stance_cooldown, ..
        } = self
        {
            *stance_cooldown = stance_cooldown.saturating_sub(1);
        }
    }

    pub fn enemy_cooldowns(&self) -> Option<&EnemyCooldowns> {
        match self {
            Self::Enemy(cooldowns) => Some(cooldowns),
            _ => None,
        }
    }

    pub fn enemy_cooldowns_mut(&mut self) -> Option<&mut EnemyCooldowns> {
        match self {
            Self::Enemy(cooldowns) => Some(cooldowns),
            _ => None,
        }
    }

    fn clamp(&mut self) {
        match self {
            Self::Rogue { sneak } => *sneak = (*sneak).clamp(0, CombatConfig::SNEAK_MAX),
            Self::Mage { mana } => *mana = (*mana).clamp(0, CombatConfig::MANA_MAX),
            Self::Cleric { wrath } => *wrath = (*wrath).clamp(0, CombatConfig::WRATH_MAX),
            Self::Ranger { balance, .. } => {
                *balance = (*balance).clamp(CombatConfig::BALANCE_MIN, CombatConfig::BALANCE_MAX)
            }
            Self::Fighter { .. } | Self::Enemy(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityCategory, BalanceRequirement, BalanceRequirementKind};

    fn ability() -> AbilityDefinition {
        AbilityDefinition::new("test", AbilityCategory::Damage)
    }

    fn ranger() -> ClassResources {
        ClassResources::for_class(CharacterClass::Ranger, &StoredResources::default())
    }

    #[test]
    fn stored_values_are_clamped_on_restore() {
        let stored = StoredResources {
            sneak: 40,
            mana: 250,
            wrath: -5,
            balance: -30,
            ..StoredResources::default()
        };
        assert_eq!(
            ClassResources::for_class(CharacterClass::Rogue, &stored),
            ClassResources::Rogue { sneak: 6 }
        );
        assert_eq!(
            ClassResources::for_class(CharacterClass::Mage, &stored),
            ClassResources::Mage { mana: 100 }
        );
        assert_eq!(
            ClassResources::for_class(CharacterClass::Cleric, &stored),
            ClassResources::Cleric { wrath: 0 }
        );
        assert!(matches!(
            ClassResources::for_class(CharacterClass::Ranger, &stored),
            ClassResources::Ranger { balance: -10, .. }
        ));
    }

    #[test]
    fn resources_stay_in_range_under_any_cost_gain_sequence() {
        let mut sneak = ClassResources::Rogue { sneak: 0 };
        let mut balance = ranger();
        for step in 0..50 {
            let mut ability = ability();
            ability.cost.sneak_gain = (step % 7) * 3;
            ability.cost.sneak_cost = (step % 5) * 4;
            ability.cost.balance_gain = (step % 3) * 7;
            ability.cost.balance_cost = (step % 4) * 6;
            sneak.consume(&ability.cost);
            sneak.grant(&ability, 0);
            balance.consume(&ability.cost);
            balance.grant(&ability, 0);

            let ClassResources::Rogue { sneak: value } = &sneak else {
                unreachable!()
            };
            assert!((0..=CombatConfig::SNEAK_MAX).contains(value));
            let ClassResources::Ranger { balance: value, .. } = &balance else {
                unreachable!()
            };
            assert!((CombatConfig::BALANCE_MIN..=CombatConfig::BALANCE_MAX).contains(value));
        }
    }

    #[test]
    fn affordability_per_class() {
        let mut costly = ability();
        costly.cost.sneak_cost = 3;
        costly.cost.mana_cost = 30;
        assert_eq!(
            ClassResources::Rogue { sneak: 2 }.check_affordable(&costly),
            Err(AffordError::Sneak { need: 3, have: 2 })
        );
        assert_eq!(ClassResources::Rogue { sneak: 3 }.check_affordable(&costly), Ok(()));
        assert_eq!(
            ClassResources::Mage { mana: 29 }.check_affordable(&costly),
            Err(AffordError::Mana { need: 30, have: 29 })
        );
        // Cleric ignores rogue and mage costs.
        assert_eq!(ClassResources::Cleric { wrath: 0 }.check_affordable(&costly), Ok(()));
    }

    #[test]
    fn fighter_stance_requirement_and_cooldown() {
        let mut riposte = ability();
        riposte.cost.required_stance = Some(FighterStance::Defensive);
        let fighter = ClassResources::Fighter {
            stance: FighterStance::None,
            stance_cooldown: 0,
        };
        assert!(matches!(
            fighter.check_affordable(&riposte),
            Err(AffordError::Stance { .. })
        ));

        let mut guard = ability();
        guard.grants_stance = Some(FighterStance::Defensive);
        let mut fighter = fighter;
        fighter.grant(&guard, 2);
        assert_eq!(fighter.check_affordable(&riposte), Ok(()));

        let mut rage = ability();
        rage.grants_stance = Some(FighterStance::Aggressive);
        assert_eq!(
            fighter.check_affordable(&rage),
            Err(AffordError::StanceCooldown { turns: 2 })
        );
        fighter.on_turn_start();
        fighter.on_turn_start();
        assert_eq!(fighter.check_affordable(&rage), Ok(()));
    }

    #[test]
    fn ranger_balance_threshold() {
        let mut finisher = ability();
        finisher.cost.balance_requirement = Some(BalanceRequirement {
            kind: BalanceRequirementKind::Above,
            threshold: 2,
        });
        let mut ranger = ranger();
        assert!(matches!(
            ranger.check_affordable(&finisher),
            Err(AffordError::BalanceThreshold { current: 0, .. })
        ));
        let mut shot = ability();
        shot.cost.balance_gain = 3;
        ranger.grant(&shot, 0);
        assert_eq!(ranger.check_affordable(&finisher), Ok(()));
    }

    #[test]
    fn combo_alternation() {
        let mut ranger = ranger();
        assert_eq!(ranger.record_attack(AttackKind::Melee), Some(0));
        assert_eq!(ranger.record_attack(AttackKind::Ranged), Some(1));
        assert_eq!(ranger.record_attack(AttackKind::Melee), Some(2));
        assert_eq!(ranger.combo(), 2);

        let mut ranger = self::ranger();
        ranger.record_attack(AttackKind::Melee);
        assert_eq!(ranger.record_attack(AttackKind::Melee), Some(0));

        assert_eq!(
            ClassResources::Mage { mana: 10 }.record_attack(AttackKind::Melee),
            None
        );
    }

    #[test]
    fn mana_regen_and_wrath_gain_clamp() {
        let mut mage = ClassResources::Mage { mana: 95 };
        assert_eq!(mage.regenerate_mana(10), 5);
        assert_eq!(mage, ClassResources::Mage { mana: 100 });

        let mut cleric = ClassResources::Cleric { wrath: 98 };
        assert_eq!(cleric.gain_wrath(7), 2);
        assert_eq!(ClassResources::Rogue { sneak: 1 }.gain_wrath(7), 0);
    }

    #[test]
    fn enemy_cooldowns_pick_first_ready_and_saturate() {
        let mut cooldowns = EnemyCooldowns::from_abilities(["claw", "roar"]);
        assert_eq!(cooldowns.first_ready(), Some(0));
        cooldowns.start(0, 2);
        assert_eq!(cooldowns.first_ready(), Some(1));
        cooldowns.start(1, 1);
        assert_eq!(cooldowns.first_ready(), None);
        cooldowns.decrement_all();
        assert_eq!(cooldowns.first_ready(), Some(1));
        cooldowns.decrement_all();
        cooldowns.decrement_all();
        assert!(cooldowns.slots().iter().all(|slot| slot.remaining == 0));
    }
}
