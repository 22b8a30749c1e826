//! Per-combatant mutable record.

use crate::env::{Dice, RollContext};
use crate::env::EnemyTemplate;

use super::{
    CharacterClass, ClassResources, CombatStats, CombatantId, EffectTick, EnemyCooldowns,
    ParticipantId, ParticipantProfile, Side, StatusEffectInstance, StatusEffects,
};

/// What an enemy is worth when defeated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyBounty {
    pub coins_min: u32,
    pub coins_max: u32,
    pub experience: u32,
}

/// Outcome of a single incoming hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitOutcome {
    pub evaded: bool,
    /// Damage absorbed by defense. Reported for feedback only.
    pub blocked: i32,
    pub final_damage: i32,
    /// True only on the hit that took this combatant from alive to dead.
    pub killed: bool,
}

/// A player or enemy currently in combat.
///
/// Health stays within `[0, max_health]` and the resource block within its
/// class range across every public mutation. Death is a one-way transition:
/// a dead combatant loses its effects and ignores damage, healing and ticks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantState {
    pub id: CombatantId,
    /// Set for players only.
    pub participant: Option<ParticipantId>,
    pub name: String,
    pub side: Side,
    pub position: u8,
    pub class: Option<CharacterClass>,
    pub bounty: Option<EnemyBounty>,
    stats: CombatStats,
    resources: ClassResources,
    effects: StatusEffects,
    alive: bool,
    has_acted: bool,
}

impl CombatantState {
    pub fn new_player(
        id: CombatantId,
        profile: &ParticipantProfile,
        class: CharacterClass,
        position: u8,
    ) -> Self {
        let stats = profile.combat_stats();
        Self {
            id,
            participant: Some(profile.id.clone()),
            name: profile.display_name.clone(),
            side: Side::Player,
            position,
            class: Some(class),
            bounty: None,
            alive: stats.health > 0,
            stats,
            resources: ClassResources::for_class(class, &profile.resources),
            effects: StatusEffects::new(),
            has_acted: false,
        }
    }

    pub fn new_enemy(id: CombatantId, template: &EnemyTemplate, name: String, position: u8) -> Self {
        let stats = CombatStats::new(template.base_health, template.attributes, template.defense, 0);
        Self {
            id,
            participant: None,
            name,
            side: Side::Enemy,
            position,
            class: None,
            bounty: Some(EnemyBounty {
                coins_min: template.coin_drop_min,
                coins_max: template.coin_drop_max,
                experience: template.experience,
            }),
            stats,
            resources: ClassResources::Enemy(EnemyCooldowns::from_abilities(
                template.abilities.iter().cloned(),
            )),
            effects: StatusEffects::new(),
            alive: true,
            has_acted: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_player(&self) -> bool {
        self.side == Side::Player
    }

    pub fn has_acted(&self) -> bool {
        self.has_acted
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn health(&self) -> i32 {
        self.stats.health
    }

    pub fn max_health(&self) -> i32 {
        self.stats.max_health
    }

    pub fn resources(&self) -> &ClassResources {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ClassResources {
        &mut self.resources
    }

    pub fn effects(&self) -> &StatusEffects {
        &self.effects
    }

    /// Evasion chance in whole percent: `floor(dexterity / 5)`.
    pub fn evasion_chance(&self) -> u32 {
        (self.stats.attributes.dexterity.max(0) / 5).min(100) as u32
    }

    /// Defense after status multipliers, never negative.
    pub fn effective_defense(&self) -> i32 {
        let scaled = self.stats.defense as f32 * self.effects.defense_multiplier();
        (scaled.round() as i32).max(0)
    }

    /// Applies an incoming hit: evasion roll first, then flat defense.
    pub fn take_damage(
        &mut self,
        amount: i32,
        attacker: CombatantId,
        dice: &mut Dice<'_>,
    ) -> HitOutcome {
        if !self.alive {
            return HitOutcome::default();
        }

        let chance = self.evasion_chance();
        if chance > 0 && dice.roll_d100(self.id.0, RollContext::Evasion) <= chance {
            tracing::trace!(
                target: "expedition::combat",
                target_id = %self.id,
                %attacker,
                chance,
                "hit evaded"
            );
            return HitOutcome {
                evaded: true,
                ..HitOutcome::default()
            };
        }

        let incoming = amount.max(0);
        let final_damage = (incoming - self.effective_defense()).max(0);
        let killed = self.lose_health(final_damage);
        HitOutcome {
            evaded: false,
            blocked: incoming - final_damage,
            final_damage,
            killed,
        }
    }

    /// Restores up to `amount` health and returns what was actually healed.
    pub fn heal(&mut self, amount: i32, healer: CombatantId) -> i32 {
        if !self.alive || amount <= 0 {
            return 0;
        }
        let healed = amount.min(self.stats.max_health - self.stats.health);
        self.stats.health += healed;
        tracing::trace!(target: "expedition::combat", target_id = %self.id, %healer, healed, "healed");
        healed
    }

    /// Returns false when the combatant is dead and the effect was dropped.
    pub fn apply_effect(&mut self, effect: StatusEffectInstance) -> bool {
        if !self.alive {
            return false;
        }
        self.effects.add(effect);
        true
    }

    /// Ticks every effect in application order.
    ///
    /// Damage-over-time bypasses evasion and defense. Ticking stops at the
    /// effect that kills the bearer.
    pub fn tick_effects(&mut self) -> Vec<EffectTick> {
        let mut ticks = Vec::new();
        let mut index = 0;
        while self.alive {
            let Some(effect) = self.effects.get(index) else {
                break;
            };
            let name = effect.name.clone();
            let over_time = effect.damage_over_time;

            let (damage, healed) = match over_time {
                dot if dot > 0 => {
                    let before = self.stats.health;
                    self.lose_health(dot);
                    (before - self.stats.health, 0)
                }
                regen if regen < 0 => (0, self.heal(-regen, self.id)),
                _ => (0, 0),
            };

            if !self.alive {
                ticks.push(EffectTick {
                    name,
                    damage,
                    healed,
                    expired: true,
                });
                break;
            }

            let expired = self.effects.count_down(index);
            if !expired {
                index += 1;
            }
            ticks.push(EffectTick {
                name,
                damage,
                healed,
                expired,
            });
        }
        ticks
    }

    pub fn reset_turn_flags(&mut self) {
        self.has_acted = false;
    }

    pub(crate) fn mark_acted(&mut self) {
        self.has_acted = true;
    }

    /// Drops health by `amount`; returns true on the killing blow only.
    fn lose_health(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.stats.health = (self.stats.health - amount.max(0)).max(0);
        if self.stats.health == 0 {
            self.alive = false;
            self.effects.clear();
            return true;
        }
        false
    }
}
