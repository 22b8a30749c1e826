//! Action resolution.
//!
//! [`ActionResolver::resolve`] applies one ability from one caster in a fixed
//! order: pay cost, apply the category effect, grant gains, apply status
//! effects, update the combo tracker. The resolver keeps no state between
//! calls; everything it changes lives in the [`Roster`].
mod outcome;

pub use outcome::{ActionOutcome, TargetEffect, TargetOutcome};

use crate::ability::{AbilityCategory, AbilityDefinition};
use crate::config::CombatConfig;
use crate::env::Dice;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{CharacterClass, CombatantId, CombatantState, Roster, Side};

/// Why a resolution was abandoned before any mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveAbort {
    #[error("caster {0} is not in combat")]
    MissingCaster(CombatantId),

    #[error("caster {0} is dead")]
    CasterDead(CombatantId),

    #[error("target {0} is not in combat")]
    MissingTarget(CombatantId),

    #[error("target {0} is dead")]
    TargetDead(CombatantId),
}

impl GameError for ResolveAbort {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingCaster(_) | Self::MissingTarget(_) => ErrorSeverity::Internal,
            Self::CasterDead(_) | Self::TargetDead(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCaster(_) => "RESOLVE_MISSING_CASTER",
            Self::CasterDead(_) => "RESOLVE_CASTER_DEAD",
            Self::MissingTarget(_) => "RESOLVE_MISSING_TARGET",
            Self::TargetDead(_) => "RESOLVE_TARGET_DEAD",
        }
    }
}

pub struct ActionResolver<'a> {
    config: &'a CombatConfig,
}

impl<'a> ActionResolver<'a> {
    pub fn new(config: &'a CombatConfig) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        roster: &mut Roster,
        caster: CombatantId,
        target: CombatantId,
        ability: &AbilityDefinition,
        dice: &mut Dice<'_>,
    ) -> Result<ActionOutcome, ResolveAbort> {
        let caster_state = roster.get(caster).ok_or(ResolveAbort::MissingCaster(caster))?;
        if !caster_state.is_alive() {
            return Err(ResolveAbort::CasterDead(caster));
        }
        let target_state = roster.get(target).ok_or(ResolveAbort::MissingTarget(target))?;
        if !target_state.is_alive() {
            return Err(ResolveAbort::TargetDead(target));
        }

        let opposing = target_state.side != caster_state.side;
        let group = if ability.target.is_aoe() && !ability.targets_self() {
            let reach = opposing.then_some(&ability.target);
            roster.splash_group(target, ability.target.aoe_targets as usize, reach)
        } else {
            vec![target]
        };
        let base = ability.scaled_amount(scaling_value(caster_state, ability));

        if let Some(state) = roster.get_mut(caster) {
            state.resources_mut().consume(&ability.cost);
        }

        let mut targets = Vec::with_capacity(group.len());
        let mut wrath = Vec::new();
        match ability.category {
            AbilityCategory::Damage => {
                let amount = outgoing_damage(roster.get(caster), base);
                for id in group {
                    let Some(state) = roster.get_mut(id).filter(|s| s.is_alive()) else {
                        continue;
                    };
                    let hit = state.take_damage(amount, caster, dice);
                    if state.is_player() && hit.final_damage > 0 {
                        wrath.extend(grant_wrath_from_suffering(
                            roster,
                            hit.final_damage,
                            self.config.wrath_from_damage_percent,
                        ));
                    }
                    targets.push(TargetOutcome::new(id, TargetEffect::Damage(hit)));
                }
            }
            AbilityCategory::Heal => {
                for id in group {
                    let Some(state) = roster.get_mut(id).filter(|s| s.is_alive()) else {
                        continue;
                    };
                    let amount = state.heal(base, caster);
                    targets.push(TargetOutcome::new(id, TargetEffect::Heal { amount }));
                }
            }
            AbilityCategory::Buff => {
                targets.extend(group.into_iter().map(|id| TargetOutcome::new(id, TargetEffect::Buff)));
            }
        }

        if let Some(state) = roster.get_mut(caster) {
            state
                .resources_mut()
                .grant(ability, self.config.stance_cooldown_turns);
        }

        if !ability.effects.is_empty() {
            for outcome in targets.iter_mut().filter(|o| !o.evaded()) {
                let Some(state) = roster.get_mut(outcome.target) else {
                    continue;
                };
                for template in &ability.effects {
                    if state.apply_effect(template.instantiate()) {
                        outcome.applied.push(template.name.clone());
                    }
                }
            }
        }

        let combo = match (ability.attack_kind(), roster.get_mut(caster)) {
            (Some(kind), Some(state)) => state.resources_mut().record_attack(kind),
            _ => None,
        };

        if let Some(state) = roster.get_mut(caster) {
            state.mark_acted();
        }

        tracing::debug!(
            target: "expedition::resolve",
            %caster,
            ability = %ability.command,
            targets = targets.len(),
            "action resolved"
        );

        Ok(ActionOutcome {
            caster,
            ability: ability.name.clone(),
            category: ability.category,
            targets,
            combo,
            wrath,
        })
    }
}

/// Damage after combo and status multipliers, rounded once at the end.
fn outgoing_damage(caster: Option<&CombatantState>, base: i32) -> i32 {
    let Some(caster) = caster else {
        return base.max(0);
    };
    let mut amount = base as f32;
    let combo = caster.resources().combo();
    if caster.resources().uses_combo() && combo > 0 {
        amount *= 1.0 + 0.2 * combo as f32;
    }
    amount *= caster.effects().damage_multiplier();
    (amount.round() as i32).max(0)
}

fn scaling_value(caster: &CombatantState, ability: &AbilityDefinition) -> i32 {
    let attributes = &caster.stats().attributes;
    if let Some(value) = ability.scaling_stat.read(attributes) {
        return value;
    }
    let fallback = caster
        .class
        .map_or(crate::ability::ScalingStat::Strength, CharacterClass::primary_stat);
    tracing::warn!(
        target: "expedition::resolve",
        ability = %ability.command,
        %fallback,
        "unrecognized scaling stat; using primary stat"
    );
    fallback.read(attributes).unwrap_or(attributes.strength)
}

/// Every living Cleric gains a share of damage a player just suffered.
/// Returns the wrath actually gained per Cleric.
pub(crate) fn grant_wrath_from_suffering(
    roster: &mut Roster,
    damage: i32,
    percent: u32,
) -> Vec<(CombatantId, i32)> {
    let share = damage.max(0) * percent as i32 / 100;
    if share == 0 {
        return Vec::new();
    }
    let clerics: Vec<_> = roster
        .living(Side::Player)
        .into_iter()
        .filter(|c| c.class == Some(CharacterClass::Cleric))
        .map(|c| c.id)
        .collect();
    clerics
        .into_iter()
        .filter_map(|id| {
            let gained = roster.get_mut(id)?.resources_mut().gain_wrath(share);
            (gained > 0).then_some((id, gained))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{EffectTemplate, ScalingStat};
    use crate::env::{AbilityOracle, EnemyTemplate, PcgRng};
    use crate::state::{Attributes, ClassResources, ParticipantProfile};
    use crate::test_support::{catalog, goblin, profile};

    fn seat(roster: &mut Roster, profile: ParticipantProfile, position: u8) -> CombatantId {
        let id = roster.allocate_id();
        let class = profile.class.expect("test profiles carry a class");
        roster.insert(CombatantState::new_player(id, &profile, class, position));
        id
    }

    fn spawn(roster: &mut Roster, template: &EnemyTemplate, position: u8) -> CombatantId {
        let id = roster.allocate_id();
        let name = format!("{} {position}", template.name);
        roster.insert(CombatantState::new_enemy(id, template, name, position));
        id
    }

    fn ranger() -> ParticipantProfile {
        let mut ranger = profile("robin", CharacterClass::Ranger);
        ranger.attributes.dexterity = 10;
        ranger
    }

    #[test]
    fn damage_scales_with_the_ability_stat() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let fighter = seat(&mut roster, profile("ada", CharacterClass::Fighter), 1);
        let foe = spawn(&mut roster, &goblin(20), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let strike = catalog.lookup("strike").unwrap();
        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, fighter, foe, strike, &mut dice)
            .unwrap();

        assert_eq!(outcome.damage_dealt(), 13);
        assert_eq!(roster.get(foe).unwrap().health(), 7);
        assert!(roster.get(fighter).unwrap().has_acted());
    }

    #[test]
    fn alternating_attacks_build_a_combo_that_amplifies_damage() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let archer = seat(&mut roster, ranger(), 1);
        let foe = spawn(&mut roster, &goblin(200), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);
        let resolver = ActionResolver::new(&config);

        let mut results = Vec::new();
        for command in ["shot", "lunge", "shot"] {
            let ability = catalog.lookup(command).unwrap();
            let outcome = resolver
                .resolve(&mut roster, archer, foe, ability, &mut dice)
                .unwrap();
            results.push((outcome.combo, outcome.damage_dealt()));
        }

        assert_eq!(results, [(Some(0), 10), (Some(1), 12), (Some(2), 12)]);
    }

    #[test]
    fn repeating_an_attack_kind_resets_the_combo() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let archer = seat(&mut roster, ranger(), 1);
        let foe = spawn(&mut roster, &goblin(200), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);
        let resolver = ActionResolver::new(&config);

        let mut combos = Vec::new();
        for command in ["shot", "lunge", "lunge"] {
            let ability = catalog.lookup(command).unwrap();
            let outcome = resolver
                .resolve(&mut roster, archer, foe, ability, &mut dice)
                .unwrap();
            combos.push(outcome.combo);
        }

        assert_eq!(combos, [Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn dead_target_aborts_before_paying_the_cost() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let mage = seat(&mut roster, profile("merlin", CharacterClass::Mage), 1);
        let foe = spawn(&mut roster, &goblin(5), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);
        roster.get_mut(foe).unwrap().take_damage(50, mage, &mut dice);

        let bolt = catalog.lookup("bolt").unwrap();
        let result = ActionResolver::new(&config).resolve(&mut roster, mage, foe, bolt, &mut dice);

        assert_eq!(result, Err(ResolveAbort::TargetDead(foe)));
        assert_eq!(
            roster.get(mage).unwrap().resources(),
            &ClassResources::Mage { mana: 100 }
        );
    }

    #[test]
    fn evaded_hits_apply_no_effects() {
        let config = CombatConfig::default();
        let mut roster = Roster::new();
        let rogue = seat(&mut roster, profile("vex", CharacterClass::Rogue), 1);
        let dodger = EnemyTemplate {
            attributes: Attributes {
                dexterity: 500,
                ..Attributes::uniform(5)
            },
            ..goblin(30)
        };
        let foe = spawn(&mut roster, &dodger, 1);
        let venom = AbilityDefinition {
            effects: vec![EffectTemplate {
                name: "Poisoned".into(),
                duration: 3,
                damage_over_time: 2,
                ..EffectTemplate::default()
            }],
            ..AbilityDefinition::new("venom", AbilityCategory::Damage)
        };
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, rogue, foe, &venom, &mut dice)
            .unwrap();

        assert!(outcome.targets[0].evaded());
        assert!(outcome.targets[0].applied.is_empty());
        assert!(roster.get(foe).unwrap().effects().is_empty());
        assert_eq!(roster.get(foe).unwrap().health(), 30);
    }

    #[test]
    fn each_application_adds_an_independent_effect() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let fighter = seat(&mut roster, profile("ada", CharacterClass::Fighter), 1);
        let foe = spawn(&mut roster, &goblin(100), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);
        let resolver = ActionResolver::new(&config);

        let rally = catalog.lookup("rally").unwrap();
        for _ in 0..2 {
            let outcome = resolver
                .resolve(&mut roster, fighter, fighter, rally, &mut dice)
                .unwrap();
            assert_eq!(outcome.targets[0].applied, ["Rallied"]);
        }
        assert_eq!(roster.get(fighter).unwrap().effects().len(), 2);

        let strike = catalog.lookup("strike").unwrap();
        let outcome = resolver
            .resolve(&mut roster, fighter, foe, strike, &mut dice)
            .unwrap();
        // 13 * 1.5 * 1.5 = 29.25
        assert_eq!(outcome.damage_dealt(), 29);
    }

    #[test]
    fn heals_never_exceed_max_health() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let mut wounded = profile("ada", CharacterClass::Fighter);
        let max = wounded.combat_stats().max_health;
        wounded.health = Some(max - 4);
        let fighter = seat(&mut roster, wounded, 1);
        let cleric = seat(&mut roster, profile("hild", CharacterClass::Cleric), 2);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let mend = catalog.lookup("mend").unwrap();
        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, cleric, fighter, mend, &mut dice)
            .unwrap();

        assert_eq!(outcome.healing_done(), 4);
        assert_eq!(roster.get(fighter).unwrap().health(), max);
    }

    #[test]
    fn area_abilities_splash_down_the_line() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let mage = seat(&mut roster, profile("merlin", CharacterClass::Mage), 1);
        let foes: Vec<_> = (1..=4)
            .map(|position| spawn(&mut roster, &goblin(30), position))
            .collect();
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let inferno = catalog.lookup("inferno").unwrap();
        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, mage, foes[0], inferno, &mut dice)
            .unwrap();

        let hit: Vec<_> = outcome.targets.iter().map(|t| t.target).collect();
        assert_eq!(hit, foes[..3]);
        assert_eq!(roster.get(foes[3]).unwrap().health(), 30);
        assert_eq!(
            roster.get(mage).unwrap().resources(),
            &ClassResources::Mage { mana: 40 }
        );
    }

    #[test]
    fn unrecognized_stat_falls_back_to_primary_stat() {
        let config = CombatConfig::default();
        let mut roster = Roster::new();
        let mut mage_profile = profile("merlin", CharacterClass::Mage);
        mage_profile.attributes.intelligence = 17;
        let mage = seat(&mut roster, mage_profile, 1);
        let foe = spawn(&mut roster, &goblin(50), 1);
        let odd = AbilityDefinition {
            scaling_stat: ScalingStat::Unrecognized,
            ..AbilityDefinition::new("odd", AbilityCategory::Damage)
        };
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, mage, foe, &odd, &mut dice)
            .unwrap();

        assert_eq!(outcome.damage_dealt(), 17);
    }

    #[test]
    fn clerics_gain_wrath_when_players_are_hurt() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let mut roster = Roster::new();
        let fighter = seat(&mut roster, profile("ada", CharacterClass::Fighter), 1);
        let cleric = seat(&mut roster, profile("hild", CharacterClass::Cleric), 2);
        let foe = spawn(&mut roster, &goblin(20), 1);
        let rng = PcgRng;
        let mut nonce = 0;
        let mut dice = Dice::new(&rng, 7, &mut nonce);

        let claw = catalog.lookup("claw").unwrap();
        let outcome = ActionResolver::new(&config)
            .resolve(&mut roster, foe, fighter, claw, &mut dice)
            .unwrap();

        // goblin strength 5 * 1.0 + 1
        assert_eq!(outcome.damage_dealt(), 6);
        assert_eq!(outcome.wrath, [(cleric, 3)]);
        assert_eq!(
            roster.get(cleric).unwrap().resources(),
            &ClassResources::Cleric { wrath: 3 }
        );
    }
}
