//! Shared fixtures for unit tests.

use crate::ability::{
    AbilityCategory, AbilityDefinition, EffectTemplate, ResourceCost, ScalingStat, TargetRule,
};
use crate::env::{
    AbilityCatalog, Bestiary, CombatEnv, Difficulty, DifficultyProfile, EnemyTemplate, PcgRng,
    WaveSpec,
};
use crate::state::{Attributes, CharacterClass, ParticipantProfile};

/// Attributes with zero dexterity so hits are never evaded.
pub(crate) fn steady_attributes(value: i32) -> Attributes {
    Attributes {
        dexterity: 0,
        ..Attributes::uniform(value)
    }
}

pub(crate) fn profile(id: &str, class: CharacterClass) -> ParticipantProfile {
    let mut profile = ParticipantProfile::new(id, id, class);
    profile.attributes = steady_attributes(10);
    profile
}

pub(crate) fn ability(
    command: &str,
    class: Option<CharacterClass>,
    category: AbilityCategory,
    stat: ScalingStat,
    multiplier: f32,
    flat_bonus: i32,
) -> AbilityDefinition {
    AbilityDefinition {
        required_class: class,
        scaling_stat: stat,
        multiplier,
        flat_bonus,
        ..AbilityDefinition::new(command, category)
    }
}

pub(crate) fn catalog() -> AbilityCatalog {
    use AbilityCategory::*;
    use CharacterClass::*;

    let mut quickcut = ability("quickcut", Some(Rogue), Damage, ScalingStat::Dexterity, 1.0, 2);
    quickcut.cost = ResourceCost {
        sneak_gain: 1,
        ..ResourceCost::default()
    };
    let strike = ability("strike", Some(Fighter), Damage, ScalingStat::Strength, 1.0, 3);
    let mut bolt = ability("bolt", Some(Mage), Damage, ScalingStat::Intelligence, 1.0, 0);
    bolt.cost.mana_cost = 5;
    let mut crush = ability("crush", Some(Cleric), Damage, ScalingStat::Willpower, 1.0, 2);
    crush.cost.wrath_gain = 5;
    let mut shot = ability("shot", Some(Ranger), Damage, ScalingStat::Dexterity, 1.0, 0);
    shot.cost.balance_gain = 1;
    let mut lunge = ability("lunge", Some(Ranger), Damage, ScalingStat::Dexterity, 1.0, 2);
    lunge.cost.balance_cost = 1;

    let mut mend = ability("mend", Some(Cleric), Heal, ScalingStat::Willpower, 1.0, 10);
    mend.target = TargetRule::ally();
    let mut rally = ability("rally", Some(Fighter), Buff, ScalingStat::Strength, 0.0, 0);
    rally.target = TargetRule::self_only();
    rally.effects = vec![EffectTemplate {
        name: "Rallied".into(),
        duration: 2,
        damage_multiplier: 1.5,
        ..EffectTemplate::default()
    }];
    let mut inferno = ability("inferno", Some(Mage), Damage, ScalingStat::Intelligence, 1.0, 0);
    inferno.cost.mana_cost = 60;
    inferno.target.aoe_targets = 3;

    let claw = ability("claw", None, Damage, ScalingStat::Strength, 1.0, 1);
    let mut roar = ability("roar", None, Damage, ScalingStat::Strength, 2.0, 0);
    roar.cooldown = 2;

    AbilityCatalog::from_definitions([
        quickcut, strike, bolt, crush, shot, lunge, mend, rally, inferno, claw, roar,
    ])
}

pub(crate) fn goblin(health: i32) -> EnemyTemplate {
    EnemyTemplate {
        name: "Goblin".into(),
        base_health: health,
        attributes: steady_attributes(5),
        abilities: vec!["claw".into()],
        coin_drop_min: 10,
        coin_drop_max: 10,
        experience: 20,
        ..EnemyTemplate::default()
    }
}

/// Easy: two waves of exactly one goblin. Hard: one wave of two goblins and
/// an ogre boss.
pub(crate) fn bestiary() -> Bestiary {
    let ogre = EnemyTemplate {
        name: "Ogre".into(),
        base_health: 80,
        attributes: steady_attributes(8),
        abilities: vec!["roar".into(), "claw".into()],
        ..goblin(80)
    };
    Bestiary::new(
        vec![goblin(20), ogre],
        vec![
            DifficultyProfile {
                difficulty: Difficulty::Easy,
                waves: vec![
                    WaveSpec {
                        min_enemies: 1,
                        max_enemies: 1,
                        bosses: 0,
                    };
                    2
                ],
                enemy_pool: vec!["Goblin".into()],
                boss_pool: Vec::new(),
                coin_reward_min: 5,
                coin_reward_max: 5,
                xp_multiplier: 1.0,
            },
            DifficultyProfile {
                difficulty: Difficulty::Hard,
                waves: vec![WaveSpec {
                    min_enemies: 2,
                    max_enemies: 2,
                    bosses: 1,
                }],
                enemy_pool: vec!["Goblin".into()],
                boss_pool: vec!["Ogre".into()],
                coin_reward_min: 20,
                coin_reward_max: 20,
                xp_multiplier: 2.0,
            },
        ],
    )
}

pub(crate) struct Fixture {
    pub catalog: AbilityCatalog,
    pub bestiary: Bestiary,
    pub rng: PcgRng,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            catalog: catalog(),
            bestiary: bestiary(),
            rng: PcgRng,
        }
    }

    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(&self.catalog, &self.bestiary, &self.rng)
    }
}
