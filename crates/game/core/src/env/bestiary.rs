//! Enemy templates and difficulty tables.

use crate::state::Attributes;

/// Behavioural archetype of an enemy. Informational for now: the decision
/// procedure targets the front-most player regardless of role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EnemyRole {
    #[default]
    Minion,
    Assassin,
    Ranged,
    Controller,
    Mastermind,
    Boss,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnemyTemplate {
    pub name: String,
    pub role: EnemyRole,
    pub base_health: i32,
    pub attributes: Attributes,
    pub defense: i32,
    /// Ability commands in priority order.
    pub abilities: Vec<String>,
    pub coin_drop_min: u32,
    pub coin_drop_max: u32,
    pub experience: u32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: EnemyRole::Minion,
            base_health: 50,
            attributes: Attributes::uniform(5),
            defense: 0,
            abilities: Vec::new(),
            coin_drop_min: 10,
            coin_drop_max: 50,
            experience: 25,
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
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Deadly,
}

/// One wave: a random regular count in `min..=max` plus fixed bosses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WaveSpec {
    pub min_enemies: u32,
    pub max_enemies: u32,
    pub bosses: u32,
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            min_enemies: 1,
            max_enemies: 3,
            bosses: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifficultyProfile {
    pub difficulty: Difficulty,
    pub waves: Vec<WaveSpec>,
    /// Regular enemy template names drawn from uniformly.
    pub enemy_pool: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub boss_pool: Vec<String>,
    pub coin_reward_min: u32,
    pub coin_reward_max: u32,
    pub xp_multiplier: f32,
}

/// Oracle providing enemy templates and per-difficulty encounter tables.
pub trait BestiaryOracle: Send + Sync {
    fn enemy(&self, name: &str) -> Option<&EnemyTemplate>;

    fn difficulty(&self, difficulty: Difficulty) -> Option<&DifficultyProfile>;
}

#[derive(Clone, Debug, Default)]
pub struct Bestiary {
    enemies: Vec<EnemyTemplate>,
    difficulties: Vec<DifficultyProfile>,
}

impl Bestiary {
    pub fn new(enemies: Vec<EnemyTemplate>, difficulties: Vec<DifficultyProfile>) -> Self {
        Self {
            enemies,
            difficulties,
        }
    }

    pub fn enemies(&self) -> &[EnemyTemplate] {
        &self.enemies
    }

    pub fn difficulties(&self) -> &[DifficultyProfile] {
        &self.difficulties
    }
}

impl BestiaryOracle for Bestiary {
    fn enemy(&self, name: &str) -> Option<&EnemyTemplate> {
        self.enemies
            .iter()
            .find(|template| template.name.eq_ignore_ascii_case(name))
    }

    fn difficulty(&self, difficulty: Difficulty) -> Option<&DifficultyProfile> {
        self.difficulties
            .iter()
            .find(|profile| profile.difficulty == difficulty)
    }
}
