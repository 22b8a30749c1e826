//! Immutable ability definitions authored outside the engine.
//!
//! An [`AbilityDefinition`] is plain value data: the catalog hands out shared
//! references and nothing in the engine ever mutates one. Behaviour lives in
//! [`crate::resolve::ActionResolver`], never on the data itself.
mod cost;
mod effect;
mod targeting;

pub use cost::{BalanceRequirement, BalanceRequirementKind, ResourceCost};
pub use effect::EffectTemplate;
pub use targeting::{TargetFlags, TargetKind, TargetRule};

use crate::state::{AttackKind, Attributes, CharacterClass, FighterStance};

/// Broad routing of an ability inside a resolution pass.
///
/// Declaration order is the resolution order: every Buff resolves before any
/// Heal, and every Heal before any Damage.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AbilityCategory {
    Buff,
    Heal,
    Damage,
}

/// Attribute an ability scales with.
///
/// Content may name a stat the engine does not know; it deserializes to
/// [`ScalingStat::Unrecognized`] and resolution falls back to the caster's
/// primary offensive stat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ScalingStat {
    #[default]
    Strength,
    Constitution,
    Dexterity,
    Willpower,
    Charisma,
    Intelligence,
    #[cfg_attr(feature = "serde", serde(other))]
    Unrecognized,
}

impl ScalingStat {
    /// Reads this stat from an attribute block, `None` when unrecognized.
    pub fn read(self, attributes: &Attributes) -> Option<i32> {
        match self {
            Self::Strength => Some(attributes.strength),
            Self::Constitution => Some(attributes.constitution),
            Self::Dexterity => Some(attributes.dexterity),
            Self::Willpower => Some(attributes.willpower),
            Self::Charisma => Some(attributes.charisma),
            Self::Intelligence => Some(attributes.intelligence),
            Self::Unrecognized => None,
        }
    }
}

/// A named action usable by one class, or by enemies when `required_class`
/// is `None`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityDefinition {
    /// Display name used in events ("Quick Cut").
    pub name: String,
    /// Command key typed by participants ("quickcut"). Matched case-insensitively.
    pub command: String,
    pub description: String,
    pub required_class: Option<CharacterClass>,
    pub category: AbilityCategory,
    pub target: TargetRule,
    pub scaling_stat: ScalingStat,
    pub multiplier: f32,
    /// Added after scaling. Doubles as the heal amount for Heal abilities.
    pub flat_bonus: i32,
    pub cost: ResourceCost,
    /// Stance a Fighter adopts after resolving this ability.
    pub grants_stance: Option<FighterStance>,
    /// Turns before an enemy may pick this ability again. Ignored for players.
    pub cooldown: u32,
    pub effects: Vec<EffectTemplate>,
}

impl Default for AbilityDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            command: String::new(),
            description: String::new(),
            required_class: None,
            category: AbilityCategory::Damage,
            target: TargetRule::default(),
            scaling_stat: ScalingStat::Strength,
            multiplier: 1.0,
            flat_bonus: 0,
            cost: ResourceCost::default(),
            grants_stance: None,
            cooldown: 0,
            effects: Vec::new(),
        }
    }
}

impl AbilityDefinition {
    /// Creates a single-target enemy-facing damage ability with unit scaling.
    pub fn new(command: impl Into<String>, category: AbilityCategory) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            category,
            ..Self::default()
        }
    }

    pub fn targets_self(&self) -> bool {
        self.target.kind == TargetKind::SelfOnly
    }

    /// Melee/ranged classification used by the Ranger combo tracker.
    ///
    /// Spending balance marks a melee strike, gaining it a ranged one.
    pub fn attack_kind(&self) -> Option<AttackKind> {
        if self.cost.balance_cost > 0 {
            Some(AttackKind::Melee)
        } else if self.cost.balance_gain > 0 {
            Some(AttackKind::Ranged)
        } else {
            None
        }
    }

    /// `round(stat * multiplier + flat_bonus)`.
    pub fn scaled_amount(&self, stat_value: i32) -> i32 {
        (stat_value as f32 * self.multiplier + self.flat_bonus as f32).round() as i32
    }

    pub fn usable_by(&self, class: Option<CharacterClass>) -> bool {
        self.required_class == class
    }
}
