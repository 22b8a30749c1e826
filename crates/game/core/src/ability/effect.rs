use crate::state::StatusEffectInstance;

/// Template for a timed status effect.
///
/// Each successful application instantiates an independent
/// [`StatusEffectInstance`] with its own duration counter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectTemplate {
    pub name: String,
    /// Number of effect ticks before the instance expires.
    pub duration: u32,
    /// Multiplies the bearer's outgoing damage.
    pub damage_multiplier: f32,
    /// Multiplies the bearer's defense.
    pub defense_multiplier: f32,
    /// Health lost per tick; negative values restore health instead.
    pub damage_over_time: i32,
}

impl Default for EffectTemplate {
    fn default() -> Self {
        Self {
            name: String::new(),
            duration: 1,
            damage_multiplier: 1.0,
            defense_multiplier: 1.0,
            damage_over_time: 0,
        }
    }
}

impl EffectTemplate {
    pub fn instantiate(&self) -> StatusEffectInstance {
        StatusEffectInstance {
            name: self.name.clone(),
            remaining: self.duration,
            damage_multiplier: self.damage_multiplier,
            defense_multiplier: self.defense_multiplier,
            damage_over_time: self.damage_over_time,
        }
    }
}
