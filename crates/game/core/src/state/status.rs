//! Timed status effects.
//!
//! Effects count down in whole ticks. A tick applies the effect's
//! damage-over-time first and then decrements the counter; an effect whose
//! counter reaches zero is removed in that same tick.

/// A live copy of an [`crate::ability::EffectTemplate`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffectInstance {
    pub name: String,
    pub remaining: u32,
    pub damage_multiplier: f32,
    pub defense_multiplier: f32,
    pub damage_over_time: i32,
}

/// Result of ticking one effect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTick {
    pub name: String,
    pub damage: i32,
    pub healed: i32,
    pub expired: bool,
}

/// Active effects on one combatant, in application order.
///
/// Applying the same template twice stacks two independent instances.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: Vec<StatusEffectInstance>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: StatusEffectInstance) {
        self.effects.push(effect);
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffectInstance> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.iter().any(|effect| effect.name.eq_ignore_ascii_case(name))
    }

    /// Product of every active outgoing-damage multiplier.
    pub fn damage_multiplier(&self) -> f32 {
        self.effects.iter().map(|effect| effect.damage_multiplier).product()
    }

    /// Product of every active defense multiplier.
    pub fn defense_multiplier(&self) -> f32 {
        self.effects.iter().map(|effect| effect.defense_multiplier).product()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&StatusEffectInstance> {
        self.effects.get(index)
    }

    /// Decrements the effect at `index`, removing it when the counter hits
    /// zero. Returns whether it expired.
    pub(crate) fn count_down(&mut self, index: usize) -> bool {
        let Some(effect) = self.effects.get_mut(index) else {
            return false;
        };
        effect.remaining = effect.remaining.saturating_sub(1);
        if effect.remaining == 0 {
            self.effects.remove(index);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(name: &str, remaining: u32, damage: f32) -> StatusEffectInstance {
        StatusEffectInstance {
            name: name.to_owned(),
            remaining,
            damage_multiplier: damage,
            defense_multiplier: 1.0,
            damage_over_time: 0,
        }
    }

    #[test]
    fn multipliers_compose_multiplicatively() {
        let mut effects = StatusEffects::new();
        assert_eq!(effects.damage_multiplier(), 1.0);
        effects.add(effect("rage", 2, 1.5));
        effects.add(effect("rage", 2, 2.0));
        assert_eq!(effects.damage_multiplier(), 3.0);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn count_down_removes_on_zero() {
        let mut effects = StatusEffects::new();
        effects.add(effect("haste", 2, 1.0));
        assert!(!effects.count_down(0));
        assert!(effects.count_down(0));
        assert!(effects.is_empty());
    }
}
