//! Combat configuration constants and tunable parameters.

use core::time::Duration;

use crate::error::{ErrorSeverity, GameError};

/// Encounter timing, party limits, and resource tuning.
///
/// Durations are stored as plain integers so the struct reads naturally from
/// TOML; use the accessor methods to get [`Duration`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Join window, started by the first participant.
    pub join_timer_secs: u64,
    /// Player intake window per turn.
    pub turn_timer_secs: u64,
    /// Pause between a cleared wave and the next spawn.
    pub rest_interval_secs: u64,
    /// Delay between consecutive player actions in a resolution pass.
    pub action_pacing_ms: u64,
    /// Delay between consecutive enemy actions.
    pub enemy_pacing_ms: u64,
    pub max_party_size: usize,
    pub max_enemy_positions: usize,
    /// Admit participants while a turn is open or during rest.
    pub allow_late_join: bool,
    /// Percent of intelligence a Mage regains as mana per turn.
    pub mana_regen_percent: u32,
    /// Turns a Fighter must wait between stance changes.
    pub stance_cooldown_turns: u32,
    /// Percent of damage taken by any player that living Clerics gain as wrath.
    pub wrath_from_damage_percent: u32,
}

impl CombatConfig {
    // ===== compile-time limits =====
    pub const MAX_PARTY_SIZE: usize = 8;
    pub const MAX_ENEMY_POSITIONS: usize = 6;
    pub const MAX_ENEMY_ABILITIES: usize = 8;

    pub const SNEAK_MAX: i32 = 6;
    pub const MANA_MAX: i32 = 100;
    pub const WRATH_MAX: i32 = 100;
    pub const BALANCE_MIN: i32 = -10;
    pub const BALANCE_MAX: i32 = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_JOIN_TIMER_SECS: u64 = 60;
    pub const DEFAULT_TURN_TIMER_SECS: u64 = 45;
    pub const DEFAULT_REST_INTERVAL_SECS: u64 = 5;
    pub const DEFAULT_ACTION_PACING_MS: u64 = 500;
    pub const DEFAULT_ENEMY_PACING_MS: u64 = 500;
    pub const DEFAULT_PARTY_SIZE: usize = 4;

    pub fn new() -> Self {
        Self {
            join_timer_secs: Self::DEFAULT_JOIN_TIMER_SECS,
            turn_timer_secs: Self::DEFAULT_TURN_TIMER_SECS,
            rest_interval_secs: Self::DEFAULT_REST_INTERVAL_SECS,
            action_pacing_ms: Self::DEFAULT_ACTION_PACING_MS,
            enemy_pacing_ms: Self::DEFAULT_ENEMY_PACING_MS,
            max_party_size: Self::DEFAULT_PARTY_SIZE,
            max_enemy_positions: Self::MAX_ENEMY_POSITIONS,
            allow_late_join: true,
            mana_regen_percent: 10,
            stance_cooldown_turns: 2,
            wrath_from_damage_percent: 50,
        }
    }

    /// Configuration with every pacing delay removed, so a single
    /// `advance(Duration::ZERO)` plays a whole resolution pass.
    pub fn unpaced() -> Self {
        Self {
            action_pacing_ms: 0,
            enemy_pacing_ms: 0,
            rest_interval_secs: 0,
            ..Self::new()
        }
    }

    pub fn join_timer(&self) -> Duration {
        Duration::from_secs(self.join_timer_secs)
    }

    pub fn turn_timer(&self) -> Duration {
        Duration::from_secs(self.turn_timer_secs)
    }

    pub fn rest_interval(&self) -> Duration {
        Duration::from_secs(self.rest_interval_secs)
    }

    pub fn action_pacing(&self) -> Duration {
        Duration::from_millis(self.action_pacing_ms)
    }

    pub fn enemy_pacing(&self) -> Duration {
        Duration::from_millis(self.enemy_pacing_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_timer_secs == 0 {
            return Err(ConfigError::ZeroTurnTimer);
        }
        if self.max_party_size == 0 || self.max_party_size > Self::MAX_PARTY_SIZE {
            return Err(ConfigError::PartySize {
                size: self.max_party_size,
                max: Self::MAX_PARTY_SIZE,
            });
        }
        if self.max_enemy_positions == 0 || self.max_enemy_positions > Self::MAX_ENEMY_POSITIONS {
            return Err(ConfigError::EnemyPositions {
                positions: self.max_enemy_positions,
                max: Self::MAX_ENEMY_POSITIONS,
            });
        }
        Ok(())
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("turn timer must be at least one second")]
    ZeroTurnTimer,

    #[error("party size {size} is outside 1..={max}")]
    PartySize { size: usize, max: usize },

    #[error("enemy positions {positions} is outside 1..={max}")]
    EnemyPositions { positions: usize, max: usize },
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroTurnTimer => "CONFIG_ZERO_TURN_TIMER",
            Self::PartySize { .. } => "CONFIG_PARTY_SIZE",
            Self::EnemyPositions { .. } => "CONFIG_ENEMY_POSITIONS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(CombatConfig::default().validate(), Ok(()));
        assert_eq!(CombatConfig::unpaced().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_turn_timer_and_oversized_party() {
        let config = CombatConfig {
            turn_timer_secs: 0,
            ..CombatConfig::new()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTurnTimer));

        let config = CombatConfig {
            max_party_size: 12,
            ..CombatConfig::new()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PartySize { size: 12, .. })));
    }
}
