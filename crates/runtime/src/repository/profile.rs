//! Persisted profile record and writeback application.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use expedition_core::{
    CharacterClass, ParticipantId, ParticipantProfile, ProfileWriteback, StoredResources,
};

/// Everything the runtime keeps about a participant between encounters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub profile: ParticipantProfile,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub experience: u64,
    /// Set on death; joins are refused until it passes.
    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,
    /// Key of the last encounter whose reward was credited.
    #[serde(default)]
    pub rewarded_encounter: Option<u64>,
}

impl StoredProfile {
    pub fn new(profile: ParticipantProfile) -> Self {
        Self {
            profile,
            coins: 0,
            experience: 0,
            locked_until: None,
            rewarded_encounter: None,
        }
    }

    /// A fresh level-1 character.
    pub fn fresh(
        id: impl Into<ParticipantId>,
        display_name: impl Into<String>,
        class: CharacterClass,
    ) -> Self {
        Self::new(ParticipantProfile::new(id, display_name, class))
    }

    pub fn id(&self) -> &ParticipantId {
        &self.profile.id
    }

    /// Time left on the death lockout, if any.
    pub fn lockout_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Applies one writeback from the encounter.
    ///
    /// Applying the same writeback twice leaves the profile unchanged: the
    /// reward is credited once per encounter key and an active lockout is
    /// never extended.
    pub fn apply_writeback(
        &mut self,
        writeback: &ProfileWriteback,
        encounter: u64,
        now: DateTime<Utc>,
        lockout: Duration,
    ) {
        if writeback.died {
            // Death wipes in-combat state; the character returns at full health.
            self.profile.health = None;
            self.profile.resources = StoredResources::default();
            if self.lockout_remaining(now).is_none() {
                self.locked_until = Some(now + lockout);
            }
        } else {
            self.profile.health = Some(writeback.health);
            self.profile.resources = writeback.resources;
        }

        if let Some(reward) = writeback.reward
            && self.rewarded_encounter != Some(encounter)
        {
            self.coins += u64::from(reward.coins);
            self.experience += u64::from(reward.experience);
            self.rewarded_encounter = Some(encounter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expedition_core::{FighterStance, Reward};

    fn writeback(died: bool, reward: Option<Reward>) -> ProfileWriteback {
        ProfileWriteback {
            participant: ParticipantId::new("u1"),
            health: if died { 0 } else { 42 },
            resources: StoredResources {
                stance: FighterStance::Aggressive,
                ..StoredResources::default()
            },
            died,
            reward,
        }
    }

    #[test]
    fn survivor_keeps_health_and_resources() {
        let mut stored = StoredProfile::fresh("u1", "Ash", CharacterClass::Fighter);
        let now = Utc::now();

        stored.apply_writeback(&writeback(false, None), 1, now, Duration::minutes(30));

        assert_eq!(stored.profile.health, Some(42));
        assert_eq!(stored.profile.resources.stance, FighterStance::Aggressive);
        assert!(stored.lockout_remaining(now).is_none());
    }

    #[test]
    fn death_stamps_lockout_once() {
        let mut stored = StoredProfile::fresh("u1", "Ash", CharacterClass::Fighter);
        let now = Utc::now();
        let lockout = Duration::minutes(30);

        stored.apply_writeback(&writeback(true, None), 1, now, lockout);
        let first = stored.locked_until;
        stored.apply_writeback(&writeback(true, None), 1, now + Duration::minutes(5), lockout);

        assert_eq!(stored.locked_until, first);
        assert_eq!(stored.profile.health, None);
        assert_eq!(stored.profile.resources, StoredResources::default());
        assert!(stored.lockout_remaining(now + Duration::minutes(31)).is_none());
    }

    #[test]
    fn reward_is_credited_once_per_encounter() {
        let mut stored = StoredProfile::fresh("u1", "Ash", CharacterClass::Fighter);
        let now = Utc::now();
        let reward = Some(Reward {
            coins: 20,
            experience: 35,
        });

        stored.apply_writeback(&writeback(false, reward), 3, now, Duration::zero());
        stored.apply_writeback(&writeback(false, reward), 3, now, Duration::zero());
        assert_eq!((stored.coins, stored.experience), (20, 35));

        stored.apply_writeback(&writeback(false, reward), 4, now, Duration::zero());
        assert_eq!((stored.coins, stored.experience), (40, 70));
    }

    #[test]
    fn keys_are_compared_not_ordered() {
        let mut stored = StoredProfile::fresh("u1", "Ash", CharacterClass::Fighter);
        let now = Utc::now();
        let reward = Some(Reward {
            coins: 5,
            experience: 8,
        });

        stored.apply_writeback(&writeback(false, reward), u64::MAX, now, Duration::zero());
        stored.apply_writeback(&writeback(false, reward), 0, now, Duration::zero());

        assert_eq!((stored.coins, stored.experience), (10, 16));
        assert_eq!(stored.rewarded_encounter, Some(0));
    }
}
