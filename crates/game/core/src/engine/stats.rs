use std::collections::BTreeMap;

use crate::resolve::ActionOutcome;
use crate::state::ParticipantId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParticipantStats {
    pub actions: u32,
    pub damage_dealt: i64,
    pub healing_done: i64,
}

/// Running totals for one encounter.
#[derive(Clone, Debug, Default)]
pub struct EncounterStats {
    pub enemies_defeated: u32,
    /// Coin drops rolled for defeated enemies, shared by the party at the end.
    pub loot_coins: u64,
    pub loot_experience: u64,
    pub waves_cleared: usize,
    participants: BTreeMap<ParticipantId, ParticipantStats>,
}

impl EncounterStats {
    pub fn record_action(&mut self, participant: &ParticipantId, outcome: &ActionOutcome) {
        let entry = self.participants.entry(participant.clone()).or_default();
        entry.actions += 1;
        entry.damage_dealt += i64::from(outcome.damage_dealt());
        entry.healing_done += i64::from(outcome.healing_done());
    }

    pub fn participant(&self, participant: &ParticipantId) -> ParticipantStats {
        self.participants
            .get(participant)
            .copied()
            .unwrap_or_default()
    }
}
