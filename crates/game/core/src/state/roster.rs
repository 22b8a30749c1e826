//! Owning container for every combatant in an encounter.

use std::collections::BTreeMap;

use crate::ability::TargetRule;

use super::{CombatantId, CombatantState, ParticipantId, Side};

/// All combatants of one encounter, players and enemies alike.
///
/// Board positions are per side and start at 1. Queries that talk about
/// order ("front-most", "in position order") sort by position, then id.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    combatants: BTreeMap<CombatantId, CombatantState>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next combatant id.
    pub fn allocate_id(&mut self) -> CombatantId {
        self.next_id += 1;
        CombatantId(self.next_id)
    }

    pub fn insert(&mut self, combatant: CombatantState) {
        self.combatants.insert(combatant.id, combatant);
    }

    pub fn get(&self, id: CombatantId) -> Option<&CombatantState> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut CombatantState> {
        self.combatants.get_mut(&id)
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(CombatantState::is_alive)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatantState> {
        self.combatants.values()
    }

    pub fn by_participant(&self, participant: &ParticipantId) -> Option<&CombatantState> {
        self.combatants
            .values()
            .find(|c| c.participant.as_ref() == Some(participant))
    }

    /// Every combatant on `side`, dead or alive, in board order.
    pub fn side(&self, side: Side) -> Vec<&CombatantState> {
        let mut members: Vec<_> = self.combatants.values().filter(|c| c.side == side).collect();
        members.sort_by_key(|c| (c.position, c.id));
        members
    }

    /// Living combatants on `side` in board order.
    pub fn living(&self, side: Side) -> Vec<&CombatantState> {
        let mut members = self.side(side);
        members.retain(|c| c.is_alive());
        members
    }

    pub fn living_ids(&self, side: Side) -> Vec<CombatantId> {
        self.living(side).into_iter().map(|c| c.id).collect()
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.combatants
            .values()
            .filter(|c| c.side == side && c.is_alive())
            .count()
    }

    /// Lowest-position living combatant on `side`, optionally restricted to
    /// the reach of a targeting rule.
    pub fn front_most(&self, side: Side, reach: Option<&TargetRule>) -> Option<CombatantId> {
        self.living(side)
            .into_iter()
            .find(|c| reach.is_none_or(|rule| rule.reaches(c.position)))
            .map(|c| c.id)
    }

    /// Case-insensitive name match among the living on `side`.
    pub fn find_living_by_name(&self, side: Side, name: &str) -> Option<CombatantId> {
        self.living(side)
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id)
    }

    /// The primary target followed by the next living members of its side in
    /// board order, up to `count` in total.
    pub fn splash_group(
        &self,
        primary: CombatantId,
        count: usize,
        reach: Option<&TargetRule>,
    ) -> Vec<CombatantId> {
        let Some(first) = self.get(primary) else {
            return Vec::new();
        };
        let mut group = vec![primary];
        group.extend(
            self.living(first.side)
                .into_iter()
                .filter(|c| c.id != primary && c.position > first.position)
                .filter(|c| reach.is_none_or(|rule| rule.reaches(c.position)))
                .map(|c| c.id)
                .take(count.saturating_sub(1)),
        );
        group
    }

    /// Shifts living players toward position 1, preserving their order.
    /// Returns `(id, new_position)` for every player that moved.
    pub fn compact_players(&mut self) -> Vec<(CombatantId, u8)> {
        let order = self.living_ids(Side::Player);
        let mut moved = Vec::new();
        for (index, id) in order.into_iter().enumerate() {
            let position = index as u8 + 1;
            if let Some(player) = self.combatants.get_mut(&id)
                && player.position != position
            {
                player.position = position;
                moved.push((id, position));
            }
        }
        moved
    }

    /// Next free board position behind every living player.
    pub fn rear_player_position(&self) -> u8 {
        self.living(Side::Player)
            .last()
            .map_or(1, |c| c.position.saturating_add(1))
    }

    /// Discards every enemy, living or dead.
    pub fn remove_enemies(&mut self) {
        self.combatants.retain(|_, c| c.side != Side::Enemy);
    }

    pub fn clear(&mut self) {
        self.combatants.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterClass, ParticipantProfile};

    fn roster_with_players(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for (index, name) in names.iter().enumerate() {
            let id = roster.allocate_id();
            let profile = ParticipantProfile::new(*name, *name, CharacterClass::Fighter);
            roster.insert(CombatantState::new_player(
                id,
                &profile,
                CharacterClass::Fighter,
                index as u8 + 1,
            ));
        }
        roster
    }

    fn kill(roster: &mut Roster, id: CombatantId) {
        let mut nonce = 0;
        let mut dice = crate::env::Dice::new(&crate::env::PcgRng, 1, &mut nonce);
        let player = roster.get_mut(id).unwrap();
        player.take_damage(10_000, CombatantId(0), &mut dice);
    }

    #[test]
    fn compaction_closes_gaps_in_order() {
        let mut roster = roster_with_players(&["a", "b", "c", "d"]);
        let ids = roster.living_ids(Side::Player);
        kill(&mut roster, ids[1]);

        let moved = roster.compact_players();
        assert_eq!(moved, vec![(ids[2], 2), (ids[3], 3)]);
        assert_eq!(roster.front_most(Side::Player, None), Some(ids[0]));
        assert_eq!(roster.rear_player_position(), 4);
    }

    #[test]
    fn name_lookup_ignores_case_and_the_dead() {
        let mut roster = roster_with_players(&["Ash", "Birch"]);
        assert!(roster.find_living_by_name(Side::Player, "ash").is_some());
        let birch = roster.find_living_by_name(Side::Player, "BIRCH").unwrap();
        kill(&mut roster, birch);
        assert_eq!(roster.find_living_by_name(Side::Player, "birch"), None);
    }

    #[test]
    fn splash_group_walks_backwards_from_primary() {
        let roster = roster_with_players(&["a", "b", "c", "d"]);
        let ids = roster.living_ids(Side::Player);
        assert_eq!(roster.splash_group(ids[1], 2, None), vec![ids[1], ids[2]]);
        assert_eq!(roster.splash_group(ids[3], 3, None), vec![ids[3]]);
    }
}
