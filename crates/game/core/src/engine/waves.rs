//! Encounter-level progression: intake, wave spawning, clear and wipe
//! detection, rest between waves and completion with rewards.

use std::collections::HashMap;
use std::time::Duration;

use crate::env::{Difficulty, DifficultyProfile, EnemyTemplate, RollContext};
use crate::error::{ErrorSeverity, GameError};
use crate::events::{CombatEvent, CombatantView, EncounterSummary, ParticipantSummary};
use crate::state::{
    CombatantId, CombatantState, ParticipantId, ParticipantProfile, ProfileWriteback, Reward,
    Side,
};

use super::clock::Countdown;
use super::context::CombatContext;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EncounterStage {
    #[default]
    Idle,
    Joining,
    Fighting,
    Resting,
    Complete,
}

impl EncounterStage {
    pub fn is_live(self) -> bool {
        matches!(self, Self::Joining | Self::Fighting | Self::Resting)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("an encounter is already in progress")]
    EncounterInProgress,

    #[error("no abilities are loaded")]
    EmptyCatalog,

    #[error("no encounter table for {0} difficulty")]
    UnknownDifficulty(Difficulty),

    #[error("{0} difficulty has no waves")]
    NoWaves(Difficulty),
}

impl GameError for StartError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EncounterInProgress => ErrorSeverity::Recoverable,
            Self::EmptyCatalog | Self::UnknownDifficulty(_) | Self::NoWaves(_) => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EncounterInProgress => "START_IN_PROGRESS",
            Self::EmptyCatalog => "START_EMPTY_CATALOG",
            Self::UnknownDifficulty(_) => "START_UNKNOWN_DIFFICULTY",
            Self::NoWaves(_) => "START_NO_WAVES",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JoinRejection {
    #[error("the expedition isn't accepting new members right now")]
    NotAcceptingJoins,

    #[error("pick a class before joining")]
    NoClass,

    #[error("you're already in this expedition")]
    AlreadyJoined,

    #[error("the party is full ({max} members)")]
    PartyFull { max: usize },

    #[error("position {position} is not between 1 and {max}")]
    InvalidPosition { position: u8, max: usize },

    #[error("you're recovering from defeat for {minutes} more minute(s)")]
    LockedOut { minutes: u64 },
}

impl GameError for JoinRejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoClass | Self::InvalidPosition { .. } => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAcceptingJoins => "JOIN_NOT_ACCEPTING",
            Self::NoClass => "JOIN_NO_CLASS",
            Self::AlreadyJoined => "JOIN_ALREADY_JOINED",
            Self::PartyFull { .. } => "JOIN_PARTY_FULL",
            Self::InvalidPosition { .. } => "JOIN_INVALID_POSITION",
            Self::LockedOut { .. } => "JOIN_LOCKED_OUT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinReceipt {
    pub combatant: CombatantId,
    pub position: u8,
    pub late: bool,
}

/// An admitted participant. Every admitted participant counts toward the
/// party-wipe threshold, including late joiners.
#[derive(Clone, Debug)]
pub struct Participant {
    pub profile: ParticipantProfile,
    pub combatant: CombatantId,
    pub late: bool,
}

/// What the encounter does after a wave is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    Rest,
    Victory,
}

#[derive(Clone, Debug, Default)]
pub struct WaveOrchestrator {
    stage: EncounterStage,
    table: Option<DifficultyProfile>,
    wave_index: usize,
    participants: Vec<Participant>,
    fallen: Vec<ParticipantId>,
    join_timer: Countdown,
    rest_timer: Countdown,
    writebacks: Vec<ProfileWriteback>,
    summary: Option<EncounterSummary>,
}

impl WaveOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> EncounterStage {
        self.stage
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.table.as_ref().map(|t| t.difficulty)
    }

    /// One-based number of the current (or next) wave.
    pub fn wave_number(&self) -> usize {
        self.wave_index + 1
    }

    pub fn total_waves(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.waves.len())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn fallen(&self) -> &[ParticipantId] {
        &self.fallen
    }

    pub fn summary(&self) -> Option<&EncounterSummary> {
        self.summary.as_ref()
    }

    pub fn join_seconds_remaining(&self) -> Option<u64> {
        self.join_timer
            .is_armed()
            .then(|| self.join_timer.whole_seconds())
    }

    pub fn rest_seconds_remaining(&self) -> Option<u64> {
        (self.stage == EncounterStage::Resting).then(|| self.rest_timer.whole_seconds())
    }

    pub fn is_wiped(&self) -> bool {
        !self.participants.is_empty() && self.fallen.len() >= self.participants.len()
    }

    pub(crate) fn drain_writebacks(&mut self) -> Vec<ProfileWriteback> {
        std::mem::take(&mut self.writebacks)
    }

    /// Idle (or Complete) → Joining.
    pub(crate) fn start_encounter(
        &mut self,
        ctx: &mut CombatContext<'_>,
        difficulty: Difficulty,
    ) -> Result<(), StartError> {
        if self.stage.is_live() {
            return Err(StartError::EncounterInProgress);
        }
        if ctx.env.abilities.is_empty() {
            return Err(StartError::EmptyCatalog);
        }
        let table = ctx
            .env
            .bestiary
            .difficulty(difficulty)
            .ok_or(StartError::UnknownDifficulty(difficulty))?;
        if table.waves.is_empty() {
            return Err(StartError::NoWaves(difficulty));
        }

        *self = Self {
            stage: EncounterStage::Joining,
            table: Some(table.clone()),
            ..Self::default()
        };
        ctx.roster.clear();
        *ctx.stats = Default::default();
        self.join_timer.start(ctx.config.join_timer());

        tracing::info!(
            target: "expedition::wave",
            %difficulty,
            waves = table.waves.len(),
            "encounter opened"
        );
        ctx.events.push(CombatEvent::EncounterOpened {
            difficulty,
            total_waves: table.waves.len(),
        });
        Ok(())
    }

    /// Admits a participant.
    ///
    /// During intake a requested position that is taken bumps the occupant
    /// to the back of the line. Once fighting, `late_join_open` says whether
    /// the encounter can take newcomers right now; they join at the rear.
    pub(crate) fn add_participant(
        &mut self,
        ctx: &mut CombatContext<'_>,
        profile: ParticipantProfile,
        requested: Option<u8>,
        late_join_open: bool,
    ) -> Result<JoinReceipt, JoinRejection> {
        let late = match self.stage {
            EncounterStage::Joining => false,
            EncounterStage::Fighting | EncounterStage::Resting
                if late_join_open && ctx.config.allow_late_join =>
            {
                true
            }
            _ => return Err(JoinRejection::NotAcceptingJoins),
        };
        let class = profile.class.ok_or(JoinRejection::NoClass)?;
        if self.participants.iter().any(|p| p.profile.id == profile.id) {
            return Err(JoinRejection::AlreadyJoined);
        }
        let max = ctx.config.max_party_size;
        if self.participants.len() >= max {
            return Err(JoinRejection::PartyFull { max });
        }
        if let Some(position) = requested
            && (position == 0 || usize::from(position) > max)
        {
            return Err(JoinRejection::InvalidPosition { position, max });
        }

        let position = if late {
            ctx.roster.rear_player_position()
        } else {
            self.claim_position(ctx, requested)
        };

        let id = ctx.roster.allocate_id();
        ctx.roster
            .insert(CombatantState::new_player(id, &profile, class, position));

        tracing::info!(
            target: "expedition::wave",
            participant = %profile.id,
            %class,
            position,
            late,
            "participant joined"
        );
        ctx.events.push(CombatEvent::ParticipantJoined {
            participant: profile.id.clone(),
            name: profile.display_name.clone(),
            class,
            position,
            late,
        });

        self.participants.push(Participant {
            profile,
            combatant: id,
            late,
        });

        if !late {
            if self.participants.len() >= max {
                self.join_timer.start(Duration::ZERO);
            } else if self.participants.len() == 1 {
                // The first joiner gets a full window.
                self.join_timer.start(ctx.config.join_timer());
            }
        }

        Ok(JoinReceipt {
            combatant: id,
            position,
            late,
        })
    }

    /// Finds the intake position for a newcomer, moving an occupant of the
    /// requested spot to the first free position from the back of the line.
    fn claim_position(&mut self, ctx: &mut CombatContext<'_>, requested: Option<u8>) -> u8 {
        let max = ctx.config.max_party_size.max(1) as u8;
        let taken: Vec<u8> = ctx.roster.side(Side::Player).iter().map(|c| c.position).collect();
        let free_from = |start: u8, skip: Option<u8>| {
            (0..max)
                .map(|offset| (start - 1 + offset) % max + 1)
                .find(|p| !taken.contains(p) && Some(*p) != skip)
        };

        let Some(wanted) = requested else {
            return free_from(1, None).unwrap_or(1);
        };
        let Some(occupant) = ctx
            .roster
            .side(Side::Player)
            .into_iter()
            .find(|c| c.position == wanted)
            .map(|c| c.id)
        else {
            return wanted;
        };

        let back = (self.participants.len() as u8 + 1).min(max);
        let Some(moved_to) = free_from(back, Some(wanted)) else {
            return wanted;
        };
        if let Some(bumped) = ctx.roster.get_mut(occupant) {
            bumped.position = moved_to;
            if let Some(participant) = bumped.participant.clone() {
                ctx.events.push(CombatEvent::PositionSwapped {
                    participant,
                    from: wanted,
                    to: moved_to,
                });
            }
        }
        wanted
    }

    pub(crate) fn poll_join(&mut self, budget: &mut Duration) -> bool {
        self.stage == EncounterStage::Joining && self.join_timer.drain(budget)
    }

    pub(crate) fn poll_rest(&mut self, budget: &mut Duration) -> bool {
        self.stage == EncounterStage::Resting && self.rest_timer.drain(budget)
    }

    /// Ends intake. Returns false (and cancels) when nobody joined.
    pub(crate) fn start_expedition(&mut self, ctx: &mut CombatContext<'_>) -> bool {
        self.join_timer.stop();
        if self.participants.is_empty() {
            tracing::info!(target: "expedition::wave", "nobody joined; encounter cancelled");
            ctx.events.push(CombatEvent::EncounterCancelled {
                reason: "nobody joined".into(),
            });
            *self = Self::default();
            ctx.roster.clear();
            return false;
        }

        self.stage = EncounterStage::Fighting;
        tracing::info!(
            target: "expedition::wave",
            participants = self.participants.len(),
            "expedition started"
        );
        ctx.events.push(CombatEvent::EncounterStarted {
            participants: self.participants.len(),
        });
        true
    }

    /// Spawns the current wave. Returns the number of enemies spawned.
    pub(crate) fn advance_wave(&mut self, ctx: &mut CombatContext<'_>) -> usize {
        self.stage = EncounterStage::Fighting;
        let Some(table) = self.table.as_ref() else {
            return 0;
        };
        let Some(layout) = table.waves.get(self.wave_index).copied() else {
            return 0;
        };
        let actor = self.wave_index as u32;

        let (low, high) = (
            layout.min_enemies.min(layout.max_enemies),
            layout.max_enemies.max(layout.min_enemies),
        );
        let positions = ctx.config.max_enemy_positions as u32;
        let regulars = ctx
            .dice
            .range(actor, RollContext::WaveSize, low, high)
            .min(positions.saturating_sub(layout.bosses));

        let mut chosen: Vec<&EnemyTemplate> = Vec::new();
        for (count, pool, kind) in [
            (regulars, &table.enemy_pool, "regular"),
            (layout.bosses, &table.boss_pool, "boss"),
        ] {
            if count > 0 && pool.is_empty() {
                tracing::warn!(target: "expedition::wave", kind, "enemy pool is empty");
                continue;
            }
            for _ in 0..count {
                let Some(name) = ctx.dice.pick(actor, RollContext::EnemyPick, pool) else {
                    continue;
                };
                match ctx.env.bestiary.enemy(name) {
                    Some(template) => chosen.push(template),
                    None => tracing::warn!(
                        target: "expedition::wave",
                        enemy = %name,
                        "enemy template not found; skipped"
                    ),
                }
            }
        }

        let mut seen: HashMap<&str, u32> = HashMap::new();
        let mut enemies = Vec::with_capacity(chosen.len());
        for (index, template) in chosen.into_iter().enumerate() {
            if template.abilities.is_empty() {
                tracing::warn!(
                    target: "expedition::wave",
                    enemy = %template.name,
                    "enemy template has no abilities; it will idle"
                );
            }
            let copies = seen.entry(template.name.as_str()).or_insert(0);
            *copies += 1;
            let name = match *copies {
                1 => template.name.clone(),
                n => format!("{} {n}", template.name),
            };
            let id = ctx.roster.allocate_id();
            let enemy = CombatantState::new_enemy(id, template, name, index as u8 + 1);
            enemies.push(CombatantView::from(&enemy));
            ctx.roster.insert(enemy);
        }

        tracing::info!(
            target: "expedition::wave",
            wave = self.wave_number(),
            total = table.waves.len(),
            enemies = enemies.len(),
            "wave started"
        );
        let spawned = enemies.len();
        ctx.events.push(CombatEvent::WaveStarted {
            wave: self.wave_number(),
            total_waves: table.waves.len(),
            enemies,
        });
        spawned
    }

    /// Bookkeeping for combatants that just died: fallen players are written
    /// back and the line closes up; defeated enemies add to the loot.
    pub(crate) fn on_deaths(&mut self, ctx: &mut CombatContext<'_>, deaths: &[CombatantId]) {
        let mut compact = false;
        for &id in deaths {
            let Some(dead) = ctx.roster.get(id) else {
                continue;
            };
            match (&dead.participant, dead.bounty) {
                (Some(participant), _) => {
                    if self.fallen.contains(participant) {
                        continue;
                    }
                    self.fallen.push(participant.clone());
                    if let Some(writeback) = self.writeback_for(ctx, participant, None) {
                        self.writebacks.push(writeback);
                    }
                    compact = true;
                }
                (None, bounty) => {
                    ctx.stats.enemies_defeated += 1;
                    if let Some(bounty) = bounty {
                        let (low, high) = (
                            bounty.coins_min.min(bounty.coins_max),
                            bounty.coins_max.max(bounty.coins_min),
                        );
                        let coins = ctx.dice.range(id.0, RollContext::CoinDrop, low, high);
                        ctx.stats.loot_coins += u64::from(coins);
                        ctx.stats.loot_experience += u64::from(bounty.experience);
                    }
                }
            }
        }

        if compact {
            let moves = ctx.roster.compact_players();
            if !moves.is_empty() {
                ctx.events.push(CombatEvent::PositionsCompacted { moves });
            }
        }
    }

    pub(crate) fn on_wave_cleared(&mut self, ctx: &mut CombatContext<'_>) -> WaveProgress {
        ctx.stats.waves_cleared += 1;
        let cleared = self.wave_number();
        tracing::info!(target: "expedition::wave", wave = cleared, "wave cleared");
        ctx.events.push(CombatEvent::WaveCleared {
            wave: cleared,
            enemies_defeated: ctx.stats.enemies_defeated,
        });
        ctx.roster.remove_enemies();
        self.wave_index += 1;

        if self.wave_index >= self.total_waves() {
            return WaveProgress::Victory;
        }

        self.stage = EncounterStage::Resting;
        let rest = ctx.config.rest_interval();
        self.rest_timer.start(rest);

        let regen_percent = ctx.config.mana_regen_percent as i32;
        for id in ctx.roster.living_ids(Side::Player) {
            let Some(player) = ctx.roster.get_mut(id) else {
                continue;
            };
            let intelligence = player.stats().attributes.intelligence;
            let gained = player
                .resources_mut()
                .regenerate_mana(intelligence * regen_percent / 100);
            if gained > 0 {
                ctx.events.push(CombatEvent::ResourceRegenerated {
                    combatant: id,
                    resource: "mana".into(),
                    amount: gained,
                });
            }
        }

        ctx.events.push(CombatEvent::RestStarted {
            seconds: rest.as_secs(),
            next_wave: self.wave_number(),
        });
        WaveProgress::Rest
    }

    /// Pays out rewards, writes every participant back and tears down the
    /// combat roster.
    pub(crate) fn complete(&mut self, ctx: &mut CombatContext<'_>, victory: bool) {
        let Some(table) = self.table.clone() else {
            return;
        };
        self.join_timer.stop();
        self.rest_timer.stop();

        let party = self.participants.len().max(1) as u64;
        let loot_share = ctx.stats.loot_coins / party;
        let base_experience = (ctx.stats.loot_experience as f32 * table.xp_multiplier).round();
        let clear_ratio = ctx.stats.waves_cleared as f32 / table.waves.len().max(1) as f32;

        let mut summaries = Vec::with_capacity(self.participants.len());
        for index in 0..self.participants.len() {
            let participant = &self.participants[index];
            let id = participant.profile.id.clone();
            let name = participant.profile.display_name.clone();
            let actor = participant.combatant.0;

            let (low, high) = (
                table.coin_reward_min.min(table.coin_reward_max),
                table.coin_reward_max.max(table.coin_reward_min),
            );
            let rolled = u64::from(ctx.dice.range(actor, RollContext::Reward, low, high));
            let mut coins = (rolled + loot_share) as f32;
            let mut experience = base_experience;
            if !victory {
                coins *= clear_ratio * 0.5;
                experience *= clear_ratio * 0.5;
            }
            let reward = Reward {
                coins: coins.round().max(0.0) as u32,
                experience: experience.round().max(0.0) as u32,
            };

            if let Some(writeback) = self.writeback_for(ctx, &id, Some(reward)) {
                self.writebacks.push(writeback);
            }
            let stats = ctx.stats.participant(&id);
            summaries.push(ParticipantSummary {
                died: self.fallen.contains(&id),
                participant: id,
                name,
                actions: stats.actions,
                damage_dealt: stats.damage_dealt,
                healing_done: stats.healing_done,
                reward,
            });
        }

        let summary = EncounterSummary {
            victory,
            difficulty: table.difficulty,
            waves_cleared: ctx.stats.waves_cleared,
            total_waves: table.waves.len(),
            enemies_defeated: ctx.stats.enemies_defeated,
            participants: summaries,
        };
        tracing::info!(
            target: "expedition::wave",
            victory,
            waves_cleared = summary.waves_cleared,
            enemies_defeated = summary.enemies_defeated,
            "encounter complete"
        );
        ctx.events.push(CombatEvent::EncounterCompleted {
            summary: summary.clone(),
        });

        self.summary = Some(summary);
        self.stage = EncounterStage::Complete;
        ctx.roster.clear();
    }

    /// Ends a live encounter without a result. Survivors are written back
    /// with their current health and resources and nobody is rewarded.
    /// Returns false when nothing was live.
    pub(crate) fn abandon(&mut self, ctx: &mut CombatContext<'_>, reason: &str) -> bool {
        if !self.stage.is_live() {
            return false;
        }
        for participant in &self.participants {
            let id = &participant.profile.id;
            if self.fallen.contains(id) {
                continue;
            }
            if let Some(writeback) = self.writeback_for(ctx, id, None) {
                self.writebacks.push(writeback);
            }
        }

        tracing::info!(
            target: "expedition::wave",
            stage = %self.stage,
            participants = self.participants.len(),
            reason,
            "encounter abandoned"
        );
        ctx.events.push(CombatEvent::EncounterCancelled {
            reason: reason.to_string(),
        });
        let writebacks = std::mem::take(&mut self.writebacks);
        *self = Self {
            writebacks,
            ..Self::default()
        };
        ctx.roster.clear();
        true
    }

    fn writeback_for(
        &self,
        ctx: &CombatContext<'_>,
        participant: &ParticipantId,
        reward: Option<Reward>,
    ) -> Option<ProfileWriteback> {
        let entry = self
            .participants
            .iter()
            .find(|p| &p.profile.id == participant)?;
        let combatant = ctx.roster.get(entry.combatant)?;
        let mut resources = entry.profile.resources.clone();
        combatant.resources().store_into(&mut resources);
        Some(ProfileWriteback {
            participant: participant.clone(),
            health: combatant.health(),
            resources,
            died: !combatant.is_alive(),
            reward,
        })
    }
}
