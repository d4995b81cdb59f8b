//! # Match Session
//!
//! The single context object the game loop drives for one match.
//!
//! ## Per-Tick Flow
//!
//! ```text
//! engine message ──► message_begin / message_field / message_end
//!                          │
//!                          ▼
//!                 decoder ─► field/end slot ─► correlator ─► accumulator
//!                                                   │
//!                                                   ▼
//!                                             EventChannel
//!
//! player pre-think ──► think(slot) ─► due clears ─► rank flush
//! ```
//!
//! ## Lifecycle
//!
//! 1. `new` + `register_message` for each engine message, `finish_registration`
//! 2. `load_rank`
//! 3. `player_connect` / `player_disconnect` / `player_rename` as they happen
//! 4. `teardown` at map end

use crate::accumulator::{Scope, StatAccumulator, StatFilter, VersusEntry};
use crate::config::{RankKey, TrackerConfig};
use crate::correlator::{EventCorrelator, WeaponSwitchRecord};
use crate::error::TrackerResult;
use crate::events::{EventChannel, StatsEvent, TEAM_ALLIES, TEAM_AXIS};
use crate::message::{EndSlot, FieldSlot, FieldValue, MessageDecoder, MessageKind, MessageRegistry};
use crate::world::GameWorld;
use skirmish_core::{EntityHandle, PlayerSlot, WeaponStatEntry, MAX_PLAYERS};
use skirmish_rank::{PointTable, RankEntry, RankError, RankId, RankSaver, RankStore};
use std::sync::Arc;

/// Longest accepted match id, in characters.
pub const MAX_MATCH_ID: usize = 64;

/// FOV values that mean "not scoped".
const UNSCOPED_FOV: [i32; 2] = [0, 90];

/// Session-side state of one slot.
#[derive(Clone, Debug, Default)]
struct PlayerState {
    connected: bool,
    name: String,
    unique: String,
    rank_id: Option<RankId>,
    saved_score: i32,
    last_score: i32,
    send_score_at: Option<f32>,
    fov: i32,
    scoped: bool,
    carrying: bool,
    object: Option<EntityHandle>,
    object_forward: bool,
}

/// Values collected from earlier fields of the current message.
#[derive(Clone, Copy, Debug, Default)]
struct MessageScratch {
    switch: WeaponSwitchRecord,
    score_player: Option<PlayerSlot>,
    team_index: i32,
    ammo_slot: i32,
}

/// One match worth of decoding, attribution, and ranking.
pub struct MatchSession<W: GameWorld> {
    config: TrackerConfig,
    world: W,
    decoder: MessageDecoder,
    correlator: EventCorrelator,
    stats: StatAccumulator,
    rank: RankStore,
    events: EventChannel<StatsEvent>,
    players: Vec<PlayerState>,
    scratch: MessageScratch,
    subject_entity: Option<EntityHandle>,
    team_scores: [i32; 2],
    match_id: String,
}

impl<W: GameWorld> MatchSession<W> {
    /// Creates a session with an empty registry and rank store.
    pub fn new(config: TrackerConfig, world: W, points: Arc<PointTable>) -> Self {
        Self {
            decoder: MessageDecoder::new(MessageRegistry::new()),
            correlator: EventCorrelator::new(config.rocket_track_secs),
            stats: StatAccumulator::new(Arc::clone(&points)),
            rank: RankStore::new(config.rank_capacity, points),
            events: EventChannel::unbounded(),
            players: vec![PlayerState::default(); MAX_PLAYERS],
            scratch: MessageScratch::default(),
            subject_entity: None,
            team_scores: [0; 2],
            match_id: String::new(),
            world,
            config,
        }
    }

    // =========================================================================
    // SETUP
    // =========================================================================

    /// Binds an engine message name to its id.
    ///
    /// # Errors
    ///
    /// See [`MessageRegistry::bind`].
    pub fn register_message(&mut self, name: &str, id: i32) -> TrackerResult<MessageKind> {
        self.decoder.registry_mut().bind(name, id)
    }

    /// Logs message kinds the engine never registered.
    pub fn finish_registration(&self) {
        for kind in self.decoder.registry().unbound() {
            tracing::warn!("engine never registered message {}", kind.name());
        }
    }

    /// Loads the rank file named in the config. Returns the entry count.
    ///
    /// A missing file is normal on first run; any other failure leaves
    /// the store empty.
    pub fn load_rank(&mut self) -> usize {
        match self.rank.load(&self.config.rank_file) {
            Ok(count) => count,
            Err(RankError::NotFound(path)) => {
                tracing::info!("no rank file at {}, starting empty", path);
                0
            }
            Err(e) => {
                tracing::warn!("rank file rejected: {}", e);
                0
            }
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Suspends or resumes weapon, damage, and score accumulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.config.paused = paused;
    }

    /// Allied hand grenades count as Mills bombs on British maps.
    pub fn set_british_allies(&mut self, british: bool) {
        self.correlator.set_british_allies(british);
    }

    /// The host world.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable host world.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Notification channel.
    #[must_use]
    pub fn events(&self) -> &EventChannel<StatsEvent> {
        &self.events
    }

    /// Per-player counters.
    #[must_use]
    pub fn accumulator(&self) -> &StatAccumulator {
        &self.stats
    }

    /// The leaderboard.
    #[must_use]
    pub fn rank(&self) -> &RankStore {
        &self.rank
    }

    // =========================================================================
    // PLAYER LIFECYCLE
    // =========================================================================

    /// Starts tracking a player. Rank entries are created on first flush.
    pub fn player_connect(&mut self, slot: PlayerSlot, name: &str, unique: &str) {
        self.players[slot.index()] = PlayerState {
            connected: true,
            name: name.to_owned(),
            unique: unique.to_owned(),
            ..PlayerState::default()
        };
        self.stats.reset_player(slot, name);
        tracing::debug!("player {} connected as {}", slot, name);
    }

    /// Flushes the player's current life and stops tracking.
    pub fn player_disconnect(&mut self, slot: PlayerSlot) {
        if !self.players[slot.index()].connected {
            return;
        }
        self.flush_life(slot);
        self.players[slot.index()] = PlayerState::default();
        tracing::debug!("player {} disconnected", slot);
    }

    /// Handles a name change.
    ///
    /// Keyed by name, later flushes go to the new name's entry. Keyed by
    /// unique id, the existing entry is renamed in place.
    pub fn player_rename(&mut self, slot: PlayerSlot, name: &str) {
        let state = &mut self.players[slot.index()];
        if !state.connected || state.name == name {
            return;
        }
        name.clone_into(&mut state.name);
        match self.config.rank_by {
            RankKey::Name => state.rank_id = None,
            RankKey::Unique => {
                if let Some(id) = state.rank_id {
                    self.rank.set_name(id, name);
                }
            }
        }
        self.stats.set_name(slot, name);
    }

    fn ranked_subject(&self, slot: PlayerSlot) -> bool {
        self.players[slot.index()].connected && self.world.player_valid(slot)
    }

    fn in_game(&self) -> Vec<PlayerSlot> {
        PlayerSlot::all().filter(|s| self.ranked_subject(*s)).collect()
    }

    // =========================================================================
    // MESSAGE DECODING
    // =========================================================================

    /// Starts an engine message aimed at `subject` (or broadcast).
    pub fn message_begin(&mut self, id: i32, subject: Option<EntityHandle>) {
        let slot = subject.and_then(|e| self.world.player_of(e));
        self.subject_entity = subject;
        self.scratch = MessageScratch::default();
        self.decoder.begin(id, slot);
    }

    /// Subject of the current call, `None` once its entity was freed.
    fn live_subject(&self, subject: Option<PlayerSlot>) -> Option<PlayerSlot> {
        let entity = self.subject_entity?;
        subject.filter(|s| self.world.entity_valid(entity) && self.ranked_subject(*s))
    }

    /// Feeds one field write of the current message.
    pub fn message_field(&mut self, value: FieldValue<'_>) {
        let Some(call) = self.decoder.field() else { return };
        let subject = self.live_subject(call.subject);
        let int = value.as_int();
        let now = self.world.now();

        match call.slot {
            FieldSlot::SwitchFlag => self.scratch.switch.active = int.is_some_and(|v| v != 0),
            FieldSlot::WeaponId => self.scratch.switch.weapon = int.unwrap_or(-1),
            FieldSlot::Clip => self.scratch.switch.clip = int.unwrap_or(-1),
            FieldSlot::ScorePlayer => {
                self.scratch.score_player = int.and_then(PlayerSlot::new);
            }
            FieldSlot::ScoreValue => {
                if let (Some(player), Some(score)) = (self.scratch.score_player, int) {
                    self.objective_score(player, score, now);
                }
            }
            FieldSlot::RoundStateValue => {
                if int == Some(1) {
                    let at = now + self.config.reset_delay_secs;
                    for slot in self.in_game() {
                        self.stats.schedule_round_reset(slot, at);
                    }
                }
            }
            FieldSlot::TeamIndex => self.scratch.team_index = int.unwrap_or(0),
            FieldSlot::TeamScoreValue => {
                let team = self.scratch.team_index;
                if let (Some(index), Some(score)) = (Self::team_slot(team), int) {
                    self.team_scores[index] = score;
                    self.events.send(StatsEvent::TeamScore { team, score });
                }
            }
            FieldSlot::AmmoSlot => self.scratch.ammo_slot = int.unwrap_or(-1),
            FieldSlot::AmmoAmount => {
                let ammo_slot = u8::try_from(self.scratch.ammo_slot).ok();
                if let (Some(player), Some(ammo_slot), Some(amount)) = (subject, ammo_slot, int) {
                    self.stats.set_ammo(player, ammo_slot, amount);
                }
            }
            FieldSlot::FovValue => {
                if let (Some(player), Some(fov)) = (subject, int) {
                    self.players[player.index()].fov = fov;
                }
            }
            FieldSlot::ObjectName => {
                if let Some(player) = subject {
                    let near = self.world.carriable_object_near(player);
                    let state = &mut self.players[player.index()];
                    if state.carrying {
                        state.object_forward = true;
                    } else if let Some(object) = near {
                        state.object = Some(object);
                        state.object_forward = true;
                    }
                }
            }
            FieldSlot::StatusPlayer => {
                if let Some(player) = int.and_then(PlayerSlot::new) {
                    self.events.send(StatsEvent::Spawn { player });
                }
            }
        }
    }

    /// Ends the current message and runs its end handler.
    pub fn message_end(&mut self) {
        let Some(call) = self.decoder.end() else { return };
        let subject = self.live_subject(call.subject);
        self.subject_entity = None;
        let Some(player) = subject else { return };
        let now = self.world.now();

        match call.slot {
            EndSlot::WeaponSwitch => {
                if self.config.paused {
                    return;
                }
                let record = self.scratch.switch;
                if let Some(event) = self.correlator.weapon_switch(&self.world, &mut self.stats, player, record) {
                    self.events.send(event);
                }
            }
            EndSlot::Damage => {
                if self.config.paused {
                    return;
                }
                if let Some(res) = self.correlator.resolve_damage(&mut self.world, &mut self.stats, player) {
                    self.events.send(res.damage_event());
                    if let Some(death) = res.death_event() {
                        self.events.send(death);
                    }
                }
            }
            EndSlot::LifeReset => {
                self.stats
                    .schedule_life_reset(player, now + self.config.reset_delay_secs, false);
            }
            EndSlot::ScopeCheck => {
                let state = &mut self.players[player.index()];
                let scoped = !UNSCOPED_FOV.contains(&state.fov);
                if scoped != state.scoped {
                    state.scoped = scoped;
                    let fov = state.fov;
                    self.events.send(StatsEvent::Scope { player, scoped, fov });
                }
            }
            EndSlot::ObjectToggle => self.toggle_object(player),
        }
    }

    fn objective_score(&mut self, player: PlayerSlot, score: i32, now: f32) {
        let paused = self.config.paused;
        let delay = self.config.score_notify_delay_secs;
        let state = &mut self.players[player.index()];
        if !state.connected {
            return;
        }
        let delta = score.wrapping_sub(state.saved_score);
        state.last_score = delta;
        state.saved_score = score;
        if delta != 0 && !paused {
            state.send_score_at = Some(now + delay);
            self.stats.update_score(player, delta);
        }
    }

    fn toggle_object(&mut self, player: PlayerSlot) {
        let state = &mut self.players[player.index()];
        if !state.object_forward {
            return;
        }
        state.object_forward = false;
        state.carrying = !state.carrying;
        let carrying = state.carrying;
        let object = state.object;
        if !carrying {
            state.object = None;
        }

        if let Some(object) = object.filter(|o| self.world.entity_valid(*o)) {
            let position = self.world.entity_origin(object).unwrap_or_default();
            self.events.send(StatsEvent::ObjectPickup {
                player,
                object,
                position,
                carrying,
            });
        }
    }

    const fn team_slot(team: i32) -> Option<usize> {
        match team {
            TEAM_ALLIES => Some(0),
            TEAM_AXIS => Some(1),
            _ => None,
        }
    }

    // =========================================================================
    // TRACES
    // =========================================================================

    /// A shooter's trace hit a player in `hit_group`.
    pub fn aim_trace(&mut self, shooter: PlayerSlot, hit_group: i32) {
        self.correlator.aim_trace(&mut self.stats, shooter, hit_group);
    }

    /// A projectile owned by `owner` traced at `position`.
    pub fn projectile_trace(
        &mut self,
        owner: PlayerSlot,
        projectile: EntityHandle,
        classname: &str,
        position: [f32; 3],
    ) {
        if self.config.paused || !self.ranked_subject(owner) {
            return;
        }
        if let Some(event) = self.correlator.projectile_trace(
            &self.world,
            &mut self.stats,
            owner,
            projectile,
            classname,
            position,
        ) {
            self.events.send(event);
        }
    }

    // =========================================================================
    // PER-TICK POLL
    // =========================================================================

    /// Applies due clears and delayed score notifications for a player.
    pub fn think(&mut self, slot: PlayerSlot) {
        if !self.ranked_subject(slot) {
            return;
        }
        let now = self.world.now();
        let due = self.stats.take_due(slot, now);

        if let Some(full) = due.life {
            self.flush_life(slot);
            self.stats.restart(slot, full);
        }
        if due.round {
            self.stats.clear_round(slot);
        }

        let state = &mut self.players[slot.index()];
        if state.send_score_at.is_some_and(|at| now >= at) {
            state.send_score_at = None;
            self.events.send(StatsEvent::Score {
                player: slot,
                delta: state.last_score,
                total: state.saved_score,
            });
        }
    }

    /// Merges the player's life counters into the rank store.
    fn flush_life(&mut self, slot: PlayerSlot) {
        if !self.config.rank_bots && self.world.is_bot(slot) {
            return;
        }
        let Some(life) = self.stats.query(slot, Scope::Life, StatFilter::All).copied() else {
            return;
        };
        if life.is_zero() {
            return;
        }

        let state = &mut self.players[slot.index()];
        let unique = match self.config.rank_by {
            RankKey::Name => None,
            RankKey::Unique => Some(state.unique.as_str()),
        };
        let id = self.rank.find_or_create(&state.name, unique);
        state.rank_id = Some(id);
        if self.rank.update_position(id, &life).is_none() {
            tracing::debug!("rank entry for {} evicted on flush", state.name);
            state.rank_id = None;
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Counters of a connected player.
    #[must_use]
    pub fn stats(&self, slot: PlayerSlot, scope: Scope, filter: StatFilter) -> Option<&WeaponStatEntry> {
        if !self.players[slot.index()].connected {
            return None;
        }
        self.stats.query(slot, scope, filter)
    }

    /// Session-scope versus entry with the opponent's name.
    #[must_use]
    pub fn versus(&self, slot: PlayerSlot, filter: StatFilter) -> Option<&VersusEntry> {
        if !self.players[slot.index()].connected {
            return None;
        }
        self.stats.versus(slot, filter)
    }

    /// The player's rank entry and 1-based position.
    #[must_use]
    pub fn rank_stats(&self, slot: PlayerSlot) -> Option<(&RankEntry, usize)> {
        let state = &self.players[slot.index()];
        if !state.connected {
            return None;
        }
        let unique = match self.config.rank_by {
            RankKey::Name => None,
            RankKey::Unique => Some(state.unique.as_str()),
        };
        let id = self.rank.find(&state.name, unique)?;
        Some((self.rank.get(id)?, self.rank.position_of(id)?))
    }

    /// Entry at a 1-based position, plus whether another follows.
    #[must_use]
    pub fn rank_entry_at(&self, position: usize) -> Option<(&RankEntry, bool)> {
        let entry = self.rank.entry_at(position)?;
        Some((entry, position < self.rank.len()))
    }

    /// Number of rank entries.
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.rank.len()
    }

    /// Latest score of a team.
    #[must_use]
    pub fn team_score(&self, team: i32) -> Option<i32> {
        Self::team_slot(team).map(|i| self.team_scores[i])
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    /// Clears every scope and opponent table of one player.
    pub fn reset_player_stats(&mut self, slot: PlayerSlot) {
        if self.players[slot.index()].connected {
            self.stats.restart(slot, true);
        }
    }

    /// Clears every scope of every connected player.
    pub fn reset_all_stats(&mut self) {
        for slot in PlayerSlot::all() {
            self.reset_player_stats(slot);
        }
    }

    /// Asks consumers to persist the stats of every player in game.
    pub fn flush_all_stats(&self) {
        for player in self.in_game() {
            self.events.send(StatsEvent::StatsFlush { player });
        }
    }

    /// Sets the match id, truncated to [`MAX_MATCH_ID`] characters.
    pub fn set_match_id(&mut self, id: &str) {
        self.match_id = id.chars().take(MAX_MATCH_ID).collect();
    }

    /// Current match id, empty when unset.
    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    fn close_match(&mut self) {
        for slot in self.in_game() {
            self.flush_life(slot);
            // flushed lives must not merge again on a later disconnect
            self.stats.restart(slot, false);
        }
        if self.config.reset_rank_on_teardown {
            tracing::info!("rank reset on teardown");
            self.rank.clear();
        }
        self.correlator.clear_projectiles();
    }

    /// Flushes players in game and writes the rank file.
    ///
    /// # Errors
    ///
    /// Returns `Rank` when the file cannot be written.
    pub fn teardown(&mut self) -> TrackerResult<()> {
        self.close_match();
        self.rank.save(&self.config.rank_file)?;
        Ok(())
    }

    /// Like [`Self::teardown`], but hands the write to a background saver.
    ///
    /// # Errors
    ///
    /// Returns `Rank` when the saver has shut down.
    pub fn teardown_background(&mut self, saver: &RankSaver) -> TrackerResult<()> {
        self.close_match();
        saver.submit(&self.rank, &self.config.rank_file)?;
        Ok(())
    }
}
