//! # Game World Interface
//!
//! Everything the tracker needs from the host engine, behind one trait.
//!
//! ## Architecture
//!
//! ```text
//! Tracker defines:       Engine binding implements:
//! ┌─────────────────┐    ┌─────────────────┐
//! │ trait GameWorld │ ←─ │ impl GameWorld  │
//! └─────────────────┘    └─────────────────┘
//! ```
//!
//! [`MockWorld`] is a scriptable in-memory implementation for tests and
//! tooling.

use skirmish_core::{EntityHandle, PlayerSlot, WeaponId, MAX_PLAYERS};
use std::collections::HashMap;

/// Damage waiting on a player, as delivered by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageReport {
    /// Entity that dealt the damage (player, projectile, or world).
    pub inflictor: EntityHandle,
    /// Raw damage amount.
    pub amount: i32,
}

/// Host engine queries consumed by the tracker.
pub trait GameWorld {
    /// Monotonic match time in seconds.
    fn now(&self) -> f32;

    /// True while the entity exists and has not been freed.
    fn entity_valid(&self, entity: EntityHandle) -> bool;

    /// Slot of the in-game player owning this entity, if it is one.
    fn player_of(&self, entity: EntityHandle) -> Option<PlayerSlot>;

    /// Slot is connected, in game, and its entity is not freed.
    fn player_valid(&self, slot: PlayerSlot) -> bool;

    /// Player's vitality is positive.
    fn is_alive(&self, slot: PlayerSlot) -> bool;

    /// Team affiliation, if assigned.
    fn team(&self, slot: PlayerSlot) -> Option<i32>;

    /// Player is a bot.
    fn is_bot(&self, slot: PlayerSlot) -> bool;

    /// The concrete weapon variant the player holds right now.
    fn equipped_weapon(&self, slot: PlayerSlot) -> Option<WeaponId>;

    /// Takes the damage pending on a player. A second call returns `None`
    /// until new damage lands.
    fn take_damage(&mut self, slot: PlayerSlot) -> Option<DamageReport>;

    /// A carriable objective within pickup range of the player.
    fn carriable_object_near(&self, slot: PlayerSlot) -> Option<EntityHandle>;

    /// World position of an entity.
    fn entity_origin(&self, entity: EntityHandle) -> Option<[f32; 3]>;
}

// ============================================================================
// MOCK
// ============================================================================

/// State of one scripted player.
#[derive(Clone, Debug)]
pub struct MockPlayer {
    /// The player's entity.
    pub entity: EntityHandle,
    /// Connected and in game.
    pub in_game: bool,
    /// Vitality positive.
    pub alive: bool,
    /// Team affiliation.
    pub team: Option<i32>,
    /// Bot flag.
    pub bot: bool,
    /// Equipped weapon variant.
    pub equipped: Option<WeaponId>,
    /// Damage waiting to be taken.
    pub pending_damage: Option<DamageReport>,
    /// Object within pickup range.
    pub near_object: Option<EntityHandle>,
}

/// Scriptable in-memory world.
#[derive(Debug)]
pub struct MockWorld {
    time: f32,
    players: Vec<Option<MockPlayer>>,
    entities: HashMap<EntityHandle, [f32; 3]>,
    next_index: u32,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorld {
    /// Creates an empty world at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            players: vec![None; MAX_PLAYERS],
            entities: HashMap::new(),
            next_index: MAX_PLAYERS as u32 + 1,
        }
    }

    /// Sets the clock.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Advances the clock.
    pub fn advance(&mut self, seconds: f32) {
        self.time += seconds;
    }

    /// Puts a living player on a team and returns its entity.
    pub fn join(&mut self, slot: PlayerSlot, team: i32) -> EntityHandle {
        let entity = match &self.players[slot.index()] {
            Some(old) => old.entity.next_generation(),
            None => EntityHandle::new(u32::from(slot.get()), 0),
        };
        self.entities.insert(entity, [0.0; 3]);
        self.players[slot.index()] = Some(MockPlayer {
            entity,
            in_game: true,
            alive: true,
            team: Some(team),
            bot: false,
            equipped: None,
            pending_damage: None,
            near_object: None,
        });
        entity
    }

    /// Removes a player and frees its entity.
    pub fn leave(&mut self, slot: PlayerSlot) {
        if let Some(p) = self.players[slot.index()].as_mut() {
            p.in_game = false;
            self.entities.remove(&p.entity);
        }
    }

    /// Scripted player state.
    #[must_use]
    pub fn player(&self, slot: PlayerSlot) -> Option<&MockPlayer> {
        self.players[slot.index()].as_ref()
    }

    /// Mutable scripted player state.
    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut MockPlayer> {
        self.players[slot.index()].as_mut()
    }

    /// Entity of a player.
    #[must_use]
    pub fn entity_of(&self, slot: PlayerSlot) -> Option<EntityHandle> {
        self.player(slot).map(|p| p.entity)
    }

    /// Creates a non-player entity.
    pub fn spawn_entity(&mut self, origin: [f32; 3]) -> EntityHandle {
        let entity = EntityHandle::new(self.next_index, 0);
        self.next_index += 1;
        self.entities.insert(entity, origin);
        entity
    }

    /// Frees an entity. Player entities become invalid too.
    pub fn free_entity(&mut self, entity: EntityHandle) {
        self.entities.remove(&entity);
    }

    /// Queues damage on a victim.
    pub fn hurt(&mut self, victim: PlayerSlot, inflictor: EntityHandle, amount: i32) {
        if let Some(p) = self.player_mut(victim) {
            p.pending_damage = Some(DamageReport { inflictor, amount });
        }
    }

    /// Sets a player's vitality flag.
    pub fn set_alive(&mut self, slot: PlayerSlot, alive: bool) {
        if let Some(p) = self.player_mut(slot) {
            p.alive = alive;
        }
    }

    /// Sets a player's equipped weapon variant.
    pub fn set_equipped(&mut self, slot: PlayerSlot, weapon: Option<WeaponId>) {
        if let Some(p) = self.player_mut(slot) {
            p.equipped = weapon;
        }
    }

    /// Marks a player as a bot.
    pub fn set_bot(&mut self, slot: PlayerSlot, bot: bool) {
        if let Some(p) = self.player_mut(slot) {
            p.bot = bot;
        }
    }

    /// Places a carriable object next to a player.
    pub fn place_object(&mut self, slot: PlayerSlot, origin: [f32; 3]) -> EntityHandle {
        let object = self.spawn_entity(origin);
        if let Some(p) = self.player_mut(slot) {
            p.near_object = Some(object);
        }
        object
    }
}

impl GameWorld for MockWorld {
    fn now(&self) -> f32 {
        self.time
    }

    fn entity_valid(&self, entity: EntityHandle) -> bool {
        self.entities.contains_key(&entity)
    }

    fn player_of(&self, entity: EntityHandle) -> Option<PlayerSlot> {
        if !self.entity_valid(entity) {
            return None;
        }
        PlayerSlot::all().find(|slot| {
            self.player(*slot)
                .is_some_and(|p| p.in_game && p.entity == entity)
        })
    }

    fn player_valid(&self, slot: PlayerSlot) -> bool {
        self.player(slot)
            .is_some_and(|p| p.in_game && self.entity_valid(p.entity))
    }

    fn is_alive(&self, slot: PlayerSlot) -> bool {
        self.player(slot).is_some_and(|p| p.alive)
    }

    fn team(&self, slot: PlayerSlot) -> Option<i32> {
        self.player(slot).and_then(|p| p.team)
    }

    fn is_bot(&self, slot: PlayerSlot) -> bool {
        self.player(slot).is_some_and(|p| p.bot)
    }

    fn equipped_weapon(&self, slot: PlayerSlot) -> Option<WeaponId> {
        self.player(slot).and_then(|p| p.equipped)
    }

    fn take_damage(&mut self, slot: PlayerSlot) -> Option<DamageReport> {
        self.player_mut(slot).and_then(|p| p.pending_damage.take())
    }

    fn carriable_object_near(&self, slot: PlayerSlot) -> Option<EntityHandle> {
        self.player(slot)
            .and_then(|p| p.near_object)
            .filter(|o| self.entity_valid(*o))
    }

    fn entity_origin(&self, entity: EntityHandle) -> Option<[f32; 3]> {
        self.entities.get(&entity).copied()
    }
}
