//! # Stat Accumulator
//!
//! Per-player counters across three temporal scopes.
//!
//! ## Scopes
//!
//! ```text
//! Session ├──────────────────────────────────────────────┤ connect..disconnect
//! Round   ├────────────────────┤├─────────────────────────┤ round start..start
//! Life    ├──────┤├────────┤├───┤├──────┤├────────────────┤ spawn..spawn
//! ```
//!
//! Every shot, hit, and kill lands in all three scopes at once, both in
//! the aggregate and in the per-weapon breakdown. Per-opponent tables are
//! kept for the session only.
//!
//! ## Deferred Clears
//!
//! Clears are scheduled for a future time and applied by [`StatAccumulator::take_due`]
//! on the next poll at or after that time, so events still in flight for
//! the current tick observe the old values. A new schedule overwrites
//! the previous one.

use skirmish_core::{weapon, BodyRegion, PlayerSlot, WeaponId, WeaponStatEntry, MAX_PLAYERS, MAX_WEAPONS};
use skirmish_rank::PointTable;
use std::sync::Arc;

/// Temporal scope of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Since last spawn.
    Life,
    /// Since round start.
    Round,
    /// Since connect.
    Session,
}

/// What to select within a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatFilter {
    /// The scope aggregate.
    All,
    /// One weapon.
    Weapon(WeaponId),
    /// What this opponent did to the player (session scope only).
    Attacker(PlayerSlot),
    /// What the player did to this opponent (session scope only).
    Victim(PlayerSlot),
}

/// Counters against one opponent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersusEntry {
    /// Counters.
    pub stats: WeaponStatEntry,
    /// Opponent name at the last recorded interaction.
    pub name: String,
}

/// A scheduled life clear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingClear {
    /// Trigger time.
    pub at: f32,
    /// Also clear round, session, and per-opponent tables.
    pub full: bool,
}

/// Clears that came due on a poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DueResets {
    /// A life clear is due; the flag is its `full` setting.
    pub life: Option<bool>,
    /// A round clear is due.
    pub round: bool,
}

/// Per-weapon breakdown for one scope.
type WeaponTable = [WeaponStatEntry; MAX_WEAPONS];

/// All counters of one player slot.
#[derive(Clone, Debug)]
pub struct PlayerStatBlock {
    life: WeaponStatEntry,
    round: WeaponStatEntry,
    session: WeaponStatEntry,
    weapons_life: WeaponTable,
    weapons_round: WeaponTable,
    weapons_session: WeaponTable,
    attackers: Vec<VersusEntry>,
    victims: Vec<VersusEntry>,
    clips: [Option<i32>; MAX_WEAPONS],
    ammo: [i32; MAX_WEAPONS],
    current_weapon: WeaponId,
    last_region: Option<BodyRegion>,
    name: String,
    pending_life: Option<PendingClear>,
    pending_round: Option<f32>,
}

impl Default for PlayerStatBlock {
    fn default() -> Self {
        Self {
            life: WeaponStatEntry::ZERO,
            round: WeaponStatEntry::ZERO,
            session: WeaponStatEntry::ZERO,
            weapons_life: [WeaponStatEntry::ZERO; MAX_WEAPONS],
            weapons_round: [WeaponStatEntry::ZERO; MAX_WEAPONS],
            weapons_session: [WeaponStatEntry::ZERO; MAX_WEAPONS],
            attackers: vec![VersusEntry::default(); MAX_PLAYERS],
            victims: vec![VersusEntry::default(); MAX_PLAYERS],
            clips: [None; MAX_WEAPONS],
            ammo: [0; MAX_WEAPONS],
            current_weapon: WeaponId::NONE,
            last_region: None,
            name: String::new(),
            pending_life: None,
            pending_round: None,
        }
    }
}

impl PlayerStatBlock {
    /// Applies `f` to the weapon's entry and the aggregate of every scope.
    fn for_each_scope(&mut self, id: WeaponId, mut f: impl FnMut(&mut WeaponStatEntry)) {
        let i = id.index();
        f(&mut self.weapons_life[i]);
        f(&mut self.weapons_round[i]);
        f(&mut self.weapons_session[i]);
        f(&mut self.life);
        f(&mut self.round);
        f(&mut self.session);
    }

    fn aggregate(&self, scope: Scope) -> &WeaponStatEntry {
        match scope {
            Scope::Life => &self.life,
            Scope::Round => &self.round,
            Scope::Session => &self.session,
        }
    }

    fn weapons(&self, scope: Scope) -> &WeaponTable {
        match scope {
            Scope::Life => &self.weapons_life,
            Scope::Round => &self.weapons_round,
            Scope::Session => &self.weapons_session,
        }
    }

    /// Weapon currently held.
    #[must_use]
    pub const fn current_weapon(&self) -> WeaponId {
        self.current_weapon
    }

    /// Region of the player's most recent traced hit.
    #[must_use]
    pub const fn last_region(&self) -> Option<BodyRegion> {
        self.last_region
    }

    /// Name used in opponents' versus entries.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheduled life clear.
    #[must_use]
    pub const fn pending_life(&self) -> Option<PendingClear> {
        self.pending_life
    }

    /// Scheduled round clear time.
    #[must_use]
    pub const fn pending_round(&self) -> Option<f32> {
        self.pending_round
    }
}

/// All players' counters.
#[derive(Debug)]
pub struct StatAccumulator {
    players: Vec<PlayerStatBlock>,
    points: Arc<PointTable>,
}

impl StatAccumulator {
    /// Creates blocks for every slot.
    #[must_use]
    pub fn new(points: Arc<PointTable>) -> Self {
        Self {
            players: vec![PlayerStatBlock::default(); MAX_PLAYERS],
            points,
        }
    }

    /// A player's block.
    #[must_use]
    pub fn player(&self, slot: PlayerSlot) -> &PlayerStatBlock {
        &self.players[slot.index()]
    }

    fn block(&mut self, slot: PlayerSlot) -> &mut PlayerStatBlock {
        &mut self.players[slot.index()]
    }

    /// Wipes a slot for a newly connected player.
    pub fn reset_player(&mut self, slot: PlayerSlot, name: &str) {
        let block = self.block(slot);
        *block = PlayerStatBlock::default();
        block.name = name.to_owned();
    }

    /// Updates the name shown in opponents' versus entries.
    pub fn set_name(&mut self, slot: PlayerSlot, name: &str) {
        name.clone_into(&mut self.block(slot).name);
    }

    // =========================================================================
    // RECORDING
    // =========================================================================

    /// Records a shot fired.
    pub fn record_shot(&mut self, slot: PlayerSlot, id: WeaponId) {
        self.block(slot).for_each_scope(id, |e| e.shots = e.shots.saturating_add(1));
    }

    /// Records a hit by `attacker` on `victim`. Damage is raw.
    pub fn record_hit(
        &mut self,
        attacker: PlayerSlot,
        victim: PlayerSlot,
        id: WeaponId,
        damage: i32,
        region: Option<BodyRegion>,
    ) {
        let points = self.points.hit_points(id);
        let attacker_name = self.player(attacker).name.clone();
        let victim_name = self.player(victim).name.clone();

        let a = self.block(attacker);
        a.for_each_scope(id, |e| {
            e.add_hit(damage, region);
            e.points = e.points.saturating_add(points);
        });
        let mine = &mut a.victims[victim.index()];
        mine.stats.add_hit(damage, region);
        mine.stats.points = mine.stats.points.saturating_add(points);
        mine.name = victim_name;

        let theirs = &mut self.block(victim).attackers[attacker.index()];
        theirs.stats.add_hit(damage, region);
        theirs.name = attacker_name;
    }

    /// Records a kill. `attacker == victim` records only the death.
    pub fn record_kill(
        &mut self,
        attacker: PlayerSlot,
        victim: PlayerSlot,
        id: WeaponId,
        headshot: bool,
        teamkill: bool,
    ) {
        if attacker != victim {
            let points = self.points.kill_points(id, teamkill);
            let a = self.block(attacker);
            a.for_each_scope(id, |e| {
                e.add_kill(headshot, teamkill);
                e.points = e.points.saturating_add(points);
            });
            let mine = &mut a.victims[victim.index()].stats;
            mine.add_kill(headshot, teamkill);
            mine.points = mine.points.saturating_add(points);

            let theirs = &mut self.block(victim).attackers[attacker.index()].stats;
            theirs.add_kill(headshot, teamkill);
        }

        let v = self.block(victim);
        let held = v.current_weapon;
        v.for_each_scope(held, |e| e.deaths = e.deaths.saturating_add(1));
    }

    /// Adds objective points under the current weapon.
    pub fn update_score(&mut self, slot: PlayerSlot, delta: i32) {
        let block = self.block(slot);
        let held = block.current_weapon;
        block.for_each_scope(held, |e| e.points = e.points.saturating_add(delta));
    }

    // =========================================================================
    // WEAPON STATE
    // =========================================================================

    /// Sets the held weapon, returning the previous one.
    pub fn set_current_weapon(&mut self, slot: PlayerSlot, id: WeaponId) -> WeaponId {
        std::mem::replace(&mut self.block(slot).current_weapon, id)
    }

    /// Records the region of the player's latest traced hit.
    pub fn set_last_region(&mut self, slot: PlayerSlot, region: Option<BodyRegion>) {
        self.block(slot).last_region = region;
    }

    /// Stores a clip count, returning the previous observation.
    pub fn swap_clip(&mut self, slot: PlayerSlot, id: WeaponId, clip: i32) -> Option<i32> {
        self.block(slot).clips[id.index()].replace(clip)
    }

    /// Last observed clip count.
    #[must_use]
    pub fn clip(&self, slot: PlayerSlot, id: WeaponId) -> Option<i32> {
        self.player(slot).clips[id.index()]
    }

    /// Sets reserve ammo on every weapon drawing from `ammo_slot`.
    pub fn set_ammo(&mut self, slot: PlayerSlot, ammo_slot: u8, amount: i32) {
        let block = self.block(slot);
        for id in weapon::sharing_ammo_slot(ammo_slot) {
            block.ammo[id.index()] = amount;
        }
    }

    /// Reserve ammo of a weapon.
    #[must_use]
    pub fn ammo(&self, slot: PlayerSlot, id: WeaponId) -> i32 {
        self.player(slot).ammo[id.index()]
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Returns the selected counters, or `None` when they hold no data.
    ///
    /// Aggregates are always present. Weapon entries need at least one
    /// shot. Versus entries need at least one hit and exist only in
    /// [`Scope::Session`].
    #[must_use]
    pub fn query(&self, slot: PlayerSlot, scope: Scope, filter: StatFilter) -> Option<&WeaponStatEntry> {
        let block = self.player(slot);
        match filter {
            StatFilter::All => Some(block.aggregate(scope)),
            StatFilter::Weapon(id) => {
                Some(&block.weapons(scope)[id.index()]).filter(|e| !e.has_no_shots())
            }
            StatFilter::Attacker(_) | StatFilter::Victim(_) => {
                (scope == Scope::Session).then_some(())?;
                self.versus(slot, filter).map(|v| &v.stats)
            }
        }
    }

    /// Versus entry with its opponent name, `None` without hits.
    #[must_use]
    pub fn versus(&self, slot: PlayerSlot, filter: StatFilter) -> Option<&VersusEntry> {
        let block = self.player(slot);
        let entry = match filter {
            StatFilter::Attacker(other) => &block.attackers[other.index()],
            StatFilter::Victim(other) => &block.victims[other.index()],
            StatFilter::All | StatFilter::Weapon(_) => return None,
        };
        (entry.stats.hits != 0).then_some(entry)
    }

    // =========================================================================
    // RESETS
    // =========================================================================

    /// Schedules a life clear at `at`, replacing any earlier schedule.
    pub fn schedule_life_reset(&mut self, slot: PlayerSlot, at: f32, full: bool) {
        self.block(slot).pending_life = Some(PendingClear { at, full });
    }

    /// Schedules a round clear at `at`, replacing any earlier schedule.
    pub fn schedule_round_reset(&mut self, slot: PlayerSlot, at: f32) {
        self.block(slot).pending_round = Some(at);
    }

    /// Cancels and returns the clears due at `now`. The caller applies
    /// them with [`Self::restart`] and [`Self::clear_round`].
    pub fn take_due(&mut self, slot: PlayerSlot, now: f32) -> DueResets {
        let block = self.block(slot);
        let mut due = DueResets::default();
        if let Some(pending) = block.pending_life.filter(|p| now >= p.at) {
            block.pending_life = None;
            due.life = Some(pending.full);
        }
        if block.pending_round.is_some_and(|at| now >= at) {
            block.pending_round = None;
            due.round = true;
        }
        due
    }

    /// Clears life counters; `full` also clears round, session, and
    /// per-opponent tables.
    pub fn restart(&mut self, slot: PlayerSlot, full: bool) {
        let block = self.block(slot);
        block.life.clear();
        block.weapons_life = [WeaponStatEntry::ZERO; MAX_WEAPONS];
        if full {
            block.round.clear();
            block.weapons_round = [WeaponStatEntry::ZERO; MAX_WEAPONS];
            block.session.clear();
            block.weapons_session = [WeaponStatEntry::ZERO; MAX_WEAPONS];
            block.attackers.fill(VersusEntry::default());
            block.victims.fill(VersusEntry::default());
        }
    }

    /// Clears round counters.
    pub fn clear_round(&mut self, slot: PlayerSlot) {
        let block = self.block(slot);
        block.round.clear();
        block.weapons_round = [WeaponStatEntry::ZERO; MAX_WEAPONS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_rank::WeaponPoints;

    const GARAND: i32 = 5;
    const COLT: i32 = 3;

    fn slot(n: i32) -> PlayerSlot {
        PlayerSlot::new(n).unwrap()
    }

    fn wid(n: i32) -> WeaponId {
        WeaponId::new(n).unwrap()
    }

    fn acc() -> StatAccumulator {
        StatAccumulator::new(Arc::new(PointTable::default()))
    }

    #[test]
    fn test_shot_lands_in_all_scopes() {
        let mut acc = acc();
        acc.record_shot(slot(1), wid(GARAND));
        for scope in [Scope::Life, Scope::Round, Scope::Session] {
            assert_eq!(acc.query(slot(1), scope, StatFilter::All).unwrap().shots, 1);
            assert_eq!(acc.query(slot(1), scope, StatFilter::Weapon(wid(GARAND))).unwrap().shots, 1);
        }
    }

    #[test]
    fn test_unused_weapon_is_absent() {
        let mut acc = acc();
        acc.record_shot(slot(1), wid(GARAND));
        assert!(acc.query(slot(1), Scope::Session, StatFilter::Weapon(wid(COLT))).is_none());
        // aggregates are present even when empty
        assert!(acc.query(slot(2), Scope::Life, StatFilter::All).is_some());
    }

    #[test]
    fn test_weapon_with_shots_but_no_kills_is_present() {
        let mut acc = acc();
        acc.record_shot(slot(1), wid(COLT));
        let entry = acc.query(slot(1), Scope::Round, StatFilter::Weapon(wid(COLT))).unwrap();
        assert_eq!(entry.kills, 0);
    }

    #[test]
    fn test_hit_updates_both_perspectives() {
        let mut acc = acc();
        acc.reset_player(slot(1), "alpha");
        acc.reset_player(slot(2), "bravo");
        acc.record_hit(slot(1), slot(2), wid(GARAND), 120, Some(BodyRegion::Head));

        let mine = acc.versus(slot(1), StatFilter::Victim(slot(2))).unwrap();
        assert_eq!(mine.stats.hits, 1);
        assert_eq!(mine.stats.damage, 120);
        assert_eq!(mine.name, "bravo");

        let theirs = acc.versus(slot(2), StatFilter::Attacker(slot(1))).unwrap();
        assert_eq!(theirs.stats.body_hits[BodyRegion::Head.index()], 1);
        assert_eq!(theirs.name, "alpha");

        assert!(acc.query(slot(1), Scope::Life, StatFilter::Victim(slot(2))).is_none());
        assert!(acc.versus(slot(1), StatFilter::Attacker(slot(2))).is_none());
    }

    #[test]
    fn test_kill_records_victim_death_under_held_weapon() {
        let mut acc = acc();
        acc.set_current_weapon(slot(2), wid(COLT));
        acc.record_kill(slot(1), slot(2), wid(GARAND), true, false);

        let killer = acc.query(slot(1), Scope::Life, StatFilter::All).unwrap();
        assert_eq!((killer.kills, killer.headshots, killer.deaths), (1, 1, 0));

        let victim = acc.player(slot(2));
        assert_eq!(victim.life.deaths, 1);
        assert_eq!(victim.weapons_session[COLT as usize].deaths, 1);
        assert_eq!(victim.attackers[0].stats.kills, 1);
    }

    #[test]
    fn test_self_kill_is_death_only() {
        let mut acc = acc();
        acc.record_kill(slot(3), slot(3), WeaponId::NONE, false, false);
        let s = acc.query(slot(3), Scope::Session, StatFilter::All).unwrap();
        assert_eq!((s.kills, s.deaths), (0, 1));
    }

    #[test]
    fn test_points_from_table() {
        let table = PointTable::uniform(WeaponPoints { kill: 3, hit: 1, teamkill: -5 });
        let mut acc = StatAccumulator::new(Arc::new(table));
        acc.record_hit(slot(1), slot(2), wid(GARAND), 30, None);
        acc.record_kill(slot(1), slot(2), wid(GARAND), false, false);
        acc.record_kill(slot(1), slot(3), wid(GARAND), false, true);
        assert_eq!(acc.query(slot(1), Scope::Life, StatFilter::All).unwrap().points, 1 + 3 - 5);
    }

    #[test]
    fn test_deferred_clear_applies_once() {
        let mut acc = acc();
        acc.record_shot(slot(1), wid(GARAND));
        acc.schedule_life_reset(slot(1), 10.25, false);

        assert_eq!(acc.take_due(slot(1), 10.0), DueResets::default());
        let due = acc.take_due(slot(1), 10.25);
        assert_eq!(due.life, Some(false));
        assert_eq!(acc.take_due(slot(1), 11.0), DueResets::default());
    }

    #[test]
    fn test_later_schedule_overwrites() {
        let mut acc = acc();
        acc.schedule_round_reset(slot(1), 5.0);
        acc.schedule_round_reset(slot(1), 8.0);
        assert!(!acc.take_due(slot(1), 6.0).round);
        assert!(acc.take_due(slot(1), 8.0).round);
    }

    #[test]
    fn test_plain_restart_keeps_versus_and_session() {
        let mut acc = acc();
        acc.record_shot(slot(1), wid(GARAND));
        acc.record_hit(slot(1), slot(2), wid(GARAND), 10, None);
        acc.restart(slot(1), false);

        assert_eq!(acc.query(slot(1), Scope::Life, StatFilter::All).unwrap().shots, 0);
        assert!(acc.query(slot(1), Scope::Life, StatFilter::Weapon(wid(GARAND))).is_none());
        assert_eq!(acc.query(slot(1), Scope::Round, StatFilter::All).unwrap().shots, 1);
        assert!(acc.versus(slot(1), StatFilter::Victim(slot(2))).is_some());
    }

    #[test]
    fn test_full_restart_clears_versus() {
        let mut acc = acc();
        acc.record_hit(slot(1), slot(2), wid(GARAND), 10, None);
        acc.restart(slot(1), true);
        assert!(acc.versus(slot(1), StatFilter::Victim(slot(2))).is_none());
        assert!(acc.query(slot(1), Scope::Session, StatFilter::All).unwrap().is_zero());
    }

    #[test]
    fn test_ammo_shared_by_slot() {
        let mut acc = acc();
        acc.set_ammo(slot(1), 11, 150);
        assert_eq!(acc.ammo(slot(1), wid(17)), 150);
        assert_eq!(acc.ammo(slot(1), wid(21)), 150);
        assert_eq!(acc.ammo(slot(1), wid(GARAND)), 0);
    }

    #[test]
    fn test_objective_points_saturate() {
        let mut acc = acc();
        acc.set_current_weapon(slot(1), wid(COLT));
        acc.update_score(slot(1), i32::MAX);
        acc.update_score(slot(1), 7);
        assert_eq!(acc.query(slot(1), Scope::Life, StatFilter::All).unwrap().points, i32::MAX);
        acc.update_score(slot(1), i32::MIN);
        acc.update_score(slot(1), i32::MIN);
        assert_eq!(acc.query(slot(1), Scope::Session, StatFilter::All).unwrap().points, i32::MIN);
    }

    #[test]
    fn test_objective_score_goes_to_held_weapon() {
        let mut acc = acc();
        acc.set_current_weapon(slot(1), wid(COLT));
        acc.update_score(slot(1), 5);
        assert_eq!(acc.player(slot(1)).weapons_life[COLT as usize].points, 5);
        assert_eq!(acc.query(slot(1), Scope::Session, StatFilter::All).unwrap().points, 5);
    }
}
