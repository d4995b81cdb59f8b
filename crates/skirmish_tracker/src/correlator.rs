//! # Event Correlator
//!
//! Turns decoded weapon records, damage signals, and traces into
//! attributed stats.
//!
//! ## Damage Attribution
//!
//! ```text
//! inflictor ──► live player?  ──yes──► (player, held weapon, last region)
//!                   │no
//!                   ▼
//!             tracked projectile? ──yes──► (owner, projectile weapon, none)
//!                   │no
//!                   ▼
//!             (victim, none, none)
//! ```

use crate::accumulator::StatAccumulator;
use crate::events::StatsEvent;
use crate::projectile::ProjectileTracker;
use crate::world::GameWorld;
use skirmish_core::weapon::{self, BAZOOKA, HAND_GRENADE, MILLS_BOMB, PIAT, PSCHRECK, STICK_GRENADE};
use skirmish_core::{BodyRegion, EntityHandle, PlayerSlot, WeaponId};

/// Seconds a thrown grenade stays attributable.
pub const GRENADE_TRACK_SECS: f32 = 2.0;

/// A completed CurWeapon record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponSwitchRecord {
    /// Switch flag was nonzero.
    pub active: bool,
    /// Raw weapon id.
    pub weapon: i32,
    /// Clip count, negative when the weapon has none.
    pub clip: i32,
}

/// An attributed damage signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageResolution {
    /// Resolved attacker, the victim itself when unresolved.
    pub attacker: PlayerSlot,
    /// Who took the damage.
    pub victim: PlayerSlot,
    /// Weapon used.
    pub weapon: WeaponId,
    /// Raw amount.
    pub amount: i32,
    /// Hit location.
    pub region: Option<BodyRegion>,
    /// Attacker and victim share a team.
    pub teamkill: bool,
    /// Victim died.
    pub killed: bool,
}

impl DamageResolution {
    /// The damage notification.
    #[must_use]
    pub fn damage_event(&self) -> StatsEvent {
        StatsEvent::Damage {
            attacker: self.attacker,
            victim: self.victim,
            amount: self.amount,
            weapon: self.weapon,
            region: self.region,
            teamkill: self.teamkill,
        }
    }

    /// The death notification, when the victim died.
    #[must_use]
    pub fn death_event(&self) -> Option<StatsEvent> {
        self.killed.then_some(StatsEvent::Death {
            killer: self.attacker,
            victim: self.victim,
            weapon: self.weapon,
            region: self.region,
            teamkill: self.teamkill,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TraceKind {
    Grenade,
    Rocket,
}

struct TraceEntry {
    classname: &'static str,
    weapon: WeaponId,
    kind: TraceKind,
}

static TRACES: [TraceEntry; 5] = [
    TraceEntry { classname: "grenade", weapon: HAND_GRENADE, kind: TraceKind::Grenade },
    TraceEntry { classname: "grenade2", weapon: STICK_GRENADE, kind: TraceKind::Grenade },
    TraceEntry { classname: "shell_bazooka", weapon: BAZOOKA, kind: TraceKind::Rocket },
    TraceEntry { classname: "shell_pschreck", weapon: PSCHRECK, kind: TraceKind::Rocket },
    TraceEntry { classname: "shell_piat", weapon: PIAT, kind: TraceKind::Rocket },
];

/// Attribution state for one match.
#[derive(Debug)]
pub struct EventCorrelator {
    projectiles: ProjectileTracker,
    british_allies: bool,
    rocket_track_secs: f32,
}

impl EventCorrelator {
    /// Creates a correlator with the given rocket window.
    #[must_use]
    pub fn new(rocket_track_secs: f32) -> Self {
        Self {
            projectiles: ProjectileTracker::new(),
            british_allies: false,
            rocket_track_secs,
        }
    }

    /// Tracked projectiles.
    #[must_use]
    pub fn projectiles(&self) -> &ProjectileTracker {
        &self.projectiles
    }

    /// Drops every tracked projectile.
    pub fn clear_projectiles(&mut self) {
        self.projectiles.clear();
    }

    /// Allied hand grenades count as Mills bombs on British maps.
    pub fn set_british_allies(&mut self, british: bool) {
        self.british_allies = british;
    }

    /// True on British maps.
    #[must_use]
    pub const fn british_allies(&self) -> bool {
        self.british_allies
    }

    /// Real variant of a placeholder weapon id.
    fn identity<W: GameWorld>(world: &W, player: PlayerSlot, id: WeaponId) -> WeaponId {
        if weapon::info(id).needs_identity_check {
            world.equipped_weapon(player).unwrap_or(id)
        } else {
            id
        }
    }

    /// Applies a CurWeapon record: shot detection by clip delta, then
    /// the switch notification.
    pub fn weapon_switch<W: GameWorld>(
        &self,
        world: &W,
        stats: &mut StatAccumulator,
        player: PlayerSlot,
        record: WeaponSwitchRecord,
    ) -> Option<StatsEvent> {
        if !record.active {
            return None;
        }
        let raw = WeaponId::new(record.weapon)?;
        let id = Self::identity(world, player, raw);
        let previous = stats.set_current_weapon(player, id);

        let stored = stats.swap_clip(player, id, record.clip);
        let step = weapon::info(id).clip_step;
        if record.clip >= 0
            && stored.is_some_and(|old| old >= 0 && old.checked_sub(record.clip) == Some(step))
        {
            stats.record_shot(player, id);
        }

        (id != previous && !id.is_none() && !previous.is_none()).then_some(StatsEvent::WeaponSwitch {
            player,
            old: previous,
            new: id,
        })
    }

    /// Reads the victim's pending damage and records it.
    ///
    /// Returns `None` for zero damage or an invalid inflictor.
    pub fn resolve_damage<W: GameWorld>(
        &mut self,
        world: &mut W,
        stats: &mut StatAccumulator,
        victim: PlayerSlot,
    ) -> Option<DamageResolution> {
        let report = world.take_damage(victim)?;
        if report.amount == 0 || !world.entity_valid(report.inflictor) {
            return None;
        }

        let (attacker, weapon, region) = if let Some(shooter) = world.player_of(report.inflictor) {
            let id = Self::identity(&*world, shooter, stats.player(shooter).current_weapon());
            if weapon::info(id).melee {
                stats.record_shot(shooter, id);
            }
            (shooter, id, stats.player(shooter).last_region())
        } else if let Some((owner, id)) = self.projectiles.find_owner(report.inflictor, world.now()) {
            (owner, id, None)
        } else {
            (victim, WeaponId::NONE, None)
        };

        let teamkill = attacker != victim
            && matches!((world.team(attacker), world.team(victim)), (Some(a), Some(v)) if a == v);

        if attacker != victim {
            stats.record_hit(attacker, victim, weapon, report.amount, region);
        }

        let killed = !world.is_alive(victim);
        if killed {
            stats.record_kill(attacker, victim, weapon, region == Some(BodyRegion::Head), teamkill);
        }

        Some(DamageResolution {
            attacker,
            victim,
            weapon,
            amount: report.amount,
            region,
            teamkill,
            killed,
        })
    }

    /// Records the body region a shooter's trace hit.
    pub fn aim_trace(&self, stats: &mut StatAccumulator, shooter: PlayerSlot, hit_group: i32) {
        stats.set_last_region(shooter, BodyRegion::from_raw(hit_group));
    }

    /// Classifies a projectile trace and starts tracking it.
    ///
    /// Unknown classnames are ignored.
    pub fn projectile_trace<W: GameWorld>(
        &mut self,
        world: &W,
        stats: &mut StatAccumulator,
        owner: PlayerSlot,
        projectile: EntityHandle,
        classname: &str,
        position: [f32; 3],
    ) -> Option<StatsEvent> {
        let trace = TRACES.iter().find(|t| t.classname == classname)?;
        let now = world.now();

        let event = match trace.kind {
            TraceKind::Grenade => {
                let id = if trace.weapon == HAND_GRENADE && self.british_allies {
                    MILLS_BOMB
                } else {
                    trace.weapon
                };
                stats.record_shot(owner, id);
                self.projectiles.put(projectile, now, GRENADE_TRACK_SECS, id, owner);
                StatsEvent::GrenadeExplosion {
                    player: owner,
                    projectile,
                    position,
                    weapon: id,
                }
            }
            TraceKind::Rocket => {
                stats.record_shot(owner, trace.weapon);
                self.projectiles
                    .put(projectile, now, self.rocket_track_secs, trace.weapon, owner);
                StatsEvent::RocketExplosion {
                    player: owner,
                    projectile,
                    position,
                    weapon: trace.weapon,
                }
            }
        };
        tracing::trace!("tracking {} from {} as {:?}", classname, owner, trace.kind);
        Some(event)
    }
}
