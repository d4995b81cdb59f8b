//! # Stats Notifications
//!
//! Structured events emitted to the driving collaborator.
//!
//! ## Event Flow for a Kill:
//! ```text
//! 1. Engine: Health message begins for the victim
//! 2. Decoder: end-handler fires damage resolution
//! 3. Correlator: attacker + weapon + region resolved
//! 4. Accumulator: hit and kill recorded
//! 5. Channel: StatsEvent::Damage, then StatsEvent::Death
//! ```

use skirmish_core::{BodyRegion, EntityHandle, PlayerSlot, WeaponId};

/// Team index used by the engine for the allied side.
pub const TEAM_ALLIES: i32 = 1;
/// Team index used by the engine for the axis side.
pub const TEAM_AXIS: i32 = 2;

// ============================================================================
// EVENTS
// ============================================================================

/// Notifications produced while decoding a match.
#[derive(Clone, Debug, PartialEq)]
pub enum StatsEvent {
    /// A player changed weapons.
    WeaponSwitch {
        /// Who switched.
        player: PlayerSlot,
        /// Weapon before.
        old: WeaponId,
        /// Weapon after.
        new: WeaponId,
    },

    /// A damage signal was attributed.
    Damage {
        /// Resolved attacker (the victim for self/world damage).
        attacker: PlayerSlot,
        /// Who took it.
        victim: PlayerSlot,
        /// Raw amount.
        amount: i32,
        /// Weapon used.
        weapon: WeaponId,
        /// Hit location, if known.
        region: Option<BodyRegion>,
        /// Attacker and victim share a team.
        teamkill: bool,
    },

    /// A damage signal killed its victim.
    Death {
        /// Resolved killer.
        killer: PlayerSlot,
        /// Who died.
        victim: PlayerSlot,
        /// Weapon used.
        weapon: WeaponId,
        /// Hit location, if known.
        region: Option<BodyRegion>,
        /// Killer and victim share a team.
        teamkill: bool,
    },

    /// A player's objective score changed.
    Score {
        /// Who scored.
        player: PlayerSlot,
        /// Change since the previous score message.
        delta: i32,
        /// Score now.
        total: i32,
    },

    /// A team's score changed.
    TeamScore {
        /// Team index.
        team: i32,
        /// Score now.
        score: i32,
    },

    /// A player spawned.
    Spawn {
        /// Who spawned.
        player: PlayerSlot,
    },

    /// A player raised or lowered a scope.
    Scope {
        /// Who.
        player: PlayerSlot,
        /// Scoped in.
        scoped: bool,
        /// Field of view reported.
        fov: i32,
    },

    /// A player picked up or dropped an objective.
    ObjectPickup {
        /// Who.
        player: PlayerSlot,
        /// The object.
        object: EntityHandle,
        /// Object position.
        position: [f32; 3],
        /// True on pickup, false on drop.
        carrying: bool,
    },

    /// A tracked grenade went off.
    GrenadeExplosion {
        /// Thrower.
        player: PlayerSlot,
        /// Grenade entity.
        projectile: EntityHandle,
        /// Blast position.
        position: [f32; 3],
        /// Grenade weapon id.
        weapon: WeaponId,
    },

    /// A tracked rocket went off.
    RocketExplosion {
        /// Shooter.
        player: PlayerSlot,
        /// Rocket entity.
        projectile: EntityHandle,
        /// Blast position.
        position: [f32; 3],
        /// Launcher weapon id.
        weapon: WeaponId,
    },

    /// Consumers should persist this player's stats now.
    StatsFlush {
        /// Whose stats.
        player: PlayerSlot,
    },
}

// ============================================================================
// CHANNEL
// ============================================================================

/// Channel for delivering events, possibly to another thread.
pub struct EventChannel<T> {
    sender: crossbeam_channel::Sender<T>,
    receiver: crossbeam_channel::Receiver<T>,
}

impl<T> EventChannel<T> {
    /// Creates a new unbounded event channel.
    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Sends an event. Never blocks; the channel owns a receiver so the
    /// send cannot fail.
    pub fn send(&self, event: T) {
        let _ = self.sender.send(event);
    }

    /// Tries to receive an event (non-blocking).
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Takes every queued event.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when no event is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Gets a clone of the receiver for another thread.
    #[must_use]
    pub fn receiver(&self) -> crossbeam_channel::Receiver<T> {
        self.receiver.clone()
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}
