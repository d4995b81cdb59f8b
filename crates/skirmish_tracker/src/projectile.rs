//! # Projectile Tracker
//!
//! Attributes delayed explosive damage back to the thrower.
//!
//! ## Memory Layout
//!
//! ```text
//! slots: [ rec ][ --- ][ rec ][ rec ][ --- ]
//!                  ▲                    ▲
//! free:  [ 1, 4 ] ─┴────────────────────┘
//! ```
//!
//! Records live in a slot vector; removed slots go on a free list and
//! are reused by the next `put`. Every record carries an insertion
//! sequence number so lookups prefer the newest match regardless of
//! which slot it landed in.

use skirmish_core::{EntityHandle, PlayerSlot, WeaponId};

/// One tracked projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileRecord {
    /// Projectile entity.
    pub handle: EntityHandle,
    /// Absolute time after which the record is dead.
    pub expires_at: f32,
    /// Weapon the projectile belongs to.
    pub category: WeaponId,
    /// Thrower.
    pub owner: PlayerSlot,
    /// Insertion order.
    pub sequence: u64,
}

/// Time-windowed projectile ownership.
#[derive(Clone, Debug, Default)]
pub struct ProjectileTracker {
    slots: Vec<Option<ProjectileRecord>>,
    free: Vec<usize>,
    next_sequence: u64,
    live: usize,
}

impl ProjectileTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included until swept.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when nothing is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Tracks `handle` until `now + delay`.
    pub fn put(
        &mut self,
        handle: EntityHandle,
        now: f32,
        delay: f32,
        category: WeaponId,
        owner: PlayerSlot,
    ) {
        let record = ProjectileRecord {
            handle,
            expires_at: now + delay,
            category,
            owner,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.live += 1;

        match self.free.pop() {
            Some(index) => self.slots[index] = Some(record),
            None => self.slots.push(Some(record)),
        }
    }

    /// Finds the newest live record for `handle`.
    ///
    /// Every record whose expiry is at or before `now` is removed during
    /// the scan, matching or not.
    pub fn find_owner(&mut self, handle: EntityHandle, now: f32) -> Option<(PlayerSlot, WeaponId)> {
        let mut best: Option<ProjectileRecord> = None;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(record) = *slot else { continue };
            if record.expires_at <= now {
                *slot = None;
                self.free.push(index);
                self.live -= 1;
                continue;
            }
            if record.handle == handle && best.map_or(true, |b| record.sequence > b.sequence) {
                best = Some(record);
            }
        }

        best.map(|r| (r.owner, r.category))
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}
