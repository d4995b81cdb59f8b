//! # Stat Blocks
//!
//! `WeaponStatEntry` is the counter block used everywhere: per weapon,
//! per opponent, per scope, and as the cumulative block of a rank entry.
//!
//! ## Memory Layout
//!
//! ```text
//! offset  0: kills, deaths, headshots, teamkills   (4 x i32)
//! offset 16: shots, hits, damage, points           (4 x i32)
//! offset 32: body_hits[0..8]                       (8 x i32)
//! total: 64 bytes, no padding
//! ```
//!
//! The block is `Pod`; the rank file writes each field little-endian.

use bytemuck::{Pod, Zeroable};

/// Number of body-region histogram buckets.
pub const BODY_REGIONS: usize = 8;

/// Hit location reported by the engine's trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BodyRegion {
    /// Unclassified hit.
    Generic = 0,
    /// Head.
    Head = 1,
    /// Chest.
    Chest = 2,
    /// Stomach.
    Stomach = 3,
    /// Left arm.
    LeftArm = 4,
    /// Right arm.
    RightArm = 5,
    /// Left leg.
    LeftLeg = 6,
    /// Right leg.
    RightLeg = 7,
}

impl BodyRegion {
    /// Converts a raw engine hit group.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Generic),
            1 => Some(Self::Head),
            2 => Some(Self::Chest),
            3 => Some(Self::Stomach),
            4 => Some(Self::LeftArm),
            5 => Some(Self::RightArm),
            6 => Some(Self::LeftLeg),
            7 => Some(Self::RightLeg),
            _ => None,
        }
    }

    /// Histogram bucket index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Combat counters for one weapon, opponent, or scope.
///
/// `hits <= shots` is not enforced: melee and explosive damage can land
/// without a tracked shot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WeaponStatEntry {
    /// Kills scored.
    pub kills: i32,
    /// Deaths suffered.
    pub deaths: i32,
    /// Kills that landed on the head.
    pub headshots: i32,
    /// Kills of teammates.
    pub teamkills: i32,
    /// Shots fired.
    pub shots: i32,
    /// Hits landed.
    pub hits: i32,
    /// Raw damage dealt, never clamped to remaining health.
    pub damage: i32,
    /// Points earned.
    pub points: i32,
    /// Hits per body region.
    pub body_hits: [i32; BODY_REGIONS],
}

impl WeaponStatEntry {
    /// An all-zero block.
    pub const ZERO: Self = Self {
        kills: 0,
        deaths: 0,
        headshots: 0,
        teamkills: 0,
        shots: 0,
        hits: 0,
        damage: 0,
        points: 0,
        body_hits: [0; BODY_REGIONS],
    };

    /// True when no shot was ever recorded. "Never used" sentinel.
    #[inline]
    #[must_use]
    pub const fn has_no_shots(&self) -> bool {
        self.shots == 0
    }

    /// True when every counter is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        self.kills = self.kills.saturating_add(other.kills);
        self.deaths = self.deaths.saturating_add(other.deaths);
        self.headshots = self.headshots.saturating_add(other.headshots);
        self.teamkills = self.teamkills.saturating_add(other.teamkills);
        self.shots = self.shots.saturating_add(other.shots);
        self.hits = self.hits.saturating_add(other.hits);
        self.damage = self.damage.saturating_add(other.damage);
        self.points = self.points.saturating_add(other.points);
        for (mine, theirs) in self.body_hits.iter_mut().zip(other.body_hits.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }

    /// Records one hit with its damage and optional region.
    pub fn add_hit(&mut self, damage: i32, region: Option<BodyRegion>) {
        self.hits = self.hits.saturating_add(1);
        self.damage = self.damage.saturating_add(damage);
        if let Some(region) = region {
            let bucket = &mut self.body_hits[region.index()];
            *bucket = bucket.saturating_add(1);
        }
    }

    /// Records one kill.
    pub fn add_kill(&mut self, headshot: bool, teamkill: bool) {
        self.kills = self.kills.saturating_add(1);
        if headshot {
            self.headshots = self.headshots.saturating_add(1);
        }
        if teamkill {
            self.teamkills = self.teamkills.saturating_add(1);
        }
    }

    /// Resets every counter.
    pub fn clear(&mut self) {
        *self = Self::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_64_bytes() {
        assert_eq!(std::mem::size_of::<WeaponStatEntry>(), 64);
        let block = WeaponStatEntry { kills: 1, ..WeaponStatEntry::ZERO };
        let bytes = bytemuck::bytes_of(&block);
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
    }

    #[test]
    fn test_merge_adds_histogram() {
        let mut a = WeaponStatEntry::ZERO;
        a.add_hit(40, Some(BodyRegion::Head));
        let mut b = WeaponStatEntry::ZERO;
        b.add_hit(25, Some(BodyRegion::Head));
        b.add_hit(10, None);
        b.add_kill(true, false);

        a.merge(&b);
        assert_eq!(a.hits, 3);
        assert_eq!(a.damage, 75);
        assert_eq!(a.body_hits[BodyRegion::Head.index()], 2);
        assert_eq!(a.kills, 1);
        assert_eq!(a.headshots, 1);
        assert_eq!(a.teamkills, 0);
    }

    #[test]
    fn test_hits_without_shots_allowed() {
        let mut entry = WeaponStatEntry::ZERO;
        entry.add_hit(100, Some(BodyRegion::Chest));
        assert!(entry.has_no_shots());
        assert!(!entry.is_zero());
    }

    #[test]
    fn test_counters_saturate_at_max() {
        let mut entry = WeaponStatEntry {
            kills: i32::MAX,
            headshots: i32::MAX,
            teamkills: i32::MAX,
            hits: i32::MAX,
            ..WeaponStatEntry::ZERO
        };
        entry.body_hits[BodyRegion::Head.index()] = i32::MAX;
        entry.add_hit(10, Some(BodyRegion::Head));
        entry.add_kill(true, true);
        assert_eq!(entry.hits, i32::MAX);
        assert_eq!(entry.body_hits[BodyRegion::Head.index()], i32::MAX);
        assert_eq!((entry.kills, entry.headshots, entry.teamkills), (i32::MAX, i32::MAX, i32::MAX));
        assert_eq!(entry.damage, 10);
    }

    #[test]
    fn test_region_from_raw() {
        assert_eq!(BodyRegion::from_raw(1), Some(BodyRegion::Head));
        assert_eq!(BodyRegion::from_raw(7), Some(BodyRegion::RightLeg));
        assert_eq!(BodyRegion::from_raw(8), None);
        assert_eq!(BodyRegion::from_raw(-1), None);
    }
}
