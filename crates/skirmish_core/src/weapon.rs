//! # Weapon Table
//!
//! Static per-weapon facts the correlator needs to turn raw engine
//! signals into stats.
//!
//! ## Design
//!
//! ```text
//! id ─► WeaponInfo { name, melee, needs_identity_check, clip_step, ammo_slot }
//! ```
//!
//! - `melee` weapons have no clip signal; their shot is counted when damage lands.
//! - `needs_identity_check` ids are placeholders. The player's real
//!   equipped variant (rifle vs. its bayonet or butt stroke) is resolved
//!   through the world at the time of use.
//! - `clip_step` is the clip decrease that means exactly one trigger pull.

/// Number of weapon ids, including id 0 ("no weapon").
pub const MAX_WEAPONS: usize = 42;

/// A validated weapon id in `0..MAX_WEAPONS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct WeaponId(u8);

impl WeaponId {
    /// The "no weapon" id used for self and environment damage.
    pub const NONE: Self = Self(0);

    /// Creates an id, rejecting anything outside the table.
    #[inline]
    #[must_use]
    pub fn new(raw: i32) -> Option<Self> {
        if (0..MAX_WEAPONS as i32).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the array index for this id.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for id 0.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Iterates every id in the table.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..MAX_WEAPONS as u8).map(Self)
    }
}

/// Static facts about one weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeaponInfo {
    /// Short weapon name, also used as the point table key.
    pub name: &'static str,
    /// Melee weapons count a shot when their damage lands.
    pub melee: bool,
    /// Placeholder id resolved through the player's equipped variant.
    pub needs_identity_check: bool,
    /// Clip decrease that corresponds to one shot.
    pub clip_step: i32,
    /// Reserve ammo slot shared with other weapons, if any.
    pub ammo_slot: Option<u8>,
}

impl WeaponInfo {
    const fn gun(name: &'static str, ammo_slot: u8) -> Self {
        Self {
            name,
            melee: false,
            needs_identity_check: false,
            clip_step: 1,
            ammo_slot: Some(ammo_slot),
        }
    }

    const fn rifle(name: &'static str, ammo_slot: u8) -> Self {
        Self {
            needs_identity_check: true,
            ..Self::gun(name, ammo_slot)
        }
    }

    const fn melee(name: &'static str) -> Self {
        Self {
            name,
            melee: true,
            needs_identity_check: false,
            clip_step: 1,
            ammo_slot: None,
        }
    }

    const fn thrown(name: &'static str, ammo_slot: u8) -> Self {
        Self::gun(name, ammo_slot)
    }
}

static WEAPONS: [WeaponInfo; MAX_WEAPONS] = [
    WeaponInfo { name: "none", melee: false, needs_identity_check: false, clip_step: 1, ammo_slot: None },
    WeaponInfo::melee("amerknife"),
    WeaponInfo::melee("gerknife"),
    WeaponInfo::gun("colt", 1),
    WeaponInfo::gun("luger", 2),
    WeaponInfo::rifle("garand", 3),
    WeaponInfo::gun("scopedkar", 4),
    WeaponInfo::gun("thompson", 5),
    WeaponInfo::gun("mp44", 6),
    WeaponInfo::gun("spring", 3),
    WeaponInfo::rifle("kar", 4),
    WeaponInfo::gun("bar", 7),
    WeaponInfo::gun("mp40", 8),
    WeaponInfo::thrown("handgrenade", 9),
    WeaponInfo::thrown("stickgrenade", 10),
    WeaponInfo::thrown("stickgrenade_ex", 10),
    WeaponInfo::thrown("handgrenade_ex", 9),
    WeaponInfo { name: "mg42", melee: false, needs_identity_check: false, clip_step: 2, ammo_slot: Some(11) },
    WeaponInfo::gun("30cal", 12),
    WeaponInfo::melee("spade"),
    WeaponInfo::gun("m1carbine", 13),
    WeaponInfo::gun("mg34", 11),
    WeaponInfo::gun("greasegun", 5),
    WeaponInfo::gun("fg42", 14),
    WeaponInfo::rifle("k43", 15),
    WeaponInfo::rifle("enfield", 16),
    WeaponInfo::gun("sten", 17),
    WeaponInfo::gun("bren", 18),
    WeaponInfo::gun("webley", 19),
    WeaponInfo::gun("bazooka", 20),
    WeaponInfo::gun("pschreck", 20),
    WeaponInfo::gun("piat", 20),
    WeaponInfo::gun("scoped_fg42", 14),
    WeaponInfo::gun("fcarbine", 13),
    WeaponInfo::melee("bayonet"),
    WeaponInfo::gun("scoped_enfield", 16),
    WeaponInfo::thrown("mills_bomb", 9),
    WeaponInfo::melee("brit_knife"),
    WeaponInfo::melee("garandbutt"),
    WeaponInfo::melee("enf_bayonet"),
    WeaponInfo::gun("mortar", 21),
    WeaponInfo::melee("k43butt"),
];

/// Hand grenade.
pub const HAND_GRENADE: WeaponId = WeaponId(13);
/// Stick grenade.
pub const STICK_GRENADE: WeaponId = WeaponId(14);
/// MG42, the two-rounds-per-shot clip family.
pub const MG42: WeaponId = WeaponId(17);
/// Bazooka rocket.
pub const BAZOOKA: WeaponId = WeaponId(29);
/// Panzerschreck rocket.
pub const PSCHRECK: WeaponId = WeaponId(30);
/// PIAT rocket.
pub const PIAT: WeaponId = WeaponId(31);
/// British hand grenade, replaces [`HAND_GRENADE`] for British allies.
pub const MILLS_BOMB: WeaponId = WeaponId(36);

/// Returns the static facts for a weapon.
#[inline]
#[must_use]
pub fn info(id: WeaponId) -> &'static WeaponInfo {
    &WEAPONS[id.index()]
}

/// Looks up a weapon by its table name.
#[must_use]
pub fn by_name(name: &str) -> Option<WeaponId> {
    WEAPONS
        .iter()
        .position(|w| w.name == name)
        .and_then(|i| WeaponId::new(i as i32))
}

/// Iterates every weapon drawing reserve ammo from `slot`.
pub fn sharing_ammo_slot(slot: u8) -> impl Iterator<Item = WeaponId> {
    WeaponId::all().filter(move |id| info(*id).ammo_slot == Some(slot))
}
