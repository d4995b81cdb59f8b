//! # Entity Handles and Player Slots
//!
//! Entities are opaque engine handles consisting of:
//! - An index into the engine's edict table
//! - A generation counter so a freed and reused slot is never mistaken
//!   for the entity that used to live there
//!
//! Players additionally occupy a 1-based slot in `1..=MAX_PLAYERS`.

/// Maximum number of player slots tracked per match.
pub const MAX_PLAYERS: usize = 32;

/// Opaque handle for an engine entity.
///
/// The handle is split into two parts:
/// - Lower 32 bits: Index into the engine's entity table
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Creates a handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the same index with the generation bumped by one.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self::new(self.index(), self.generation().wrapping_add(1))
    }

    /// Null/invalid handle.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this handle is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// A player's 1-based slot number.
///
/// Construction is the bounds check: a `PlayerSlot` always indexes
/// safely into per-player arrays through [`PlayerSlot::index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    /// Creates a slot from a raw engine index, rejecting 0 and anything
    /// above [`MAX_PLAYERS`].
    #[inline]
    #[must_use]
    pub fn new(raw: i32) -> Option<Self> {
        if (1..=MAX_PLAYERS as i32).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Returns the 1-based slot number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the 0-based array index for this slot.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Iterates every possible slot in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MAX_PLAYERS as u8).map(Self)
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
