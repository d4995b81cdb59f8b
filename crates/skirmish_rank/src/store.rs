//! # Rank Store
//!
//! Descending-by-score leaderboard with stable reinsertion.
//!
//! ## Design
//!
//! ```text
//! entries: [ #1 score 40 ][ #2 score 25 ][ #3 score 25 ][ #4 score 0 ]
//!                                ▲
//!            update_position ────┘  merge delta, rescore, then bubble
//!                                   up past strictly lower scores or
//!                                   down past strictly higher ones
//! ```
//!
//! Entries keep a stable [`RankId`] across moves, so callers never hold
//! indices. Equal scores never swap, which keeps tie order stable.
//!
//! ## Capacity
//!
//! After every update the lowest entries are dropped until the store
//! fits its capacity. Creation drops overflow first, so at most one
//! fresh entry sits above capacity until it is first updated.

use crate::error::{RankError, RankResult};
use crate::format::{self, RankRecord};
use crate::points::PointTable;
use skirmish_core::WeaponStatEntry;
use std::path::Path;
use std::sync::Arc;

/// Stable identifier of a rank entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RankId(u32);

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankEntry {
    id: RankId,
    name: String,
    unique: String,
    stats: WeaponStatEntry,
    score: i32,
}

impl RankEntry {
    /// Stable id of this entry.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> RankId {
        self.id
    }

    /// Display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-sensitive disambiguator, empty when not used.
    #[inline]
    #[must_use]
    pub fn unique(&self) -> &str {
        &self.unique
    }

    /// Cumulative counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &WeaponStatEntry {
        &self.stats
    }

    /// Derived rank score.
    #[inline]
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    fn matches(&self, name: &str, unique: Option<&str>) -> bool {
        self.name.eq_ignore_ascii_case(name) && unique.map_or(true, |u| self.unique == u)
    }
}

/// The leaderboard.
#[derive(Debug)]
pub struct RankStore {
    entries: Vec<RankEntry>,
    capacity: usize,
    points: Arc<PointTable>,
    next_id: u32,
}

impl RankStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(capacity: usize, points: Arc<PointTable>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            points,
            next_id: 0,
        }
    }

    /// Maximum number of entries kept after an update.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the store has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The point calculator used for scoring.
    #[must_use]
    pub fn points(&self) -> &Arc<PointTable> {
        &self.points
    }

    /// Entries in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &RankEntry> {
        self.entries.iter()
    }

    /// Finds an entry by its key.
    #[must_use]
    pub fn find(&self, name: &str, unique: Option<&str>) -> Option<RankId> {
        self.entries.iter().find(|e| e.matches(name, unique)).map(|e| e.id)
    }

    /// Finds an entry by its key, appending a zero entry when absent.
    ///
    /// Overflow left by earlier creations is evicted before the append,
    /// so a full store briefly holds `capacity + 1` entries. The fresh
    /// entry is last with a zero score; evicting after the push would
    /// always drop it. Its first [`Self::update_position`] settles it and
    /// trims the store back to capacity.
    pub fn find_or_create(&mut self, name: &str, unique: Option<&str>) -> RankId {
        if let Some(id) = self.find(name, unique) {
            return id;
        }

        self.evict_overflow();
        let id = self.allocate_id();
        let stats = WeaponStatEntry::ZERO;
        self.entries.push(RankEntry {
            id,
            name: name.to_owned(),
            unique: unique.unwrap_or_default().to_owned(),
            score: self.points.score(&stats),
            stats,
        });
        id
    }

    /// Returns an entry by id.
    #[must_use]
    pub fn get(&self, id: RankId) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Renames an entry in place.
    pub fn set_name(&mut self, id: RankId, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.name = name.to_owned();
                true
            }
            None => false,
        }
    }

    /// Merges `delta` into an entry, rescores it, and restores order.
    ///
    /// Returns the entry's new 1-based position, or `None` if the id is
    /// unknown or the entry was evicted as the lowest over capacity.
    pub fn update_position(&mut self, id: RankId, delta: &WeaponStatEntry) -> Option<usize> {
        let mut i = self.index_of(id)?;

        let entry = &mut self.entries[i];
        entry.stats.merge(delta);
        entry.score = self.points.score(&entry.stats);
        let score = entry.score;

        while i > 0 && self.entries[i - 1].score < score {
            self.entries.swap(i - 1, i);
            i -= 1;
        }
        while i + 1 < self.entries.len() && self.entries[i + 1].score > score {
            self.entries.swap(i, i + 1);
            i += 1;
        }

        self.evict_overflow();
        (i < self.entries.len()).then_some(i + 1)
    }

    /// 1-based position of an entry.
    #[must_use]
    pub fn position_of(&self, id: RankId) -> Option<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    /// Entry at a 1-based position.
    #[must_use]
    pub fn entry_at(&self, position: usize) -> Option<&RankEntry> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Snapshots the store into a rank file image.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let records: Vec<RankRecord> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| RankRecord {
                name: format::encode_name(&e.name),
                unique: format::encode_name(&e.unique),
                stats: e.stats,
                position: (i + 1) as u32,
            })
            .collect();
        format::encode(&records)
    }

    /// Writes the store to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> RankResult<()> {
        let path = path.as_ref();
        format::write_atomic(path, &self.encode())?;
        tracing::info!("rank saved: {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Replaces the store's contents with the file at `path`.
    ///
    /// # Errors
    ///
    /// Any error leaves the store empty.
    pub fn load(&mut self, path: impl AsRef<Path>) -> RankResult<usize> {
        let path = path.as_ref();
        self.entries.clear();
        let bytes = std::fs::read(path).map_err(|e| RankError::from_io(path, &e))?;
        let count = self.load_bytes(&bytes)?;
        tracing::info!("rank loaded: {} entries from {}", count, path.display());
        Ok(count)
    }

    /// Replaces the store's contents with a rank file image.
    ///
    /// # Errors
    ///
    /// Any error leaves the store empty.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> RankResult<usize> {
        self.entries.clear();
        let mut records = format::decode(bytes)?;
        records.sort_by_key(|r| r.position);

        self.entries.reserve(records.len());
        for record in records {
            let id = self.allocate_id();
            self.entries.push(RankEntry {
                id,
                name: format::decode_name(&record.name),
                unique: format::decode_name(&record.unique),
                score: self.points.score(&record.stats),
                stats: record.stats,
            });
        }
        // Stable: a file saved with the same weights comes back in file order.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.evict_overflow();
        Ok(self.entries.len())
    }

    fn index_of(&self, id: RankId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn allocate_id(&mut self) -> RankId {
        let id = RankId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop() {
                tracing::debug!("rank evicted '{}' (score {})", evicted.name, evicted.score);
            }
        }
    }
}
