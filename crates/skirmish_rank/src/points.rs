//! # Point Table
//!
//! Per-weapon point weights, loaded once at startup from TOML.
//!
//! ## Format
//!
//! ```toml
//! death = 0
//! headshot = 1
//!
//! [default]
//! kill = 2
//! hit = 0
//! teamkill = -2
//!
//! [weapons.mg42]
//! kill = 1
//! ```
//!
//! A weapon section overrides only the fields it names; the rest come
//! from `[default]`. A missing or unreadable file degrades to all-zero
//! weights.

use crate::error::{RankError, RankResult};
use serde::{Deserialize, Serialize};
use skirmish_core::{weapon, WeaponId, WeaponStatEntry, MAX_WEAPONS};
use std::collections::BTreeMap;
use std::path::Path;

/// Points awarded per event for one weapon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponPoints {
    /// Points per kill of an enemy.
    pub kill: i32,
    /// Points per hit.
    pub hit: i32,
    /// Points per kill of a teammate.
    pub teamkill: i32,
}

/// Weapon override where every field is optional.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct WeaponOverride {
    kill: Option<i32>,
    hit: Option<i32>,
    teamkill: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PointTableFile {
    death: i32,
    headshot: i32,
    default: WeaponPoints,
    weapons: BTreeMap<String, WeaponOverride>,
}

/// Resolved point weights, indexed by weapon id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointTable {
    death: i32,
    headshot: i32,
    per_weapon: [WeaponPoints; MAX_WEAPONS],
}

impl Default for PointTable {
    fn default() -> Self {
        Self::uniform(WeaponPoints::default())
    }
}

impl PointTable {
    /// Creates a table giving every weapon the same weights.
    #[must_use]
    pub fn uniform(points: WeaponPoints) -> Self {
        Self {
            death: 0,
            headshot: 0,
            per_weapon: [points; MAX_WEAPONS],
        }
    }

    /// Sets the per-death and per-headshot score weights.
    #[must_use]
    pub fn with_bonuses(mut self, death: i32, headshot: i32) -> Self {
        self.death = death;
        self.headshot = headshot;
        self
    }

    /// Overrides the weights of one weapon.
    pub fn set(&mut self, id: WeaponId, points: WeaponPoints) {
        self.per_weapon[id.index()] = points;
    }

    /// Parses a table from TOML text.
    ///
    /// Unknown weapon names are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the text is not a valid point table.
    pub fn from_toml_str(text: &str) -> RankResult<Self> {
        let file: PointTableFile =
            toml::from_str(text).map_err(|e| RankError::InvalidConfig(e.to_string()))?;

        let mut table = Self::uniform(file.default).with_bonuses(file.death, file.headshot);
        for (name, over) in &file.weapons {
            let Some(id) = weapon::by_name(name) else {
                tracing::warn!("point table: unknown weapon '{}' skipped", name);
                continue;
            };
            let base = file.default;
            table.set(
                id,
                WeaponPoints {
                    kill: over.kill.unwrap_or(base.kill),
                    hit: over.hit.unwrap_or(base.hit),
                    teamkill: over.teamkill.unwrap_or(base.teamkill),
                },
            );
        }
        Ok(table)
    }

    /// Loads a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Io` when the file cannot be read and
    /// `InvalidConfig` when it does not parse.
    pub fn load(path: impl AsRef<Path>) -> RankResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RankError::from_io(path, &e))?;
        Self::from_toml_str(&text)
    }

    /// Loads a table, falling back to all-zero weights on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(table) => {
                tracing::info!("point table loaded from {}", path.display());
                table
            }
            Err(e) => {
                tracing::warn!("point table unavailable ({}), using zero weights", e);
                Self::default()
            }
        }
    }

    /// Returns the weights for one weapon.
    #[inline]
    #[must_use]
    pub fn weapon(&self, id: WeaponId) -> WeaponPoints {
        self.per_weapon[id.index()]
    }

    /// Points for a kill with `id`.
    #[inline]
    #[must_use]
    pub fn kill_points(&self, id: WeaponId, teamkill: bool) -> i32 {
        let w = self.weapon(id);
        if teamkill {
            w.teamkill
        } else {
            w.kill
        }
    }

    /// Points for a hit with `id`.
    #[inline]
    #[must_use]
    pub fn hit_points(&self, id: WeaponId) -> i32 {
        self.weapon(id).hit
    }

    /// Derives the rank score of a cumulative block.
    #[must_use]
    pub fn score(&self, stats: &WeaponStatEntry) -> i32 {
        stats
            .points
            .saturating_add(self.death.saturating_mul(stats.deaths))
            .saturating_add(self.headshot.saturating_mul(stats.headshots))
    }
}
