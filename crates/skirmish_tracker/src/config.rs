//! # Tracker Configuration
//!
//! Loaded once at match start from TOML.
//!
//! ```toml
//! rank_capacity = 3500
//! reset_rank_on_teardown = false
//! rank_by = "name"          # or "unique"
//! rank_bots = true
//! paused = false
//! reset_delay_secs = 0.25
//! score_notify_delay_secs = 0.25
//! rocket_track_secs = 2.0
//! rank_file = "data/skirmish_rank.dat"
//! points_file = "data/skirmish_points.toml"
//! ```

use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How rank entries are keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankKey {
    /// Display name only, case-insensitive.
    #[default]
    Name,
    /// Display name plus the player's unique id.
    Unique,
}

/// Match-wide tracker settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum rank entries kept.
    pub rank_capacity: usize,
    /// Wipe the rank store at teardown before saving.
    pub reset_rank_on_teardown: bool,
    /// Rank entry keying.
    pub rank_by: RankKey,
    /// Flush bot stats into the rank store.
    pub rank_bots: bool,
    /// Suspend weapon, damage, and score accumulation.
    pub paused: bool,
    /// Delay before a scheduled life or round clear applies.
    pub reset_delay_secs: f32,
    /// Delay before a score change is announced.
    pub score_notify_delay_secs: f32,
    /// How long a rocket stays attributable to its owner.
    pub rocket_track_secs: f32,
    /// Rank file location.
    pub rank_file: PathBuf,
    /// Point table location.
    pub points_file: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rank_capacity: 3500,
            reset_rank_on_teardown: false,
            rank_by: RankKey::Name,
            rank_bots: true,
            paused: false,
            reset_delay_secs: 0.25,
            score_notify_delay_secs: 0.25,
            rocket_track_secs: 2.0,
            rank_file: PathBuf::from("data/skirmish_rank.dat"),
            points_file: PathBuf::from("data/skirmish_points.toml"),
        }
    }
}

impl TrackerConfig {
    /// Parses a config from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the text does not parse.
    pub fn from_toml_str(text: &str) -> TrackerResult<Self> {
        toml::from_str(text).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> TrackerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
