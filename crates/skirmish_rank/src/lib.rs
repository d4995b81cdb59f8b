//! # SKIRMISH Rank
//!
//! The persisted, ordered leaderboard.
//!
//! ## Design Principles
//!
//! 1. **Stable ordering** - Equal scores never swap places
//! 2. **All-or-nothing loads** - A corrupt file yields an empty store
//! 3. **External weights** - Point values come from a TOML table
//! 4. **Off-thread saves** - `RankSaver` writes snapshots in the background
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_rank::{PointTable, RankStore};
//! use std::sync::Arc;
//!
//! let points = Arc::new(PointTable::load_or_default("data/skirmish_points.toml"));
//! let mut rank = RankStore::new(3500, points);
//! let id = rank.find_or_create("Sarge", None);
//! rank.update_position(id, &life_stats);
//! rank.save("data/skirmish_rank.dat")?;
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod format;
pub mod points;
pub mod saver;
pub mod store;

pub use error::{RankError, RankResult};
pub use points::{PointTable, WeaponPoints};
pub use saver::{RankSaver, SaverStats};
pub use store::{RankEntry, RankId, RankStore};
