//! # SKIRMISH Tracker
//!
//! Live combat statistics for one match.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────── MatchSession ────────────────────────────┐
//! │                                                                      │
//! │  MessageDecoder ──► EventCorrelator ──► StatAccumulator ──► RankStore │
//! │                          │                                           │
//! │                  ProjectileTracker            EventChannel<StatsEvent>│
//! └──────────────────────────────────────────────────────────────────────┘
//!                 ▲
//!          GameWorld trait (host engine)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_tracker::{MatchSession, MockWorld, TrackerConfig};
//!
//! let config = TrackerConfig::load("config/tracker.toml")?;
//! let points = Arc::new(PointTable::load_or_default(&config.points_file));
//! let mut session = MatchSession::new(config, MockWorld::new(), points);
//! session.register_message("CurWeapon", 66)?;
//! session.finish_registration();
//! session.load_rank();
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod accumulator;
pub mod config;
pub mod correlator;
pub mod error;
pub mod events;
pub mod message;
pub mod projectile;
pub mod session;
pub mod world;

pub use accumulator::{DueResets, PendingClear, PlayerStatBlock, Scope, StatAccumulator, StatFilter, VersusEntry};
pub use config::{RankKey, TrackerConfig};
pub use correlator::{DamageResolution, EventCorrelator, WeaponSwitchRecord};
pub use error::{TrackerError, TrackerResult};
pub use events::{EventChannel, StatsEvent, TEAM_ALLIES, TEAM_AXIS};
pub use message::{FieldValue, MessageDecoder, MessageKind, MessageRegistry};
pub use projectile::{ProjectileRecord, ProjectileTracker};
pub use session::MatchSession;
pub use world::{DamageReport, GameWorld, MockPlayer, MockWorld};
