//! # SKIRMISH Core
//!
//! Shared vocabulary for the combat statistics engine.
//!
//! ## Design Principles
//!
//! 1. **Bounded everything** - Player slots and weapon ids are validated newtypes
//! 2. **Fixed-size stat blocks** - `WeaponStatEntry` is plain old data
//! 3. **Stale handle detection** - Entity handles carry a generation counter
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_core::{weapon, PlayerSlot, WeaponId, WeaponStatEntry};
//!
//! let slot = PlayerSlot::new(3).unwrap();
//! let mg42 = WeaponId::new(17).unwrap();
//! assert_eq!(weapon::info(mg42).clip_step, 2);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod entity;
pub mod stats;
pub mod weapon;

pub use entity::{EntityHandle, PlayerSlot, MAX_PLAYERS};
pub use stats::{BodyRegion, WeaponStatEntry, BODY_REGIONS};
pub use weapon::{WeaponId, WeaponInfo, MAX_WEAPONS};
