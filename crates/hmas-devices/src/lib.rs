//! # HMAS Devices
//!
//! Concrete device kinds for the simulator, registered as handler tables:
//! - `homebench`: the smart-home kinds (lights, heating, blinds, ...)
//! - `blocksworld`: the blocks/hand state machine with goal checks
//!
//! `loader` reads the on-disk datasets (Turtle + JSON snapshots) into a
//! [`hmas_core::Simulator`].

pub mod blocksworld;
pub mod homebench;
pub mod loader;

pub use blocksworld::{blocksworld_kind, blocksworld_kinds, goal_reached, BLOCKSWORLD_KIND, BLOCKSWORLD_ROOT};
pub use homebench::homebench_kinds;
pub use loader::{load_blocksworld, load_homes};
