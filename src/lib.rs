//! Asteroid combat and salvage loop
//!
//! Destructible asteroids, a loot economy fed by their destruction, a field
//! manager that keeps the field populated, three weapon behaviours and the
//! collision routing that ties them together.  Rendering, input and audio
//! are left to the host app; it talks to the loop through Bevy messages.

pub mod asteroid;
pub mod catalog;
pub mod collector;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod loot;
pub mod simulation;
pub mod weapon;

#[cfg(test)]
mod test_support;
