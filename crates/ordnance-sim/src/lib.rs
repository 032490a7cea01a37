//! Combat simulation for ORDNANCE.
//!
//! Owns the hecs world of projectiles and blasts, the weapon state machines
//! and the timer queue, and steps them at a fixed tick against a host world
//! reached through the `host` traits.

pub mod aim;
pub mod arena;
pub mod blast;
pub mod drag;
pub mod engine;
pub mod geometry;
pub mod host;
pub mod pool;
pub mod prediction;
pub mod ripple;
pub mod rocket;
pub mod scheduler;
pub mod smoothing;
pub mod systems;
pub mod trajectory;
pub mod weapon;

pub use engine::CombatSession;
pub use ordnance_core as core;
