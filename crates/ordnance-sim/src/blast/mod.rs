//! Blast effects: scaling laws, armor, conventional explosions and nuclear devices.

pub mod armor;
pub mod explosion;
pub mod nuclear;
pub mod physics;

pub use explosion::{detonate, Detonation};
pub use physics::{blast_range, part_blast_effects, BlastInfo};
