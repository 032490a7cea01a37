//! ECS components for hecs entities.
//!
//! Components are plain data structs. Flight, fuze and blast logic lives in
//! the simulation crate's systems. Optional components (`Payload`,
//! `RocketMotor`) are attached at spawn time and act as the entity's
//! capability set; systems never search for behavior by type afterwards.

use std::collections::VecDeque;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::BlastEvent;
use crate::types::SourceInfo;

/// Position, velocity and acceleration accumulator of a moving body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    /// Non-gravitational acceleration applied this step.
    pub acceleration: DVec3,
}

/// A bullet or rocket in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    /// Caliber in millimeters.
    pub caliber_mm: f64,
    /// Mass in kilograms.
    pub mass_kg: f64,
    /// Always strictly positive.
    pub ballistic_coefficient: f64,
    pub drag_type: BulletDragType,
    /// Whether gravity acts on it.
    pub bullet_drop: bool,
    /// Speed at the last drag adjustment (m/s).
    pub reference_speed: f64,
    /// Seconds since `reference_speed` was taken.
    pub time_since_speed_update: f64,
    pub underwater: bool,
    pub distance_traveled: f64,
    /// Attribution only; never keeps the source alive.
    pub source: SourceInfo,
}

/// Flight clock of a projectile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub time_alive: f64,
    /// Positive and finite.
    pub time_to_live: f64,
}

impl Lifetime {
    pub fn expired(&self) -> bool {
        self.time_alive >= self.time_to_live
    }
}

/// Sub-munitions released by a beehive payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submunition {
    pub count: u32,
    pub caliber_mm: f64,
    pub mass_kg: f64,
    /// Half-angle of the release cone (degrees).
    pub spread_deg: f64,
    pub tnt_mass: f64,
    pub fuze: FuzeType,
}

/// Explosive payload carried by a projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// TNT-equivalent mass (kg).
    pub tnt_mass: f64,
    pub fuze: FuzeType,
    pub filler: FillerType,
    pub warhead: WarheadType,
    /// Proximity fuze range (meters).
    pub detonation_range: f64,
    /// Fuze stays safe until this much flight time has passed.
    pub arming_time: f64,
    /// Timed fuze setting (seconds of flight).
    pub detonation_time: f64,
    /// Power used against buildings.
    pub blast_power: f64,
    /// Half-angle override (degrees).
    pub angle_of_effect: Option<f64>,
    pub beehive: Option<Submunition>,
}

/// Motor of a rocket in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocketMotor {
    /// Thrust (kN, paired with mass in tonnes).
    pub thrust: f64,
    pub thrust_time: f64,
    pub burn_elapsed: f64,
    /// Unit pointing direction.
    pub direction: DVec3,
}

impl RocketMotor {
    pub fn burning(&self) -> bool {
        self.burn_elapsed < self.thrust_time
    }
}

/// Ties an entity to the pool slot it was acquired from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSlot {
    pub pool: String,
    pub slot: usize,
    pub generation: u32,
}

/// A conventional explosion and its pending blast events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub phase: ExplosionPhase,
    pub origin: DVec3,
    /// Warhead axis (unit), zero for omnidirectional blasts.
    pub direction: DVec3,
    pub tnt_mass: f64,
    /// Blast range (meters).
    pub range: f64,
    /// Power used against buildings.
    pub power: f64,
    pub caliber_mm: f64,
    /// Metal around the charge (kg); zero for a bare charge.
    pub casing_mass: f64,
    pub warhead: WarheadType,
    /// Half-angle of effect (degrees).
    pub angle_of_effect: f64,
    pub source_type: ExplosionSourceType,
    pub source: SourceInfo,
    /// Blast wave speed (m/s).
    pub propagation_velocity: f64,
    /// Session time at detonation (seconds).
    pub start_time: f64,
    /// Display duration; the explosion expires after this once drained.
    pub max_time: f64,
    /// CASE limit on damage per part hit.
    pub damage_cap: Option<f64>,
    /// Sorted ascending by `time_to_impact`.
    pub queue: VecDeque<BlastEvent>,
}

/// A nuclear detonation waiting for its timer or already expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuclearBlast {
    pub origin: DVec3,
    pub yield_kt: f64,
    /// Overlap radius for thermal and shock effects (meters).
    pub thermal_radius: f64,
    /// Thermal magnitude.
    pub fluence: f64,
    /// Session time at which the device fires.
    pub detonate_at: f64,
    pub detonated: bool,
    /// Last valid atmospheric density sampled at the origin.
    pub atmospheric_density: f64,
    pub source: SourceInfo,
}
