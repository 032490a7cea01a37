//! Fundamental identifiers and simulation types.
//!
//! All vectors are `glam::DVec3` in world space (meters, m/s, m/s²).
//! Convention: x = East, y = North, z = Up.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Handle to a damageable part owned by the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u64);

/// Handle to a vessel (a rigid assembly of parts) owned by the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u64);

/// Handle to a static destructible structure owned by the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u64);

/// Team / faction identifier used for friend-or-foe checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

/// Index of a weapon inside a `CombatSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(pub u32);

/// Index of a ripple-fire group inside a `CombatSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RippleGroupId(pub u32);

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one fixed step of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Position, velocity and acceleration of a tracked body at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetKinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
}

impl TargetKinematics {
    pub fn new(position: DVec3, velocity: DVec3, acceleration: DVec3) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// A body at rest.
    pub fn stationary(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }
}

/// Who fired a projectile or caused an explosion.
///
/// Used only for attribution and self-hit filtering, never for lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The firing vessel, if it still exists.
    pub vessel: Option<VesselId>,
    /// Attacker name for scoring.
    pub name: String,
    /// Weapon name for logs.
    pub weapon: String,
    pub team: TeamId,
}

impl SourceInfo {
    pub fn new(vessel: VesselId, name: impl Into<String>, team: TeamId) -> Self {
        Self {
            vessel: Some(vessel),
            name: name.into(),
            weapon: String::new(),
            team,
        }
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = weapon.into();
        self
    }
}
