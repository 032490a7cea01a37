//! Blast events queued by explosions and combat events emitted by the session.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::*;

/// A part standing between a blast origin and its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntermediatePart {
    pub part: PartId,
    /// Distance from the blast origin (meters).
    pub distance: f64,
    pub health: f64,
    /// Armor thickness (mm).
    pub armor: f64,
}

/// What a blast event acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlastTarget {
    Part {
        part: PartId,
        vessel: VesselId,
        hit_point: DVec3,
        hit_normal: DVec3,
        /// Parts passed through on the way (spall radius).
        intermediate: Vec<IntermediatePart>,
        /// Inside the warhead's angle of effect.
        in_cone: bool,
    },
    /// Casing fragments striking a part, ahead of or beyond the blast wave.
    Fragments {
        part: PartId,
        vessel: VesselId,
        hit_point: DVec3,
        /// Armor of the parts passed through (mm).
        cover_armor: f64,
    },
    Building {
        building: BuildingId,
    },
}

/// One scheduled effect of an explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastEvent {
    /// Distance from the origin (meters). For rebounds, the rarefaction distance.
    pub distance: f64,
    /// Seconds after detonation at which the event executes.
    pub time_to_impact: f64,
    pub negative_pressure: bool,
    /// Rebound velocity change (m/s); zero for positive events.
    pub negative_force: f64,
    pub target: BlastTarget,
}

impl BlastEvent {
    /// Positive-pressure event arriving at `distance / propagation_velocity`.
    pub fn positive(distance: f64, propagation_velocity: f64, target: BlastTarget) -> Self {
        Self {
            distance,
            time_to_impact: distance / propagation_velocity,
            negative_pressure: false,
            negative_force: 0.0,
            target,
        }
    }

    /// Rarefaction event following a positive hit at `distance`.
    ///
    /// Arrives after the wave has reached the full range, come back and
    /// crossed the remaining gap.
    pub fn rebound(
        &self,
        range: f64,
        propagation_velocity: f64,
        negative_force: f64,
    ) -> Self {
        let remaining = range - self.distance;
        Self {
            distance: remaining,
            time_to_impact: 2.0 * (range / propagation_velocity)
                + remaining / propagation_velocity,
            negative_pressure: true,
            negative_force,
            target: self.target.clone(),
        }
    }

    pub fn part_id(&self) -> Option<PartId> {
        match self.target {
            BlastTarget::Part { part, .. } | BlastTarget::Fragments { part, .. } => Some(part),
            BlastTarget::Building { .. } => None,
        }
    }
}

/// Observable events emitted by a `CombatSession` each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CombatEvent {
    ShotFired {
        weapon: WeaponId,
        rounds: u32,
    },
    WeaponStateChanged {
        weapon: WeaponId,
        from: WeaponState,
        to: WeaponState,
    },
    RippleAdvanced {
        group: RippleGroupId,
        index: u32,
    },
    ProjectileReleased {
        kind: ProjectileKind,
        reason: ReleaseReason,
        position: DVec3,
    },
    Detonation {
        origin: DVec3,
        tnt_mass: f64,
        range: f64,
        source_type: ExplosionSourceType,
        events: usize,
    },
    NuclearDetonation {
        origin: DVec3,
        yield_kt: f64,
    },
    PartHit {
        part: PartId,
        damage: f64,
        velocity_change: f64,
        negative_pressure: bool,
    },
    FragmentHit {
        part: PartId,
        /// Expected number of fragments striking the part.
        fragments: f64,
        damage: f64,
    },
    BuildingDemolished {
        building: BuildingId,
    },
}
