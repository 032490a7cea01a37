//! Contracts with the host world.
//!
//! The simulation never owns vessels, parts or buildings. It reads them
//! through `PhysicsQuery` and `DamageModel`, and reports attribution through
//! a `ScoringLedger`. Every lookup returns `Option` so callers can skip
//! targets destroyed earlier in the same tick.

use std::collections::HashMap;

use glam::DVec3;

use ordnance_core::enums::ExplosionSourceType;
use ordnance_core::types::{BuildingId, PartId, TeamId, VesselId};

/// What a ray or overlap query touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collider {
    Part { part: PartId, vessel: VesselId },
    Building(BuildingId),
    Terrain,
}

/// Result of a ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: DVec3,
    pub normal: DVec3,
    pub distance: f64,
    pub collider: Collider,
}

/// Snapshot of a part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartState {
    pub vessel: VesselId,
    pub position: DVec3,
    /// Mass (tonnes).
    pub mass: f64,
    pub health: f64,
    pub max_health: f64,
    /// Armor thickness (mm).
    pub armor: f64,
    /// Exposed area (m²).
    pub area: f64,
    /// Average bounding-box extent (m).
    pub bounds_size: f64,
}

/// Snapshot of a vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselState {
    pub name: String,
    pub team: TeamId,
    /// Center of mass.
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    /// Average radius (m).
    pub radius: f64,
    /// Total mass (tonnes).
    pub mass: f64,
}

/// Snapshot of a building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingState {
    pub position: DVec3,
    pub intact: bool,
    /// Accumulated damage.
    pub damage: f64,
    /// Damage above which the structure is demolished.
    pub demolition_threshold: f64,
}

/// Spatial and environmental queries.
pub trait PhysicsQuery {
    /// Everything overlapping a sphere.
    fn overlap_sphere(&self, origin: DVec3, radius: f64) -> Vec<Collider>;

    /// Nearest hit along a ray, ignoring `ignore`'s parts when given.
    fn raycast(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        ignore: Option<VesselId>,
    ) -> Option<RayHit>;

    /// All hits along a ray, nearest first.
    fn raycast_all(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Vec<RayHit>;

    fn gravity_at(&self, position: DVec3) -> DVec3;

    fn atmosphere_density(&self, position: DVec3) -> f64;

    /// Height above sea level.
    fn altitude(&self, position: DVec3) -> f64;

    /// Local up direction.
    fn up(&self, _position: DVec3) -> DVec3 {
        DVec3::Z
    }

    /// Every loaded vessel.
    fn vessels(&self) -> Vec<VesselId>;
}

/// Damageable entities.
pub trait DamageModel {
    fn part(&self, part: PartId) -> Option<PartState>;

    fn vessel(&self, vessel: VesselId) -> Option<VesselState>;

    fn building(&self, building: BuildingId) -> Option<BuildingState>;

    /// Apply damage and return the amount actually taken.
    fn apply_damage(&mut self, part: PartId, damage: f64, source: ExplosionSourceType) -> f64;

    /// Velocity change applied at a point, as an impulse on the vessel.
    fn apply_velocity_change(&mut self, part: PartId, delta_v: DVec3, point: DVec3);

    fn add_skin_heat(&mut self, part: PartId, kelvin: f64);

    /// Thin the part's armor by `thickness` mm.
    fn reduce_armor(&mut self, part: PartId, thickness: f64);

    fn damage_building(&mut self, building: BuildingId, damage: f64);

    fn demolish_building(&mut self, building: BuildingId);

    fn is_destroyed(&self, part: PartId) -> bool {
        self.part(part).map_or(true, |p| p.health <= 0.0)
    }
}

/// A host that offers both interfaces.
pub trait Host: PhysicsQuery + DamageModel {}

impl<T: PhysicsQuery + DamageModel> Host for T {}

/// Attribution of hits and damage.
///
/// Implementations may be no-ops; the simulation calls them unconditionally.
pub trait ScoringLedger {
    fn register_shot(&mut self, attacker: &str);

    /// Returns false when the pair is not being scored.
    fn register_hit(&mut self, attacker: &str, target: &str, source: ExplosionSourceType) -> bool;

    fn register_damage(
        &mut self,
        attacker: &str,
        target: &str,
        damage: f64,
        source: ExplosionSourceType,
    );
}

/// Ledger used when no scoring subsystem is active.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLedger;

impl ScoringLedger for NullLedger {
    fn register_shot(&mut self, _attacker: &str) {}

    fn register_hit(&mut self, _attacker: &str, _target: &str, _source: ExplosionSourceType) -> bool {
        false
    }

    fn register_damage(&mut self, _: &str, _: &str, _: f64, _: ExplosionSourceType) {}
}

/// Per-pair tallies kept in memory.
#[derive(Debug, Default, Clone)]
pub struct TallyLedger {
    pub shots: HashMap<String, u32>,
    pub hits: HashMap<(String, String, ExplosionSourceType), u32>,
    pub damage: HashMap<(String, String, ExplosionSourceType), f64>,
}

impl TallyLedger {
    pub fn damage_dealt(&self, attacker: &str, target: &str) -> f64 {
        self.damage
            .iter()
            .filter(|((a, t, _), _)| a == attacker && t == target)
            .map(|(_, d)| *d)
            .sum()
    }

    pub fn hit_count(&self, attacker: &str, target: &str) -> u32 {
        self.hits
            .iter()
            .filter(|((a, t, _), _)| a == attacker && t == target)
            .map(|(_, n)| *n)
            .sum()
    }
}

impl ScoringLedger for TallyLedger {
    fn register_shot(&mut self, attacker: &str) {
        *self.shots.entry(attacker.to_string()).or_default() += 1;
    }

    fn register_hit(&mut self, attacker: &str, target: &str, source: ExplosionSourceType) -> bool {
        if attacker.is_empty() || attacker == target {
            return false;
        }
        *self
            .hits
            .entry((attacker.to_string(), target.to_string(), source))
            .or_default() += 1;
        true
    }

    fn register_damage(
        &mut self,
        attacker: &str,
        target: &str,
        damage: f64,
        source: ExplosionSourceType,
    ) {
        *self
            .damage
            .entry((attacker.to_string(), target.to_string(), source))
            .or_default() += damage;
    }
}
