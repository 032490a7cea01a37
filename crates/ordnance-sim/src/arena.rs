//! Reference host world.
//!
//! Flat sea surface at z = 0, an optional terrain plane, uniform gravity and
//! an exponential atmosphere. Parts are spheres grouped into vessels and
//! buildings are axis-aligned boxes. Used by tests and the CLI tool, and as
//! a template for wiring a real engine to the host traits.

use std::collections::BTreeMap;

use glam::DVec3;

use ordnance_core::constants::*;
use ordnance_core::enums::ExplosionSourceType;
use ordnance_core::types::{BuildingId, PartId, TeamId, VesselId};

use crate::host::*;

/// A spherical part.
#[derive(Debug, Clone)]
pub struct ArenaPart {
    pub vessel: VesselId,
    pub position: DVec3,
    pub radius: f64,
    /// Mass (tonnes).
    pub mass: f64,
    pub health: f64,
    pub max_health: f64,
    /// Armor thickness (mm).
    pub armor: f64,
    pub skin_temperature: f64,
    /// Velocity changes received, in order.
    pub impulses: Vec<DVec3>,
}

#[derive(Debug, Clone)]
pub struct ArenaVessel {
    pub name: String,
    pub team: TeamId,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    pub parts: Vec<PartId>,
}

/// A box-shaped structure.
#[derive(Debug, Clone)]
pub struct ArenaBuilding {
    pub center: DVec3,
    pub half_extents: DVec3,
    pub damage: f64,
    pub demolition_threshold: f64,
    pub intact: bool,
}

/// In-memory world implementing `PhysicsQuery` and `DamageModel`.
#[derive(Debug, Clone)]
pub struct Arena {
    pub gravity: f64,
    pub sea_level_density: f64,
    pub scale_height: f64,
    /// Height of a solid ground plane, if any.
    pub terrain_height: Option<f64>,
    parts: BTreeMap<PartId, ArenaPart>,
    vessels: BTreeMap<VesselId, ArenaVessel>,
    buildings: BTreeMap<BuildingId, ArenaBuilding>,
    next_id: u64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            sea_level_density: AIR_DENSITY_SEA_LEVEL,
            scale_height: ATMOSPHERE_SCALE_HEIGHT,
            terrain_height: None,
            parts: BTreeMap::new(),
            vessels: BTreeMap::new(),
            buildings: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena with no gravity and no atmosphere.
    pub fn vacuum() -> Self {
        Self {
            gravity: 0.0,
            sea_level_density: 0.0,
            ..Default::default()
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_vessel(&mut self, name: impl Into<String>, team: TeamId, velocity: DVec3) -> VesselId {
        let id = VesselId(self.allocate_id());
        self.vessels.insert(
            id,
            ArenaVessel {
                name: name.into(),
                team,
                velocity,
                acceleration: DVec3::ZERO,
                parts: Vec::new(),
            },
        );
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_part(
        &mut self,
        vessel: VesselId,
        position: DVec3,
        radius: f64,
        mass: f64,
        health: f64,
        armor: f64,
    ) -> PartId {
        let id = PartId(self.allocate_id());
        self.parts.insert(
            id,
            ArenaPart {
                vessel,
                position,
                radius,
                mass,
                health,
                max_health: health,
                armor,
                skin_temperature: 0.0,
                impulses: Vec::new(),
            },
        );
        if let Some(v) = self.vessels.get_mut(&vessel) {
            v.parts.push(id);
        }
        id
    }

    /// One vessel made of a single part; returns both handles.
    pub fn add_single_part_vessel(
        &mut self,
        name: impl Into<String>,
        team: TeamId,
        position: DVec3,
        radius: f64,
        mass: f64,
        health: f64,
    ) -> (VesselId, PartId) {
        let vessel = self.add_vessel(name, team, DVec3::ZERO);
        let part = self.add_part(vessel, position, radius, mass, health, 0.0);
        (vessel, part)
    }

    pub fn add_building(
        &mut self,
        center: DVec3,
        half_extents: DVec3,
        demolition_threshold: f64,
    ) -> BuildingId {
        let id = BuildingId(self.allocate_id());
        self.buildings.insert(
            id,
            ArenaBuilding {
                center,
                half_extents,
                damage: 0.0,
                demolition_threshold,
                intact: true,
            },
        );
        id
    }

    pub fn arena_part(&self, part: PartId) -> Option<&ArenaPart> {
        self.parts.get(&part)
    }

    pub fn arena_vessel_mut(&mut self, vessel: VesselId) -> Option<&mut ArenaVessel> {
        self.vessels.get_mut(&vessel)
    }

    pub fn arena_building(&self, building: BuildingId) -> Option<&ArenaBuilding> {
        self.buildings.get(&building)
    }

    /// Remove a part outright, as if it had been shot off.
    pub fn remove_part(&mut self, part: PartId) {
        if let Some(p) = self.parts.remove(&part) {
            if let Some(v) = self.vessels.get_mut(&p.vessel) {
                v.parts.retain(|id| *id != part);
            }
        }
    }

    /// Move every vessel along its velocity.
    pub fn step(&mut self, dt: f64) {
        for vessel in self.vessels.values_mut() {
            vessel.velocity += vessel.acceleration * dt;
            for id in &vessel.parts {
                if let Some(p) = self.parts.get_mut(id) {
                    p.position += vessel.velocity * dt;
                }
            }
        }
    }

    fn live_parts(&self) -> impl Iterator<Item = (&PartId, &ArenaPart)> {
        self.parts.iter().filter(|(_, p)| p.health > 0.0)
    }

    fn vessel_mass(&self, vessel: &ArenaVessel) -> f64 {
        vessel
            .parts
            .iter()
            .filter_map(|id| self.parts.get(id))
            .map(|p| p.mass)
            .sum()
    }
}

/// Distance along a unit ray to a sphere, if the origin is outside it.
fn ray_sphere(origin: DVec3, dir: DVec3, center: DVec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        // Origin inside: colliders containing the origin are not reported.
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Slab test; returns entry distance and face normal.
fn ray_box(origin: DVec3, dir: DVec3, center: DVec3, half: DVec3) -> Option<(f64, DVec3)> {
    let min = center - half;
    let max = center + half;
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;
    let mut normal = DVec3::ZERO;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-12 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        let mut face = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = 1.0;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = DVec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }
    (t_enter >= 0.0).then_some((t_enter, normal))
}

impl PhysicsQuery for Arena {
    fn overlap_sphere(&self, origin: DVec3, radius: f64) -> Vec<Collider> {
        let mut out = Vec::new();
        for (id, p) in self.live_parts() {
            if p.position.distance(origin) <= radius + p.radius {
                out.push(Collider::Part {
                    part: *id,
                    vessel: p.vessel,
                });
            }
        }
        for (id, b) in &self.buildings {
            let closest = origin.clamp(b.center - b.half_extents, b.center + b.half_extents);
            if closest.distance(origin) <= radius {
                out.push(Collider::Building(*id));
            }
        }
        if let Some(h) = self.terrain_height {
            if origin.z - radius <= h {
                out.push(Collider::Terrain);
            }
        }
        out
    }

    fn raycast(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        ignore: Option<VesselId>,
    ) -> Option<RayHit> {
        self.raycast_all(origin, direction, max_distance)
            .into_iter()
            .find(|hit| match (hit.collider, ignore) {
                (Collider::Part { vessel, .. }, Some(ignored)) => vessel != ignored,
                _ => true,
            })
    }

    fn raycast_all(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == DVec3::ZERO || !(max_distance > 0.0) {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (id, p) in self.live_parts() {
            if let Some(t) = ray_sphere(origin, dir, p.position, p.radius) {
                if t <= max_distance {
                    let point = origin + dir * t;
                    hits.push(RayHit {
                        point,
                        normal: (point - p.position).normalize_or_zero(),
                        distance: t,
                        collider: Collider::Part {
                            part: *id,
                            vessel: p.vessel,
                        },
                    });
                }
            }
        }
        for (id, b) in &self.buildings {
            if !b.intact {
                continue;
            }
            if let Some((t, normal)) = ray_box(origin, dir, b.center, b.half_extents) {
                if t <= max_distance {
                    hits.push(RayHit {
                        point: origin + dir * t,
                        normal,
                        distance: t,
                        collider: Collider::Building(*id),
                    });
                }
            }
        }
        if let Some(h) = self.terrain_height {
            if dir.z < 0.0 && origin.z >= h {
                let t = (h - origin.z) / dir.z;
                if t <= max_distance {
                    hits.push(RayHit {
                        point: origin + dir * t,
                        normal: DVec3::Z,
                        distance: t,
                        collider: Collider::Terrain,
                    });
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn gravity_at(&self, _position: DVec3) -> DVec3 {
        DVec3::new(0.0, 0.0, -self.gravity)
    }

    fn atmosphere_density(&self, position: DVec3) -> f64 {
        if self.scale_height <= 0.0 {
            return self.sea_level_density;
        }
        self.sea_level_density * (-position.z.max(0.0) / self.scale_height).exp()
    }

    fn altitude(&self, position: DVec3) -> f64 {
        position.z
    }

    fn vessels(&self) -> Vec<VesselId> {
        self.vessels.keys().copied().collect()
    }
}

impl DamageModel for Arena {
    fn part(&self, part: PartId) -> Option<PartState> {
        let p = self.parts.get(&part)?;
        Some(PartState {
            vessel: p.vessel,
            position: p.position,
            mass: p.mass,
            health: p.health,
            max_health: p.max_health,
            armor: p.armor,
            area: 4.0 * std::f64::consts::PI * p.radius * p.radius,
            bounds_size: 2.0 * p.radius,
        })
    }

    fn vessel(&self, vessel: VesselId) -> Option<VesselState> {
        let v = self.vessels.get(&vessel)?;
        let mass = self.vessel_mass(v);
        let mut com = DVec3::ZERO;
        let mut radius: f64 = 0.0;
        let parts: Vec<&ArenaPart> = v.parts.iter().filter_map(|id| self.parts.get(id)).collect();
        if mass > 0.0 {
            for p in &parts {
                com += p.position * p.mass;
            }
            com /= mass;
        } else if let Some(first) = parts.first() {
            com = first.position;
        }
        for p in &parts {
            radius = radius.max(p.position.distance(com) + p.radius);
        }
        Some(VesselState {
            name: v.name.clone(),
            team: v.team,
            position: com,
            velocity: v.velocity,
            acceleration: v.acceleration,
            radius,
            mass,
        })
    }

    fn building(&self, building: BuildingId) -> Option<BuildingState> {
        let b = self.buildings.get(&building)?;
        Some(BuildingState {
            position: b.center,
            intact: b.intact,
            damage: b.damage,
            demolition_threshold: b.demolition_threshold,
        })
    }

    fn apply_damage(&mut self, part: PartId, damage: f64, _source: ExplosionSourceType) -> f64 {
        match self.parts.get_mut(&part) {
            Some(p) if p.health > 0.0 => {
                let taken = damage.min(p.health).max(0.0);
                p.health -= taken;
                taken
            }
            _ => 0.0,
        }
    }

    fn apply_velocity_change(&mut self, part: PartId, delta_v: DVec3, _point: DVec3) {
        let (vessel_id, part_mass) = match self.parts.get_mut(&part) {
            Some(p) => {
                p.impulses.push(delta_v);
                (p.vessel, p.mass)
            }
            None => return,
        };
        let vessel_mass = match self.vessels.get(&vessel_id) {
            Some(v) => self.vessel_mass(v),
            None => return,
        };
        if let Some(v) = self.vessels.get_mut(&vessel_id) {
            if vessel_mass > 0.0 {
                v.velocity += delta_v * (part_mass / vessel_mass);
            }
        }
    }

    fn add_skin_heat(&mut self, part: PartId, kelvin: f64) {
        if let Some(p) = self.parts.get_mut(&part) {
            p.skin_temperature += kelvin;
        }
    }

    fn reduce_armor(&mut self, part: PartId, thickness: f64) {
        if let Some(p) = self.parts.get_mut(&part) {
            p.armor = (p.armor - thickness.max(0.0)).max(0.0);
        }
    }

    fn damage_building(&mut self, building: BuildingId, damage: f64) {
        if let Some(b) = self.buildings.get_mut(&building) {
            b.damage += damage;
        }
    }

    fn demolish_building(&mut self, building: BuildingId) {
        if let Some(b) = self.buildings.get_mut(&building) {
            b.intact = false;
        }
    }
}
