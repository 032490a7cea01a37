//! Conventional explosions: event calculation and time-ordered draining.
//!
//! A detonation resolves everything the blast can reach up front, turning
//! each reachable part or building into a `BlastEvent` that fires when the
//! wave gets there. `tick` then drains due events against the time since
//! detonation, applying impulse and damage through the host and queueing a
//! rarefaction rebound for every part that took damage.

use std::collections::{BTreeSet, VecDeque};

use glam::DVec3;
use tracing::{debug, trace, warn};

use ordnance_core::components::Explosion;
use ordnance_core::config::BlastConfig;
use ordnance_core::constants::*;
use ordnance_core::enums::{ExplosionPhase, ExplosionSourceType, WarheadType};
use ordnance_core::events::{BlastEvent, BlastTarget, CombatEvent, IntermediatePart};
use ordnance_core::types::{BuildingId, PartId, SourceInfo, VesselId};

use super::armor::{armor_erosion, blast_through_fraction, effective_thickness, penetration, Fragmentation};
use super::physics::{blast_range, part_blast_effects};
use crate::geometry::angle_deg;
use crate::host::{Collider, DamageModel, Host, PartState, PhysicsQuery, RayHit, ScoringLedger, VesselState};

/// Everything needed to set off a conventional charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Detonation {
    pub origin: DVec3,
    /// Warhead axis; zero for an omnidirectional blast.
    pub direction: DVec3,
    pub tnt_mass: f64,
    /// Explicit blast range; derived from the charge when absent.
    pub range: Option<f64>,
    /// Power used against buildings.
    pub power: f64,
    pub caliber_mm: f64,
    /// Metal around the charge (kg); standard warheads throw it as fragments.
    pub casing_mass: f64,
    pub warhead: WarheadType,
    pub angle_of_effect: Option<f64>,
    pub source_type: ExplosionSourceType,
    pub source: SourceInfo,
    /// Part carrying the charge; never treated as cover.
    pub explosive_part: Option<PartId>,
    /// CASE limit for this charge; the blast config's applies when absent.
    pub damage_cap: Option<f64>,
}

impl Detonation {
    pub fn new(origin: DVec3, tnt_mass: f64, source_type: ExplosionSourceType, source: SourceInfo) -> Self {
        Self {
            origin,
            direction: DVec3::ZERO,
            tnt_mass,
            range: None,
            power: DEFAULT_BLAST_POWER,
            caliber_mm: 0.0,
            casing_mass: 0.0,
            warhead: WarheadType::Standard,
            angle_of_effect: None,
            source_type,
            source,
            explosive_part: None,
            damage_cap: None,
        }
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_direction(mut self, direction: DVec3) -> Self {
        self.direction = direction.normalize_or_zero();
        self
    }

    pub fn with_warhead(mut self, warhead: WarheadType, caliber_mm: f64) -> Self {
        self.warhead = warhead;
        self.caliber_mm = caliber_mm;
        self
    }

    pub fn with_angle_of_effect(mut self, degrees: f64) -> Self {
        self.angle_of_effect = Some(degrees);
        self
    }

    pub fn with_explosive_part(mut self, part: PartId) -> Self {
        self.explosive_part = Some(part);
        self
    }

    pub fn with_casing_mass(mut self, kg: f64) -> Self {
        self.casing_mass = kg;
        self
    }

    pub fn with_damage_cap(mut self, cap: f64) -> Self {
        self.damage_cap = Some(cap);
        self
    }
}

/// Half-angle of effect and effective caliber for a warhead.
pub fn warhead_geometry(warhead: WarheadType, angle: Option<f64>, caliber_mm: f64) -> (f64, f64) {
    match warhead {
        WarheadType::ShapedCharge => (SHAPED_CHARGE_ANGLE, caliber_mm / 2.0),
        WarheadType::ContinuousRod => (
            angle.map_or(DEFAULT_ANGLE_OF_EFFECT, |a| a.clamp(0.0, 180.0)),
            caliber_mm / 4.0,
        ),
        WarheadType::Standard => (
            angle.map_or(DEFAULT_ANGLE_OF_EFFECT, |a| a.clamp(0.0, 180.0)),
            caliber_mm,
        ),
    }
}

/// Seconds an explosion lingers before it may expire.
pub fn display_duration(range: f64, propagation_velocity: f64) -> f64 {
    (range / propagation_velocity * 3.0).sqrt() * 2.0
}

/// Set off a charge: compute its blast events and return the armed explosion.
pub fn detonate<H: PhysicsQuery + DamageModel + ?Sized>(
    host: &H,
    detonation: &Detonation,
    config: &BlastConfig,
    now: f64,
) -> Explosion {
    let (angle_of_effect, caliber_mm) =
        warhead_geometry(detonation.warhead, detonation.angle_of_effect, detonation.caliber_mm);
    let range = detonation
        .range
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or_else(|| blast_range(detonation.tnt_mass));
    let velocity = config.propagation_velocity;

    let mut explosion = Explosion {
        phase: ExplosionPhase::Armed,
        origin: detonation.origin,
        direction: detonation.direction.normalize_or_zero(),
        tnt_mass: detonation.tnt_mass,
        range,
        power: detonation.power,
        caliber_mm,
        casing_mass: detonation.casing_mass.max(0.0),
        warhead: detonation.warhead,
        angle_of_effect,
        source_type: detonation.source_type,
        source: detonation.source.clone(),
        propagation_velocity: velocity,
        start_time: now,
        max_time: display_duration(range, velocity),
        damage_cap: detonation
            .damage_cap
            .filter(|c| c.is_finite() && *c > 0.0)
            .or(config.damage_cap),
        queue: VecDeque::new(),
    };
    let events = calculate_blast_events(host, &explosion, detonation.explosive_part, config);
    debug!(
        origin = ?explosion.origin,
        tnt = explosion.tnt_mass,
        range,
        events = events.len(),
        source = ?explosion.source_type,
        "explosion armed"
    );
    explosion.queue = events.into();
    explosion
}

/// CASE limit on one hit.
///
/// Caps under `CASE_PART_LIMIT_THRESHOLD` also hold the hit to a share of
/// the part's max health; larger caps apply as they are.
pub fn case_clamp(damage: f64, cap: Option<f64>, max_health: f64) -> f64 {
    let limit = match cap {
        Some(cap) if cap < CASE_PART_LIMIT_THRESHOLD => (max_health * CASE_MAX_HEALTH_FRACTION).min(cap),
        Some(cap) => cap,
        None => return damage,
    };
    damage.min(limit).max(0.0)
}

/// Fragments thrown by the explosion, if it has a casing to throw.
pub fn fragmentation(explosion: &Explosion) -> Option<Fragmentation> {
    if explosion.warhead != WarheadType::Standard {
        return None;
    }
    Fragmentation::of(explosion.tnt_mass, explosion.casing_mass)
}

/// Whether `point` lies inside the explosion's angle of effect.
pub fn in_angle_of_effect(explosion: &Explosion, point: DVec3) -> bool {
    if explosion.direction == DVec3::ZERO {
        return true;
    }
    let angle = angle_deg(explosion.direction, point - explosion.origin);
    match explosion.warhead {
        WarheadType::ContinuousRod => {
            (CONTINUOUS_ROD_MIN_ANGLE..=CONTINUOUS_ROD_MAX_ANGLE).contains(&angle)
        }
        _ => angle <= explosion.angle_of_effect,
    }
}

/// Every part and building the blast reaches, sorted by arrival time.
///
/// Cased standard charges also schedule a fragment strike on every part in
/// sight out to `FRAGMENT_REACH_FACTOR` times the blast range.
pub fn calculate_blast_events<H: PhysicsQuery + DamageModel + ?Sized>(
    host: &H,
    explosion: &Explosion,
    explosive_part: Option<PartId>,
    config: &BlastConfig,
) -> Vec<BlastEvent> {
    let mut events = Vec::new();
    let mut parts_seen = BTreeSet::new();
    let mut buildings_seen = BTreeSet::new();
    let casing_vessel = casing_vessel(host, explosion, explosive_part);
    let fragments = fragmentation(explosion);
    let reach = match fragments {
        Some(_) => explosion.range * FRAGMENT_REACH_FACTOR,
        None => explosion.range,
    };

    if explosion.warhead == WarheadType::ShapedCharge && explosion.direction != DVec3::ZERO {
        // Parts on the jet axis are in the cone whatever their angle.
        for hit in host.raycast_all(explosion.origin, explosion.direction, explosion.range) {
            match hit.collider {
                Collider::Part { part, vessel } => {
                    if Some(vessel) == explosion.source.vessel || Some(part) == explosive_part {
                        continue;
                    }
                    if parts_seen.insert(part) {
                        let sight = PartSight {
                            explosive_part,
                            casing_vessel,
                            force_in_cone: true,
                            fragments: None,
                        };
                        part_events(host, explosion, part, &sight, config, &mut events);
                    }
                }
                Collider::Building(building) => {
                    if buildings_seen.insert(building) {
                        events.extend(building_event(host, explosion, building));
                    }
                }
                Collider::Terrain => break,
            }
        }
    }

    for collider in host.overlap_sphere(explosion.origin, reach) {
        match collider {
            Collider::Part { part, .. } => {
                if Some(part) == explosive_part || parts_seen.contains(&part) {
                    continue;
                }
                let Some(state) = host.part(part) else {
                    continue;
                };
                if !(state.mass > 0.0) {
                    continue;
                }
                parts_seen.insert(part);
                let sight = PartSight {
                    explosive_part,
                    casing_vessel,
                    force_in_cone: false,
                    fragments: fragments.as_ref(),
                };
                part_events(host, explosion, part, &sight, config, &mut events);
            }
            Collider::Building(building) => {
                if buildings_seen.insert(building) {
                    events.extend(building_event(host, explosion, building));
                }
            }
            Collider::Terrain => {}
        }
    }

    events.sort_by(|a, b| a.time_to_impact.total_cmp(&b.time_to_impact));
    events
}

fn casing_vessel<H: DamageModel + ?Sized>(
    host: &H,
    explosion: &Explosion,
    explosive_part: Option<PartId>,
) -> Option<VesselId> {
    if !explosion.source_type.has_casing() {
        return None;
    }
    explosive_part
        .and_then(|p| host.part(p))
        .map(|p| p.vessel)
        .or(explosion.source.vessel)
}

struct PartSight<'a> {
    explosive_part: Option<PartId>,
    casing_vessel: Option<VesselId>,
    force_in_cone: bool,
    fragments: Option<&'a Fragmentation>,
}

fn part_events<H: PhysicsQuery + DamageModel + ?Sized>(
    host: &H,
    explosion: &Explosion,
    part: PartId,
    sight: &PartSight<'_>,
    config: &BlastConfig,
    events: &mut Vec<BlastEvent>,
) {
    let reach = match sight.fragments {
        Some(_) => explosion.range * FRAGMENT_REACH_FACTOR,
        None => explosion.range,
    };
    let Some((hit, intermediate)) = line_of_sight(
        host,
        explosion,
        part,
        sight.explosive_part,
        sight.casing_vessel,
        config,
        reach,
    ) else {
        return;
    };
    let Collider::Part { vessel, .. } = hit.collider else {
        return;
    };
    if let Some(fragments) = sight.fragments {
        events.push(BlastEvent::positive(
            hit.distance,
            fragments.speed,
            BlastTarget::Fragments {
                part,
                vessel,
                hit_point: hit.point,
                cover_armor: intermediate.iter().map(|i| i.armor).sum(),
            },
        ));
    }
    if hit.distance > explosion.range {
        return;
    }
    let in_cone = sight.force_in_cone || in_angle_of_effect(explosion, hit.point);
    events.push(BlastEvent::positive(
        hit.distance,
        explosion.propagation_velocity,
        BlastTarget::Part {
            part,
            vessel,
            hit_point: hit.point,
            hit_normal: hit.normal,
            intermediate,
            in_cone,
        },
    ));
}

/// Where the blast first touches `target`, and what it passed through.
///
/// A forward ray from the origin and a reverse ray from `reach` out are
/// merged so that parts enclosing the origin are still seen.
/// Parts nearer than the spall radius are passed through and recorded;
/// anything further out, or terrain, hides the target.
pub fn line_of_sight<H: PhysicsQuery + DamageModel + ?Sized>(
    host: &H,
    explosion: &Explosion,
    target: PartId,
    explosive_part: Option<PartId>,
    casing_vessel: Option<VesselId>,
    config: &BlastConfig,
    reach: f64,
) -> Option<(RayHit, Vec<IntermediatePart>)> {
    let target_state = host.part(target)?;
    let direction = (target_state.position - explosion.origin).normalize_or_zero();
    if direction == DVec3::ZERO {
        return None;
    }

    let mut hits = host.raycast_all(explosion.origin, direction, reach);
    let far_end = explosion.origin + direction * reach;
    hits.extend(host.raycast_all(far_end, -direction, reach).into_iter().map(|mut hit| {
        hit.distance = reach - hit.distance;
        hit
    }));
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let spall_radius = config.spall_radius_fraction * explosion.range;
    let mut intermediate: Vec<IntermediatePart> = Vec::new();
    for hit in hits {
        match hit.collider {
            Collider::Part { part, vessel } => {
                if part == target {
                    return Some((hit, intermediate));
                }
                if Some(part) == explosive_part || Some(vessel) == casing_vessel {
                    continue;
                }
                if intermediate.iter().any(|i| i.part == part) {
                    continue;
                }
                let Some(state) = host.part(part) else {
                    continue;
                };
                if state.health <= 0.0 {
                    continue;
                }
                if hit.distance > spall_radius {
                    trace!(target = ?target, blocker = ?part, "blast shielded");
                    return None;
                }
                intermediate.push(IntermediatePart {
                    part,
                    distance: hit.distance,
                    health: state.health,
                    armor: state.armor,
                });
            }
            Collider::Terrain => return None,
            Collider::Building(_) => {}
        }
    }
    None
}

fn building_event<H: PhysicsQuery + DamageModel + ?Sized>(
    host: &H,
    explosion: &Explosion,
    building: BuildingId,
) -> Option<BlastEvent> {
    let state = host.building(building)?;
    if !state.intact {
        return None;
    }
    let hit = host.raycast(explosion.origin, state.position - explosion.origin, explosion.range, None)?;
    if hit.collider != Collider::Building(building) {
        return None;
    }
    Some(BlastEvent::positive(
        hit.distance,
        explosion.propagation_velocity,
        BlastTarget::Building { building },
    ))
}

/// Insert keeping the queue sorted; equal times keep arrival order.
pub fn enqueue_sorted(queue: &mut VecDeque<BlastEvent>, event: BlastEvent) {
    let index = queue.partition_point(|e| e.time_to_impact <= event.time_to_impact);
    queue.insert(index, event);
}

/// Drain every event due at `now` and advance the explosion's phase.
pub fn tick<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    explosion: &mut Explosion,
    host: &mut H,
    ledger: &mut L,
    config: &BlastConfig,
    now: f64,
    events_out: &mut Vec<CombatEvent>,
) -> ExplosionPhase {
    match explosion.phase {
        ExplosionPhase::Inactive | ExplosionPhase::Expired => return explosion.phase,
        ExplosionPhase::Armed => explosion.phase = ExplosionPhase::Detonating,
        ExplosionPhase::Detonating => {}
    }
    let time_index = now - explosion.start_time;

    while explosion
        .queue
        .front()
        .is_some_and(|e| e.time_to_impact <= time_index)
    {
        let Some(event) = explosion.queue.pop_front() else {
            break;
        };
        match event.target {
            BlastTarget::Part { .. } if event.negative_pressure => {
                execute_rebound(explosion, host, config, &event, events_out);
            }
            BlastTarget::Part { .. } => {
                execute_part_event(explosion, host, ledger, config, &event, time_index, events_out);
            }
            BlastTarget::Fragments { .. } => {
                execute_fragment_event(explosion, host, ledger, &event, events_out);
            }
            BlastTarget::Building { building } => {
                execute_building_event(explosion, host, config, &event, building, events_out);
            }
        }
    }

    if explosion.queue.is_empty() && time_index > explosion.max_time {
        explosion.phase = ExplosionPhase::Expired;
    }
    explosion.phase
}

fn execute_part_event<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    explosion: &mut Explosion,
    host: &mut H,
    ledger: &mut L,
    config: &BlastConfig,
    event: &BlastEvent,
    time_index: f64,
    events_out: &mut Vec<CombatEvent>,
) {
    let BlastTarget::Part {
        part,
        hit_point,
        hit_normal,
        ref intermediate,
        in_cone,
        ..
    } = event.target
    else {
        return;
    };
    let Some(state) = host.part(part) else {
        trace!(part = ?part, "blast target gone");
        return;
    };
    if host.is_destroyed(part) {
        trace!(part = ?part, "blast target already destroyed");
        return;
    }
    let vessel = host.vessel(state.vessel);
    let vessel_mass = vessel
        .as_ref()
        .map(|v| v.mass)
        .filter(|m| *m > 0.0)
        .unwrap_or(state.mass);

    let info = if in_cone {
        part_blast_effects(
            state.area,
            state.bounds_size,
            event.distance,
            vessel_mass * 1000.0,
            explosion.tnt_mass,
            explosion.range,
        )
    } else if event.distance < explosion.range / 2.0 {
        part_blast_effects(
            state.area,
            state.bounds_size,
            event.distance,
            vessel_mass * 1000.0,
            explosion.tnt_mass / 4.0,
            explosion.range / 2.0,
        )
    } else {
        return;
    };

    let shielding: f64 = intermediate
        .iter()
        .map(|i| config.intermediate_health_factor * i.health + i.armor)
        .sum();
    let damage = case_clamp((info.damage - shielding).max(0.0), explosion.damage_cap, state.max_health);
    if !damage.is_finite() || !info.velocity_change.is_finite() {
        warn!(
            part = ?part,
            damage,
            velocity_change = info.velocity_change,
            distance = event.distance,
            "non-finite blast result, skipped"
        );
        return;
    }
    if damage <= 0.0 {
        trace!(part = ?part, shielding, "blast absorbed");
        return;
    }

    let rebound = event.rebound(
        explosion.range,
        explosion.propagation_velocity,
        info.velocity_change * config.rebound_force_fraction,
    );
    enqueue_sorted(&mut explosion.queue, rebound);

    // The vessel has moved on since the wave left the origin.
    let drift = vessel.as_ref().map_or(DVec3::ZERO, |v| v.velocity * time_index);
    let struck = hit_point + drift;
    let push = (struck - explosion.origin).normalize_or_zero();
    host.apply_velocity_change(part, push * info.velocity_change, struck);

    let cover_armor: f64 = intermediate.iter().map(|i| i.armor).sum();
    let penetrates = matches!(explosion.warhead, WarheadType::ShapedCharge | WarheadType::ContinuousRod);
    let damage = if in_cone && penetrates {
        penetrating_damage(explosion, host, part, &state, push, hit_normal, cover_armor, damage)
    } else {
        damage * blast_through_fraction(info.total_pressure, state.armor)
    };
    let taken = if damage > 0.0 {
        host.apply_damage(part, damage, explosion.source_type)
    } else {
        0.0
    };
    trace!(part = ?part, damage, taken, dv = info.velocity_change, "blast hit");

    score(ledger, explosion, vessel.as_ref(), taken);
    events_out.push(CombatEvent::PartHit {
        part,
        damage: taken,
        velocity_change: info.velocity_change,
        negative_pressure: false,
    });
}

/// Damage left once a shaped jet or rod meets the part's plate.
///
/// Unarmored parts take the blast as it is. Otherwise the jet (half the
/// charge) or the rods (the casing) must out-penetrate the plate along the
/// line of travel plus any armor it passed through. The plate is eroded
/// either way.
#[allow(clippy::too_many_arguments)]
fn penetrating_damage<H: DamageModel + ?Sized>(
    explosion: &Explosion,
    host: &mut H,
    part: PartId,
    state: &PartState,
    travel: DVec3,
    hit_normal: DVec3,
    cover_armor: f64,
    damage: f64,
) -> f64 {
    if state.armor <= 0.0 && cover_armor <= 0.0 {
        return damage;
    }
    let cos_incidence = if hit_normal == DVec3::ZERO {
        1.0
    } else {
        travel.dot(-hit_normal.normalize_or_zero())
    };
    let thickness = effective_thickness(state.armor, cos_incidence) + cover_armor;
    let penetrator_mass = match explosion.warhead {
        WarheadType::ShapedCharge => explosion.tnt_mass / 2.0,
        _ => explosion.casing_mass,
    };
    let depth = penetration(explosion.caliber_mm, penetrator_mass, explosion.propagation_velocity);
    let penetrated = depth > thickness;
    let eroded = armor_erosion(explosion.caliber_mm, depth, state.armor, state.area, penetrated);
    if eroded > 0.0 {
        host.reduce_armor(part, eroded);
    }
    trace!(part = ?part, depth, thickness, eroded, penetrated, "armor struck");
    if penetrated {
        damage
    } else {
        0.0
    }
}

fn score<L: ScoringLedger + ?Sized>(
    ledger: &mut L,
    explosion: &Explosion,
    vessel: Option<&VesselState>,
    taken: f64,
) {
    let Some(vessel) = vessel else {
        return;
    };
    if taken > 0.0 && ledger.register_hit(&explosion.source.name, &vessel.name, explosion.source_type) {
        ledger.register_damage(&explosion.source.name, &vessel.name, taken, explosion.source_type);
    }
}

fn execute_fragment_event<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    explosion: &Explosion,
    host: &mut H,
    ledger: &mut L,
    event: &BlastEvent,
    events_out: &mut Vec<CombatEvent>,
) {
    let BlastTarget::Fragments { part, cover_armor, .. } = event.target else {
        return;
    };
    let Some(fragments) = fragmentation(explosion) else {
        return;
    };
    let Some(state) = host.part(part) else {
        trace!(part = ?part, "fragment target gone");
        return;
    };
    if host.is_destroyed(part) {
        return;
    }
    let strikes = fragments.strikes(state.area, event.distance);
    let damage = fragments.damage(strikes, state.armor + cover_armor);
    if !damage.is_finite() {
        warn!(part = ?part, damage, strikes, "non-finite fragment damage, skipped");
        return;
    }
    if damage <= 0.0 {
        trace!(part = ?part, strikes, "fragments stopped");
        return;
    }
    let taken = host.apply_damage(part, damage, explosion.source_type);
    trace!(part = ?part, strikes, damage, taken, "fragment hit");
    score(ledger, explosion, host.vessel(state.vessel).as_ref(), taken);
    events_out.push(CombatEvent::FragmentHit {
        part,
        fragments: strikes,
        damage: taken,
    });
}

/// Rarefaction pull back toward the origin.
///
/// The queued force is already a fraction of the positive velocity change;
/// the same fraction applies again here.
fn execute_rebound<H: Host + ?Sized>(
    explosion: &Explosion,
    host: &mut H,
    config: &BlastConfig,
    event: &BlastEvent,
    events_out: &mut Vec<CombatEvent>,
) {
    let Some(part) = event.part_id() else {
        return;
    };
    let Some(state) = host.part(part) else {
        trace!(part = ?part, "rebound target gone");
        return;
    };
    if host.is_destroyed(part) {
        return;
    }
    let velocity_change = event.negative_force * config.rebound_force_fraction;
    if !velocity_change.is_finite() {
        warn!(part = ?part, velocity_change, "non-finite rebound, skipped");
        return;
    }
    let pull = (explosion.origin - state.position).normalize_or_zero();
    host.apply_velocity_change(part, pull * velocity_change, state.position);
    events_out.push(CombatEvent::PartHit {
        part,
        damage: 0.0,
        velocity_change,
        negative_pressure: true,
    });
}

fn execute_building_event<H: Host + ?Sized>(
    explosion: &Explosion,
    host: &mut H,
    config: &BlastConfig,
    event: &BlastEvent,
    building: BuildingId,
    events_out: &mut Vec<CombatEvent>,
) {
    let Some(state) = host.building(building) else {
        return;
    };
    if !state.intact {
        return;
    }
    let factor = ((explosion.range - event.distance) / explosion.range).clamp(0.0, 1.0);
    let damage = config.building_damage_multiplier * explosion.power * factor * 2.0;
    if !damage.is_finite() {
        warn!(building = ?building, damage, "non-finite building damage, skipped");
        return;
    }
    host.damage_building(building, damage);
    let accumulated = host.building(building).map_or(0.0, |b| b.damage);
    if accumulated > state.demolition_threshold {
        host.demolish_building(building);
        debug!(building = ?building, accumulated, "building demolished");
        events_out.push(CombatEvent::BuildingDemolished { building });
    }
}
