//! Fuzes and the hand-off from projectile to explosion.
//!
//! `run` checks proximity and timed fuzes before projectiles move. `resolve`
//! takes every termination of the tick, sets off live payloads (or releases
//! beehive sub-munitions) and returns each projectile to its pool.

use glam::DVec3;
use hecs::World;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, trace};

use ordnance_core::components::{Kinematics, Lifetime, Payload, PoolSlot, Projectile, Submunition};
use ordnance_core::config::BlastConfig;
use ordnance_core::enums::{FillerType, FuzeType, ReleaseReason, WarheadType};
use ordnance_core::events::CombatEvent;
use ordnance_core::types::{TargetKinematics, VesselId};

use super::projectile::{self, ProjectileSpawn};
use super::{cleanup, explosion, is_terminated, Termination};
use crate::blast::Detonation;
use crate::geometry::gaussian_direction_deviation;
use crate::host::{Collider, DamageModel, Host, PhysicsQuery, RayHit, VesselState};
use crate::pool::Registry;
use crate::prediction::closest_approach;

/// The fuze is live: not inert and past its arming time.
pub fn armed(payload: &Payload, lifetime: &Lifetime) -> bool {
    payload.fuze != FuzeType::None && lifetime.time_alive >= payload.arming_time
}

/// Something to set off: a charge or sub-munitions.
pub fn has_charge(payload: &Payload) -> bool {
    payload.tnt_mass > 0.0 || payload.beehive.as_ref().is_some_and(|b| b.count > 0)
}

/// Whether an impact sets the payload off, and where.
///
/// Delay fuzes go off half a part deep, penetrating fuzes on the far side.
pub fn impact_detonation<Q: DamageModel + ?Sized>(
    host: &Q,
    payload: &Payload,
    lifetime: &Lifetime,
    hit: &RayHit,
    velocity: DVec3,
) -> (bool, DVec3) {
    if !armed(payload, lifetime) || !has_charge(payload) {
        return (false, hit.point);
    }
    let depth = |fraction: f64| match hit.collider {
        Collider::Part { part, .. } => host.part(part).map_or(0.0, |p| p.bounds_size * fraction),
        Collider::Building(_) | Collider::Terrain => 0.0,
    };
    let position = match payload.fuze {
        FuzeType::None => return (false, hit.point),
        FuzeType::Delay => hit.point + velocity.normalize_or_zero() * depth(0.5),
        FuzeType::Penetrating => hit.point + velocity.normalize_or_zero() * depth(1.0),
        FuzeType::Impact | FuzeType::Timed | FuzeType::Proximity | FuzeType::Flak => hit.point,
    };
    (true, position)
}

/// Earliest point within the next `dt` at which the projectile passes inside
/// detonation range of a non-friendly vessel.
pub fn proximity_trigger(
    own: &TargetKinematics,
    payload: &Payload,
    vessels: &[(VesselId, VesselState)],
    dt: f64,
) -> Option<(f64, DVec3)> {
    vessels
        .iter()
        .filter_map(|(_, vessel)| {
            let target = TargetKinematics::new(vessel.position, vessel.velocity, vessel.acceleration);
            let cpa = closest_approach(own, &target, dt);
            (cpa.miss_distance <= payload.detonation_range + vessel.radius)
                .then_some((cpa.time, cpa.own_position))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

/// Queue detonations for proximity and timed fuzes.
pub fn run<H: PhysicsQuery + DamageModel + ?Sized>(
    world: &mut World,
    host: &H,
    dt: f64,
    terminations: &mut Vec<Termination>,
) {
    let vessels: Vec<(VesselId, VesselState)> = host
        .vessels()
        .into_iter()
        .filter_map(|id| host.vessel(id).map(|state| (id, state)))
        .collect();

    for (entity, (projectile, kin, lifetime, payload)) in
        world.query_mut::<(&Projectile, &Kinematics, &Lifetime, &Payload)>()
    {
        if is_terminated(terminations, entity) || !armed(payload, lifetime) || !has_charge(payload) {
            continue;
        }

        if payload.fuze.is_timed()
            && payload.detonation_time > 0.0
            && lifetime.time_alive >= payload.detonation_time
        {
            trace!(entity = ?entity, "timed fuze");
            terminations.push(
                Termination::new(entity, ReleaseReason::Detonated, kin.position, kin.velocity).detonating(true),
            );
            continue;
        }

        if payload.fuze.is_proximity() {
            let hostile: Vec<(VesselId, VesselState)> = vessels
                .iter()
                .filter(|(id, v)| Some(*id) != projectile.source.vessel && v.team != projectile.source.team)
                .cloned()
                .collect();
            let gravity = if projectile.bullet_drop {
                host.gravity_at(kin.position)
            } else {
                DVec3::ZERO
            };
            let own = TargetKinematics::new(kin.position, kin.velocity, gravity + kin.acceleration);
            if let Some((t, point)) = proximity_trigger(&own, payload, &hostile, dt) {
                trace!(entity = ?entity, t, "proximity fuze");
                let velocity = kin.velocity + gravity * t;
                terminations.push(
                    Termination::new(entity, ReleaseReason::Detonated, point, velocity).detonating(true),
                );
            }
        }
    }
}

/// Set off live payloads and release every terminated projectile.
#[allow(clippy::too_many_arguments)]
pub fn resolve<H: Host + ?Sized>(
    world: &mut World,
    host: &H,
    registry: &mut Registry,
    config: &BlastConfig,
    rng: &mut ChaCha8Rng,
    now: f64,
    terminations: &mut Vec<Termination>,
    events: &mut Vec<CombatEvent>,
    despawn_buffer: &mut Vec<hecs::Entity>,
) {
    for termination in terminations.drain(..) {
        if termination.detonate {
            set_off(world, host, registry, config, rng, now, &termination, events);
        }
        if let Err(err) = cleanup::release_projectile(
            world,
            registry,
            termination.entity,
            termination.reason,
            termination.position,
            events,
            despawn_buffer,
        ) {
            error!(%err, entity = ?termination.entity, "projectile release failed");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn set_off<H: Host + ?Sized>(
    world: &mut World,
    host: &H,
    registry: &mut Registry,
    config: &BlastConfig,
    rng: &mut ChaCha8Rng,
    now: f64,
    termination: &Termination,
    events: &mut Vec<CombatEvent>,
) {
    let entity = termination.entity;
    let (projectile, payload, lifetime, model) = match (
        world.get::<&Projectile>(entity),
        world.get::<&Payload>(entity),
        world.get::<&Lifetime>(entity),
        world.get::<&PoolSlot>(entity),
    ) {
        (Ok(p), Ok(pl), Ok(l), Ok(s)) => ((*p).clone(), (*pl).clone(), *l, s.pool.clone()),
        _ => return,
    };

    if let Some(submunition) = &payload.beehive {
        release_submunitions(world, host, registry, rng, &projectile, &payload, submunition, &lifetime, model, termination);
        return;
    }
    if payload.tnt_mass <= 0.0 {
        return;
    }

    let mut detonation = Detonation::new(
        termination.position,
        payload.tnt_mass,
        projectile.kind.source_type(),
        projectile.source.clone(),
    )
    .with_direction(termination.velocity)
    .with_warhead(payload.warhead, projectile.caliber_mm)
    .with_casing_mass((projectile.mass_kg - payload.tnt_mass).max(0.0));
    detonation.power = payload.blast_power;
    if let Some(angle) = payload.angle_of_effect {
        detonation = detonation.with_angle_of_effect(angle);
    }
    explosion::spawn(world, host, registry, config, &detonation, now, events);
}

/// Scatter a beehive's sub-munitions around the carrier's flight path.
#[allow(clippy::too_many_arguments)]
fn release_submunitions<H: Host + ?Sized>(
    world: &mut World,
    host: &H,
    registry: &mut Registry,
    rng: &mut ChaCha8Rng,
    carrier: &Projectile,
    payload: &Payload,
    submunition: &Submunition,
    lifetime: &Lifetime,
    model: String,
    termination: &Termination,
) {
    let speed = termination.velocity.length();
    let time_to_live = (lifetime.time_to_live - lifetime.time_alive).max(ordnance_core::constants::DT);
    debug!(count = submunition.count, spread = submunition.spread_deg, "beehive release");
    for _ in 0..submunition.count {
        let direction = gaussian_direction_deviation(termination.velocity, submunition.spread_deg / 2.0, rng);
        let child = Payload {
            tnt_mass: submunition.tnt_mass,
            fuze: submunition.fuze,
            filler: FillerType::Standard,
            warhead: WarheadType::Standard,
            detonation_range: payload.detonation_range,
            arming_time: 0.0,
            detonation_time: 0.0,
            blast_power: payload.blast_power,
            angle_of_effect: None,
            beehive: None,
        };
        let spawn = ProjectileSpawn {
            kind: carrier.kind,
            model: model.clone(),
            caliber_mm: submunition.caliber_mm,
            mass_kg: submunition.mass_kg,
            drag_type: carrier.drag_type,
            bullet_drop: carrier.bullet_drop,
            position: termination.position,
            velocity: direction * speed,
            time_to_live,
            source: carrier.source.clone(),
            payload: None,
            motor: None,
        };
        let spawn = if child.fuze != FuzeType::None && child.tnt_mass > 0.0 {
            spawn.with_payload(child)
        } else {
            spawn
        };
        projectile::spawn(world, registry, host, spawn);
    }
}
