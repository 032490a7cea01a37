//! Projectile spawning and live flight.
//!
//! Each tick a projectile ages, casts a ray along its drag-adjusted
//! velocity, and either stops at what the ray hit or moves one step. Bullets
//! integrate with a kick-drift-kick leap-frog; rockets burn their motor
//! through `rocket_step`. Crossing the sea surface ends in a ricochet, a
//! splash or a dive. Anything that stops flying becomes a `Termination` for
//! the fuze system to resolve.

use glam::DVec3;
use hecs::{Entity, EntityBuilder, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{trace, warn};

use ordnance_core::components::{Kinematics, Lifetime, Payload, Projectile, RocketMotor};
use ordnance_core::config::{AmmoConfig, ExplosiveConfig, RocketConfig};
use ordnance_core::constants::*;
use ordnance_core::enums::*;
use ordnance_core::events::CombatEvent;
use ordnance_core::types::SourceInfo;

use super::{fuze, is_terminated, Termination};
use crate::drag::{ballistic_coefficient, drag_adjusted_velocity, medium_density, numerical_drag_step};
use crate::geometry::{angle_deg, random_tilt, reflect};
use crate::host::{Collider, Host, PhysicsQuery, RayHit, ScoringLedger};
use crate::pool::Registry;
use crate::rocket::rocket_step;

/// Caliber (mm) from which rounds dive instead of splashing.
const DIVE_MIN_CALIBER: f64 = 75.0;

/// Largest random turn added to a ricochet (degrees).
const RICOCHET_JITTER_DEG: f64 = 5.0;

/// Everything needed to put one projectile in flight.
#[derive(Debug, Clone)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    /// Prototype path of the projectile pool.
    pub model: String,
    pub caliber_mm: f64,
    pub mass_kg: f64,
    pub drag_type: BulletDragType,
    pub bullet_drop: bool,
    pub position: DVec3,
    pub velocity: DVec3,
    pub time_to_live: f64,
    pub source: SourceInfo,
    pub payload: Option<Payload>,
    pub motor: Option<RocketMotor>,
}

impl ProjectileSpawn {
    /// A bullet of `ammo` leaving `position` at `velocity`.
    pub fn bullet(
        ammo: &AmmoConfig,
        position: DVec3,
        velocity: DVec3,
        time_to_live: f64,
        source: SourceInfo,
    ) -> Self {
        Self {
            kind: ProjectileKind::Bullet,
            model: ammo.model.clone(),
            caliber_mm: ammo.caliber_mm,
            mass_kg: ammo.mass_kg,
            drag_type: ammo.drag_type,
            bullet_drop: ammo.bullet_drop,
            position,
            velocity,
            time_to_live,
            source,
            payload: None,
            motor: None,
        }
    }

    /// Turn the round into a rocket pointing along `direction`.
    pub fn with_rocket(mut self, rocket: &RocketConfig, direction: DVec3) -> Self {
        self.kind = ProjectileKind::Rocket;
        self.mass_kg = rocket.mass * 1_000.0;
        self.drag_type = BulletDragType::None;
        self.bullet_drop = true;
        self.motor = Some(RocketMotor {
            thrust: rocket.thrust,
            thrust_time: rocket.thrust_time,
            burn_elapsed: 0.0,
            direction: direction.normalize_or_zero(),
        });
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Payload for a round filled with `explosive`; a zero timed setting is
/// replaced by `fallback_detonation_time`.
pub fn payload_from(explosive: &ExplosiveConfig, fallback_detonation_time: f64) -> Payload {
    let detonation_time = if explosive.detonation_time > 0.0 {
        explosive.detonation_time
    } else {
        fallback_detonation_time.max(0.0)
    };
    Payload {
        tnt_mass: explosive.tnt_mass,
        fuze: explosive.fuze,
        filler: explosive.filler,
        warhead: explosive.warhead,
        detonation_range: explosive.detonation_range,
        arming_time: explosive.arming_time,
        detonation_time,
        blast_power: explosive.blast_power,
        angle_of_effect: explosive.angle_of_effect,
        beehive: explosive.beehive.clone(),
    }
}

/// Acquire a pool slot and spawn the projectile entity.
pub fn spawn<Q: PhysicsQuery + ?Sized>(
    world: &mut World,
    registry: &mut Registry,
    query: &Q,
    spawn: ProjectileSpawn,
) -> Entity {
    let slot = registry.acquire(&spawn.model, DEFAULT_BULLET_MODEL);
    let time_to_live = if spawn.time_to_live.is_finite() && spawn.time_to_live > 0.0 {
        spawn.time_to_live
    } else {
        warn!(ttl = spawn.time_to_live, "invalid projectile lifetime, using one tick");
        DT
    };
    let projectile = Projectile {
        kind: spawn.kind,
        caliber_mm: spawn.caliber_mm,
        mass_kg: spawn.mass_kg,
        ballistic_coefficient: ballistic_coefficient(spawn.mass_kg, spawn.caliber_mm),
        drag_type: spawn.drag_type,
        bullet_drop: spawn.bullet_drop,
        reference_speed: spawn.velocity.length(),
        time_since_speed_update: 0.0,
        underwater: query.altitude(spawn.position) < 0.0,
        distance_traveled: 0.0,
        source: spawn.source,
    };

    let mut builder = EntityBuilder::new();
    builder.add(projectile);
    builder.add(Kinematics {
        position: spawn.position,
        velocity: spawn.velocity,
        acceleration: DVec3::ZERO,
    });
    builder.add(Lifetime {
        time_alive: 0.0,
        time_to_live,
    });
    builder.add(slot);
    if let Some(payload) = spawn.payload {
        builder.add(payload);
    }
    if let Some(motor) = spawn.motor {
        builder.add(motor);
    }
    world.spawn(builder.build())
}

/// Advance every live projectile by one step.
#[allow(clippy::too_many_arguments)]
pub fn run<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    world: &mut World,
    host: &mut H,
    ledger: &mut L,
    rng: &mut ChaCha8Rng,
    dt: f64,
    terminations: &mut Vec<Termination>,
    events: &mut Vec<CombatEvent>,
) {
    for (entity, (projectile, kin, lifetime, payload, motor)) in world.query_mut::<(
        &mut Projectile,
        &mut Kinematics,
        &mut Lifetime,
        Option<&Payload>,
        Option<&mut RocketMotor>,
    )>() {
        if is_terminated(terminations, entity) {
            continue;
        }

        lifetime.time_alive += dt;
        if lifetime.expired() {
            let detonate = payload.is_some_and(|p| p.fuze.is_timed() && fuze::armed(p, lifetime));
            terminations.push(
                Termination::new(entity, ReleaseReason::Expired, kin.position, kin.velocity)
                    .detonating(detonate),
            );
            continue;
        }

        let air = host.atmosphere_density(kin.position);
        let air = if air.is_finite() { air.max(0.0) } else { 0.0 };

        let flight_velocity = drag_adjusted_velocity(projectile, kin.velocity, air);
        let step = flight_velocity.length() * dt;
        if step > 0.0 {
            if let Some(hit) = host.raycast(kin.position, flight_velocity, step, projectile.source.vessel) {
                let termination = impact(host, ledger, entity, projectile, lifetime, payload, &hit, flight_velocity, events);
                terminations.push(termination);
                continue;
            }
        }

        let before = kin.position;
        let altitude_before = host.altitude(before);
        let gravity = if projectile.bullet_drop {
            host.gravity_at(before)
        } else {
            DVec3::ZERO
        };
        match motor {
            Some(motor) => rocket_step(motor, kin, projectile.mass_kg / 1_000.0, air, gravity, dt),
            None => leap_frog(projectile, kin, air, gravity, dt),
        }
        if !kin.position.is_finite() || !kin.velocity.is_finite() {
            warn!(entity = ?entity, "projectile state went non-finite, releasing");
            terminations.push(Termination::new(entity, ReleaseReason::Expired, before, DVec3::ZERO));
            continue;
        }
        projectile.distance_traveled += before.distance(kin.position);

        let altitude_after = host.altitude(kin.position);
        if altitude_before >= 0.0 && altitude_after < 0.0 && !projectile.underwater {
            let fraction = altitude_before / (altitude_before - altitude_after);
            let surface = before + (kin.position - before) * fraction;
            let up = host.up(surface);
            if let Some(termination) =
                water_entry(entity, projectile, kin, lifetime, payload, surface, up, rng)
            {
                terminations.push(termination);
            }
        } else if projectile.underwater && altitude_after >= 0.0 {
            projectile.underwater = false;
            reset_reference_speed(projectile, kin.velocity);
        }
    }
}

/// One kick-drift-kick step of a bullet.
fn leap_frog(projectile: &mut Projectile, kin: &mut Kinematics, air: f64, gravity: DVec3, dt: f64) {
    let half = 0.5 * dt;
    kick(projectile, &mut kin.velocity, air, gravity, half);
    kin.position += drag_adjusted_velocity(projectile, kin.velocity, air) * dt;
    kick(projectile, &mut kin.velocity, air, gravity, half);
}

fn kick(projectile: &mut Projectile, velocity: &mut DVec3, air: f64, gravity: DVec3, dt: f64) {
    *velocity += gravity * dt;
    let density = medium_density(projectile, air);
    match projectile.drag_type {
        BulletDragType::NumericalIntegration => {
            *velocity = numerical_drag_step(*velocity, density, projectile.ballistic_coefficient, dt);
        }
        BulletDragType::AnalyticEstimate => {
            projectile.time_since_speed_update += dt;
            if projectile.underwater {
                // Water drag is folded into the velocity as it accrues.
                *velocity = drag_adjusted_velocity(projectile, *velocity, air);
                reset_reference_speed(projectile, *velocity);
            }
        }
        BulletDragType::None => {
            if projectile.underwater {
                *velocity = numerical_drag_step(*velocity, density, projectile.ballistic_coefficient, dt);
            }
        }
    }
}

fn reset_reference_speed(projectile: &mut Projectile, velocity: DVec3) {
    projectile.reference_speed = velocity.length();
    projectile.time_since_speed_update = 0.0;
}

/// Kinetic damage of a round hitting at `speed` (kJ).
pub fn kinetic_damage(mass_kg: f64, speed: f64) -> f64 {
    0.5 * mass_kg * speed * speed / 1_000.0
}

#[allow(clippy::too_many_arguments)]
fn impact<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    host: &mut H,
    ledger: &mut L,
    entity: Entity,
    projectile: &Projectile,
    lifetime: &Lifetime,
    payload: Option<&Payload>,
    hit: &RayHit,
    velocity: DVec3,
    events: &mut Vec<CombatEvent>,
) -> Termination {
    if let Collider::Part { part, vessel } = hit.collider {
        let damage = kinetic_damage(projectile.mass_kg, velocity.length());
        if damage.is_finite() && damage > 0.0 {
            let source_type = projectile.kind.source_type();
            let taken = host.apply_damage(part, damage, source_type);
            if let Some(target) = host.vessel(vessel) {
                if ledger.register_hit(&projectile.source.name, &target.name, source_type) {
                    ledger.register_damage(&projectile.source.name, &target.name, taken, source_type);
                }
            }
            trace!(part = ?part, damage = taken, "kinetic hit");
            events.push(CombatEvent::PartHit {
                part,
                damage: taken,
                velocity_change: 0.0,
                negative_pressure: false,
            });
        }
    }

    let (detonate, position) = match payload {
        Some(payload) => fuze::impact_detonation(&*host, payload, lifetime, hit, velocity),
        None => (false, hit.point),
    };
    let reason = if detonate {
        ReleaseReason::Detonated
    } else {
        ReleaseReason::Impact
    };
    Termination::new(entity, reason, position, velocity).detonating(detonate)
}

/// Ricochet, splash or dive at the sea surface.
///
/// Only small calibers can skip, and the shallower the angle the likelier.
/// Returns `None` when the projectile keeps flying.
#[allow(clippy::too_many_arguments)]
fn water_entry(
    entity: Entity,
    projectile: &mut Projectile,
    kin: &mut Kinematics,
    lifetime: &Lifetime,
    payload: Option<&Payload>,
    surface: DVec3,
    up: DVec3,
    rng: &mut ChaCha8Rng,
) -> Option<Termination> {
    let hit_angle = angle_deg(kin.velocity, -up);
    let reflect_roll: f64 = rng.gen_range(-75.0..=90.0);
    if projectile.caliber_mm <= WATER_RICOCHET_MAX_CALIBER && reflect_roll > 90.0 - hit_angle {
        let skipped = reflect(kin.velocity, up) * (hit_angle * WATER_RICOCHET_SPEED_FACTOR);
        kin.velocity = random_tilt(skipped, RICOCHET_JITTER_DEG, rng);
        kin.position = surface;
        reset_reference_speed(projectile, kin.velocity);
        trace!(entity = ?entity, hit_angle, "water ricochet");
        return None;
    }

    let live = payload.filter(|p| fuze::armed(p, lifetime) && fuze::has_charge(p));
    if projectile.caliber_mm < DIVE_MIN_CALIBER {
        let reason = if live.is_some() {
            ReleaseReason::Detonated
        } else {
            ReleaseReason::Impact
        };
        return Some(Termination::new(entity, reason, surface, kin.velocity).detonating(live.is_some()));
    }

    projectile.underwater = true;
    reset_reference_speed(projectile, kin.velocity);
    match live {
        Some(p) if matches!(p.fuze, FuzeType::Delay | FuzeType::Penetrating) => Some(
            Termination::new(entity, ReleaseReason::Detonated, kin.position, kin.velocity).detonating(true),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::host::TallyLedger;
    use ordnance_core::types::TeamId;
    use rand::SeedableRng;

    fn bullet(position: DVec3, velocity: DVec3) -> ProjectileSpawn {
        let ammo = AmmoConfig {
            drag_type: BulletDragType::None,
            ..AmmoConfig::default()
        };
        ProjectileSpawn::bullet(&ammo, position, velocity, 5.0, SourceInfo::default())
    }

    fn step(world: &mut World, arena: &mut Arena, rng: &mut ChaCha8Rng) -> (Vec<Termination>, Vec<CombatEvent>) {
        let mut ledger = TallyLedger::default();
        let mut terminations = Vec::new();
        let mut events = Vec::new();
        run(world, arena, &mut ledger, rng, DT, &mut terminations, &mut events);
        (terminations, events)
    }

    #[test]
    fn spawn_takes_a_pool_slot() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let arena = Arena::new();
        let e = spawn(&mut world, &mut registry, &arena, bullet(DVec3::new(0.0, 0.0, 100.0), DVec3::X * 800.0));
        assert_eq!(registry.in_use(), 1);
        let p = world.get::<&Projectile>(e).unwrap();
        assert!(p.ballistic_coefficient > 0.0);
        assert!(!p.underwater);
        assert!(world.get::<&Payload>(e).is_err(), "inert round has no payload");
    }

    #[test]
    fn flight_follows_gravity() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let e = spawn(&mut world, &mut registry, &arena, bullet(DVec3::new(0.0, 0.0, 1_000.0), DVec3::X * 500.0));
        for _ in 0..50 {
            let (t, _) = step(&mut world, &mut arena, &mut rng);
            assert!(t.is_empty());
        }
        let kin = *world.get::<&Kinematics>(e).unwrap();
        // One second of flight: 500 m downrange, ½ g t² of drop.
        assert!((kin.position.x - 500.0).abs() < 1e-6, "x = {:.4}", kin.position.x);
        assert!((kin.position.z - (1_000.0 - 0.5 * 9.81)).abs() < 1e-6, "z = {:.4}", kin.position.z);
    }

    #[test]
    fn hit_deals_kinetic_damage() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (_, part) = arena.add_single_part_vessel("target", TeamId(2), DVec3::new(10.0, 0.0, 100.0), 2.0, 1.0, 1_000.0);
        spawn(&mut world, &mut registry, &arena, bullet(DVec3::new(0.0, 0.0, 100.0), DVec3::X * 1_000.0));
        let (terminations, events) = step(&mut world, &mut arena, &mut rng);
        assert_eq!(terminations.len(), 1);
        assert_eq!(terminations[0].reason, ReleaseReason::Impact);
        assert!(!terminations[0].detonate);
        assert!((terminations[0].position.x - 8.0).abs() < 1e-6);
        let expected = kinetic_damage(0.388, 1_000.0);
        assert!(matches!(events[0], CombatEvent::PartHit { damage, .. } if (damage - expected).abs() < 1e-9));
        assert!(arena.arena_part(part).unwrap().health < 1_000.0);
    }

    #[test]
    fn expiry_terminates() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut shot = bullet(DVec3::new(0.0, 0.0, 5_000.0), DVec3::X * 100.0);
        shot.time_to_live = 3.0 * DT;
        spawn(&mut world, &mut registry, &arena, shot);
        let mut reasons = Vec::new();
        for _ in 0..4 {
            let (t, _) = step(&mut world, &mut arena, &mut rng);
            reasons.extend(t.iter().map(|t| t.reason));
            if !t.is_empty() {
                break;
            }
        }
        assert_eq!(reasons, vec![ReleaseReason::Expired]);
    }

    #[test]
    fn steep_dive_never_ricochets() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let mut world = World::new();
            let mut registry = Registry::new();
            let mut arena = Arena::new();
            spawn(&mut world, &mut registry, &arena, bullet(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -400.0)));
            let (t, _) = step(&mut world, &mut arena, &mut rng);
            assert_eq!(t.len(), 1, "30 mm round splashes");
            assert_eq!(t[0].reason, ReleaseReason::Impact);
            assert!(t[0].position.z.abs() < 1e-9);
        }
    }

    #[test]
    fn grazing_round_can_skip() {
        let mut skipped = 0;
        for seed in 0..40 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut world = World::new();
            let mut registry = Registry::new();
            let mut arena = Arena::new();
            let e = spawn(&mut world, &mut registry, &arena, bullet(DVec3::new(0.0, 0.0, 0.5), DVec3::new(800.0, 0.0, -40.0)));
            let (t, _) = step(&mut world, &mut arena, &mut rng);
            if t.is_empty() {
                skipped += 1;
                let kin = *world.get::<&Kinematics>(e).unwrap();
                assert!(kin.position.z.abs() < 1e-9, "ricochet restarts at the surface");
                assert!(kin.velocity.length() < 0.5 * 800.0, "skip bleeds speed");
            }
        }
        assert!(skipped > 0 && skipped < 40, "{skipped} of 40 grazing rounds skipped");
    }

    #[test]
    fn heavy_round_dives() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut shot = bullet(DVec3::new(0.0, 0.0, 2.0), DVec3::new(0.0, 0.0, -300.0));
        shot.caliber_mm = 127.0;
        shot.mass_kg = 30.0;
        let e = spawn(&mut world, &mut registry, &arena, shot);
        let (t, _) = step(&mut world, &mut arena, &mut rng);
        assert!(t.is_empty());
        assert!(world.get::<&Projectile>(e).unwrap().underwater);
        let speed_before = world.get::<&Kinematics>(e).unwrap().velocity.length();
        step(&mut world, &mut arena, &mut rng);
        let speed_after = world.get::<&Kinematics>(e).unwrap().velocity.length();
        assert!(speed_after < 0.9 * speed_before, "water drag {speed_before:.1} -> {speed_after:.1}");
    }
}
