//! Weapon system: aim, firing gate, round spawning and ripple hand-off.

use glam::DVec3;
use hecs::World;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use ordnance_core::constants::*;
use ordnance_core::enums::FireOutcome;
use ordnance_core::events::CombatEvent;
use ordnance_core::types::{SourceInfo, TargetKinematics};

use super::projectile::{self, payload_from, ProjectileSpawn};
use crate::aim::{lead_solution, shot_clears_friendlies, FriendlyContact, Shooter};
use crate::drag::time_to_live;
use crate::geometry::gaussian_direction_deviation;
use crate::host::{Collider, Host, ScoringLedger};
use crate::pool::Registry;
use crate::ripple::RippleGroup;
use crate::scheduler::{TimerQueue, TimerTask};
use crate::weapon::Weapon;

/// Update every weapon and fire those with the trigger held.
#[allow(clippy::too_many_arguments)]
pub fn run<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    world: &mut World,
    host: &H,
    ledger: &mut L,
    weapons: &mut [Weapon],
    groups: &mut [RippleGroup],
    timers: &mut TimerQueue,
    registry: &mut Registry,
    rng: &mut ChaCha8Rng,
    now: f64,
    dt: f64,
    events: &mut Vec<CombatEvent>,
) {
    for weapon in weapons.iter_mut() {
        weapon.update(dt);
        update_aim(host, weapon);
        if !weapon.trigger {
            continue;
        }
        let group = weapon
            .ripple
            .and_then(|(id, _)| groups.get_mut(id.0 as usize));
        let outcome = try_fire(world, host, ledger, weapon, group, timers, registry, rng, now, events);
        trace!(weapon = ?weapon.id, ?outcome, "fire attempt");
    }

    // A member that is not trying to fire must not stall the rest.
    for group in groups.iter_mut() {
        let held = |index: usize| {
            group
                .members()
                .get(index)
                .and_then(|id| weapons.get(id.0 as usize))
                .is_some_and(|w| w.trigger)
        };
        let any_held = (0..group.len()).any(&held);
        let current_held = held(group.current() as usize);
        if !any_held {
            group.ripple_firing = false;
        } else if !current_held {
            schedule_advance(group, timers, now);
        }
    }
}

/// Point a tracking weapon at the lead solution for its target.
pub fn update_aim<H: Host + ?Sized>(host: &H, weapon: &mut Weapon) {
    let Some(target) = weapon.target else {
        return;
    };
    let (Some(own), Some(foe)) = (host.vessel(weapon.vessel), host.vessel(target)) else {
        trace!(weapon = ?weapon.id, target = ?target, "aim target unavailable");
        weapon.solution = None;
        return;
    };
    let muzzle = weapon.muzzle(own.position);
    let sample = TargetKinematics::new(foe.position, foe.velocity, foe.acceleration);
    let smoothed = weapon.tracker.observe(
        target,
        &sample,
        muzzle.distance(foe.position),
        host.altitude(foe.position),
        host.up(foe.position),
    );
    let shooter = Shooter {
        muzzle,
        velocity: own.velocity,
        muzzle_speed: weapon.config.muzzle_velocity,
        bullet_drop: weapon.config.ammo.bullet_drop,
        max_range: weapon.config.max_targeting_range,
        vessel: Some(weapon.vessel),
    };
    let solution = lead_solution(host, &shooter, &smoothed);
    if solution.direction != DVec3::ZERO {
        weapon.aim_direction = solution.direction;
    }
    weapon.solution = Some(solution);
}

/// Outcomes after which the weapon hands its ripple turn on.
fn yields_turn(outcome: FireOutcome) -> bool {
    matches!(
        outcome,
        FireOutcome::NotEnabled
            | FireOutcome::Overheated
            | FireOutcome::Reloading
            | FireOutcome::NoAmmo
            | FireOutcome::PointingAtSelf
            | FireOutcome::UnsafeFriendly
    )
}

fn schedule_advance(group: &mut RippleGroup, timers: &mut TimerQueue, due: f64) {
    if group.pending_advance.is_none() {
        group.pending_advance = Some(timers.schedule(due, TimerTask::AdvanceRipple(group.id)));
    }
}

/// Run the firing gate for one trigger cycle and spawn rounds if it passes.
#[allow(clippy::too_many_arguments)]
pub fn try_fire<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    world: &mut World,
    host: &H,
    ledger: &mut L,
    weapon: &mut Weapon,
    mut group: Option<&mut RippleGroup>,
    timers: &mut TimerQueue,
    registry: &mut Registry,
    rng: &mut ChaCha8Rng,
    now: f64,
    events: &mut Vec<CombatEvent>,
) -> FireOutcome {
    let (our_turn, latch_free) = match (group.as_deref(), weapon.ripple) {
        (Some(g), Some((_, index))) => (g.is_turn(index), g.latch_free_for(weapon.id)),
        _ => (true, true),
    };

    let outcome = match gate(host, weapon, our_turn, latch_free) {
        Err(outcome) => outcome,
        Ok(()) => {
            let needed = weapon.ammo_per_cycle();
            if needed > 0 && weapon.ammo.request(needed) < needed {
                FireOutcome::NoAmmo
            } else {
                fire(world, host, ledger, weapon, registry, rng, events)
            }
        }
    };

    if let Some(group) = group.as_deref_mut() {
        match outcome {
            FireOutcome::Fired { .. } => {
                if weapon.record_shot(timers, now) {
                    group.release_latch(weapon.id);
                    let delay = if group.ripple_firing {
                        0.0
                    } else {
                        weapon.config.initial_fire_delay
                    };
                    group.ripple_firing = true;
                    schedule_advance(group, timers, now + delay);
                } else {
                    group.acquire_latch(weapon.id);
                }
            }
            other if our_turn && yields_turn(other) => {
                group.release_latch(weapon.id);
                schedule_advance(group, timers, now);
            }
            _ => {}
        }
    } else if outcome.fired() {
        weapon.record_shot(timers, now);
    }
    outcome
}

/// Checks that need the host world on top of the weapon's own.
fn gate<H: Host + ?Sized>(host: &H, weapon: &Weapon, our_turn: bool, latch_free: bool) -> Result<(), FireOutcome> {
    if let Some(outcome) = weapon.blocking_outcome(our_turn, latch_free) {
        return Err(outcome);
    }
    let own = host.vessel(weapon.vessel).ok_or(FireOutcome::NotEnabled)?;
    let muzzle = weapon.muzzle(own.position);
    let direction = weapon.aim_direction.normalize_or_zero();

    let self_hit = host
        .raycast(muzzle, direction, SELF_AIM_CHECK_DISTANCE, None)
        .is_some_and(|hit| matches!(hit.collider, Collider::Part { vessel, .. } if vessel == weapon.vessel));
    if self_hit {
        return Err(FireOutcome::PointingAtSelf);
    }

    let friendlies: Vec<FriendlyContact> = host
        .vessels()
        .into_iter()
        .filter(|id| *id != weapon.vessel)
        .filter_map(|id| host.vessel(id))
        .filter(|v| v.team == own.team)
        .map(|v| FriendlyContact {
            kinematics: TargetKinematics::new(v.position, v.velocity, v.acceleration),
            radius: v.radius,
        })
        .collect();
    let gravity = if weapon.config.ammo.bullet_drop {
        host.gravity_at(muzzle)
    } else {
        DVec3::ZERO
    };
    let round_velocity = own.velocity + direction * weapon.config.muzzle_velocity;
    if !shot_clears_friendlies(
        muzzle,
        round_velocity,
        gravity,
        weapon.config.max_targeting_range,
        weapon.config.max_deviation_deg,
        &friendlies,
    ) {
        return Err(FireOutcome::UnsafeFriendly);
    }
    Ok(())
}

/// Spawn one trigger cycle of rounds.
fn fire<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    world: &mut World,
    host: &H,
    ledger: &mut L,
    weapon: &Weapon,
    registry: &mut Registry,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<CombatEvent>,
) -> FireOutcome {
    let Some(own) = host.vessel(weapon.vessel) else {
        return FireOutcome::NotEnabled;
    };
    let config = &weapon.config;
    let muzzle = weapon.muzzle(own.position);
    let direction = weapon.aim_direction.normalize_or_zero();
    let source = SourceInfo::new(weapon.vessel, own.name.clone(), own.team).with_weapon(config.name.clone());
    let ttl = time_to_live(config.max_targeting_range, config.max_effective_distance, config.muzzle_velocity);
    let fuze_time = weapon
        .solution
        .map_or(config.max_targeting_range / config.muzzle_velocity, |s| s.time_to_target);

    let rounds = config.rounds_per_shot();
    for _ in 0..rounds {
        let heading = gaussian_direction_deviation(direction, config.max_deviation_deg / 2.0, rng);
        let mut spawn = ProjectileSpawn::bullet(
            &config.ammo,
            muzzle,
            own.velocity + heading * config.muzzle_velocity,
            ttl,
            source.clone(),
        );
        if let Some(rocket) = &config.rocket {
            spawn = spawn.with_rocket(rocket, heading);
        }
        if let Some(explosive) = &config.ammo.explosive {
            spawn = spawn.with_payload(payload_from(explosive, fuze_time));
        }
        projectile::spawn(world, registry, host, spawn);
    }

    ledger.register_shot(&own.name);
    debug!(weapon = ?weapon.id, rounds, "shot fired");
    events.push(CombatEvent::ShotFired {
        weapon: weapon.id,
        rounds,
    });
    FireOutcome::Fired { rounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::host::NullLedger;
    use crate::weapon::AmmoStore;
    use ordnance_core::config::WeaponConfig;
    use ordnance_core::enums::WeaponState;
    use ordnance_core::types::{TeamId, VesselId, WeaponId};
    use rand::SeedableRng;

    struct Rig {
        world: World,
        arena: Arena,
        registry: Registry,
        timers: TimerQueue,
        rng: ChaCha8Rng,
        events: Vec<CombatEvent>,
        ship: VesselId,
    }

    fn rig() -> Rig {
        let mut arena = Arena::new();
        let (ship, _) = arena.add_single_part_vessel("ship", TeamId(1), DVec3::new(0.0, 0.0, 10.0), 5.0, 100.0, 1e4);
        Rig {
            world: World::new(),
            arena,
            registry: Registry::new(),
            timers: TimerQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(7),
            events: Vec::new(),
            ship,
        }
    }

    fn enabled(rig: &Rig, config: WeaponConfig) -> Weapon {
        let mut w = Weapon::new(WeaponId(0), config, rig.ship, DVec3::ZERO);
        w.state = WeaponState::Enabled;
        w.trigger = true;
        w
    }

    fn attempt(rig: &mut Rig, weapon: &mut Weapon) -> FireOutcome {
        try_fire(
            &mut rig.world,
            &rig.arena,
            &mut NullLedger,
            weapon,
            None,
            &mut rig.timers,
            &mut rig.registry,
            &mut rig.rng,
            0.0,
            &mut rig.events,
        )
    }

    #[test]
    fn fires_rounds_and_heats_up() {
        let mut rig = rig();
        let mut weapon = enabled(&rig, WeaponConfig { barrels: 2, ..WeaponConfig::default() });
        assert_eq!(attempt(&mut rig, &mut weapon), FireOutcome::Fired { rounds: 2 });
        assert_eq!(rig.world.len(), 2);
        assert_eq!(weapon.heat, 75.0);
        assert!(matches!(rig.events[0], CombatEvent::ShotFired { rounds: 2, .. }));
    }

    #[test]
    fn empty_store_fires_nothing() {
        let mut rig = rig();
        let mut weapon = enabled(&rig, WeaponConfig::default());
        weapon.ammo = AmmoStore::new(0);
        assert_eq!(attempt(&mut rig, &mut weapon), FireOutcome::NoAmmo);
        assert_eq!(rig.world.len(), 0);
        assert_eq!(weapon.heat, 0.0);
        assert_eq!(weapon.shots_fired, 0);
    }

    #[test]
    fn refuses_to_shoot_through_own_hull() {
        let mut rig = rig();
        let mut weapon = enabled(&rig, WeaponConfig::default());
        // Mounted on the bow, pointing back through the hull.
        weapon.mount_offset = DVec3::new(8.0, 0.0, 0.0);
        weapon.aim_direction = -DVec3::X;
        assert_eq!(attempt(&mut rig, &mut weapon), FireOutcome::PointingAtSelf);
    }

    #[test]
    fn holds_fire_over_a_friendly() {
        let mut rig = rig();
        rig.arena.add_single_part_vessel("wingman", TeamId(1), DVec3::new(300.0, 0.0, 10.0), 5.0, 100.0, 1e4);
        let mut weapon = enabled(&rig, WeaponConfig { max_deviation_deg: 0.0, ..WeaponConfig::default() });
        weapon.config.ammo.bullet_drop = false;
        assert_eq!(attempt(&mut rig, &mut weapon), FireOutcome::UnsafeFriendly);
        weapon.aim_direction = DVec3::Y;
        assert!(attempt(&mut rig, &mut weapon).fired());
    }

    #[test]
    fn tracking_aims_at_the_target() {
        let mut rig = rig();
        let (foe, _) = rig.arena.add_single_part_vessel("foe", TeamId(2), DVec3::new(0.0, 800.0, 10.0), 5.0, 100.0, 1e4);
        let mut weapon = enabled(&rig, WeaponConfig::default());
        weapon.track(Some(foe));
        update_aim(&rig.arena, &mut weapon);
        let solution = weapon.solution.expect("solution");
        assert!(weapon.aim_direction.y > 0.99, "aim {:?}", weapon.aim_direction);
        assert!((solution.time_to_target - 800.0 / 1_030.0).abs() < 0.05);
    }
}
